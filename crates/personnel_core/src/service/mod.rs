//! Registry service.
//!
//! # Responsibility
//! - Own the in-memory league/employee graph and its invariants.
//! - Route every write through the persistence port.
//!
//! Mutations go through handles borrowed from the registry
//! (`league_mut`, `employee_mut`), so no caller can keep a stale view
//! across a change.

mod employee_handle;
mod league_handle;
mod registry;

pub use employee_handle::EmployeeHandle;
pub use league_handle::LeagueHandle;
pub use registry::{PersonnelRegistry, SharedRegistry};
