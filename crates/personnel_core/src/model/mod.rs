//! Personnel domain model.
//!
//! # Responsibility
//! - Define the employee and league records shared by the registry and
//!   every persistence backend.
//! - Own standalone field rules (tenure ordering, arrival not in future).
//!
//! # Invariants
//! - A persisted `Employee` always carries an `EmployeeId`; transient
//!   employees only exist as `NewEmployee` drafts.
//! - An employee with no league is the root; every other employee points
//!   at exactly one league through a non-owning `LeagueId`.
//! - Cross-entity rules (membership, administrator, uniqueness) live in
//!   `service::registry`, not here.

pub mod employee;
pub mod league;
pub mod tenure;
