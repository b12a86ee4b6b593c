//! Core domain logic for the personnel registry.
//! This crate is the single source of truth for league and employee invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, RegistryConfig, RootCredentials};
pub use db::{open_db, open_db_in_memory, DbError};
pub use error::{RegistryError, RegistryResult};
pub use logging::{default_log_level, init_logging, init_logging_from_settings, logging_status};
pub use model::employee::{Employee, EmployeeId, EmployeeUpdate, NewEmployee};
pub use model::league::{League, LeagueId, LeagueRecord, NewLeague};
pub use repo::memory_repo::{InMemoryPersonnelRepository, JournalEntry};
pub use repo::sqlite_repo::SqlitePersonnelRepository;
pub use repo::{PersonnelRepository, PersonnelSnapshot, RepoError, RepoResult};
pub use service::{EmployeeHandle, LeagueHandle, PersonnelRegistry, SharedRegistry};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
