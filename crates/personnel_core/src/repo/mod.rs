//! Persistence port and its implementations.
//!
//! # Responsibility
//! - Define the storage contract the registry depends on.
//! - Isolate SQL details from registry orchestration.
//!
//! # Invariants
//! - Backends report unique-constraint failures as `RepoError::UniqueViolation`.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Backends never retry; every failure is surfaced to the caller.

use crate::db::DbError;
use crate::model::employee::{Employee, EmployeeId, NewEmployee};
use crate::model::league::{LeagueId, LeagueRecord, NewLeague};
use thiserror::Error;

pub mod memory_repo;
pub mod sqlite_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level failure.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error("unique constraint violated on {field}: `{value}`")]
    UniqueViolation { field: &'static str, value: String },
    #[error("invalid persisted personnel data: {0}")]
    InvalidData(String),
    #[error(
        "connection is not initialized: schema version {actual_version}, expected {expected_version}"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Everything a backend holds, used once at start-up to hydrate the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonnelSnapshot {
    pub leagues: Vec<LeagueRecord>,
    /// Every employee, root included.
    pub employees: Vec<Employee>,
    pub root: Option<EmployeeId>,
}

/// Storage contract for leagues and employees.
///
/// Implementations are interchangeable; the registry depends on nothing else.
pub trait PersonnelRepository {
    /// Persists a new league and returns its generated id.
    fn insert_league(&mut self, league: &NewLeague) -> RepoResult<LeagueId>;
    /// Persists a new employee and returns its generated id.
    ///
    /// A draft with no league is stored as the root.
    fn insert_employee(&mut self, employee: &NewEmployee) -> RepoResult<EmployeeId>;
    fn update_league(&mut self, league: &LeagueRecord) -> RepoResult<()>;
    fn update_employee(&mut self, employee: &Employee) -> RepoResult<()>;
    fn delete_league(&mut self, id: LeagueId) -> RepoResult<()>;
    fn delete_employee(&mut self, id: EmployeeId) -> RepoResult<()>;
    /// Loads every league and employee plus the root id, if one is stored.
    fn load_all(&self) -> RepoResult<PersonnelSnapshot>;
    /// Case-insensitive e-mail lookup.
    fn find_employee_by_email(&self, email: &str) -> RepoResult<Option<Employee>>;
    /// Lookup by last name; the lowest id wins when several match.
    fn find_employee_by_name(&self, last_name: &str) -> RepoResult<Option<Employee>>;
    fn find_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
}
