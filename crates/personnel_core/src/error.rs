//! Registry error taxonomy.
//!
//! Validation failures are raised before any persistence call. Storage
//! failures are wrapped unchanged in `Persistence` so `source()` exposes the
//! backend cause.

use crate::model::employee::EmployeeId;
use crate::model::league::LeagueId;
use crate::model::tenure::TenureError;
use crate::repo::RepoError;
use chrono::NaiveDate;
use thiserror::Error;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// All errors surfaced by registry, league and employee operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Backend I/O or constraint failure. Never retried.
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepoError),

    /// A date violates a standalone rule.
    #[error("invalid date {date}: arrival cannot be later than {today}")]
    InvalidDate { date: NaiveDate, today: NaiveDate },

    /// Arrival/departure pair is out of order.
    #[error("departure date {departure} is earlier than arrival date {arrival}")]
    InconsistentDate {
        arrival: NaiveDate,
        departure: NaiveDate,
    },

    #[error("an employee with email `{0}` already exists")]
    DuplicateEmail(String),

    #[error("a league named `{0}` already exists")]
    DuplicateName(String),

    /// Blank required text field.
    #[error("{field} must not be blank")]
    EmptyName { field: &'static str },

    #[error("invalid email address `{0}`")]
    InvalidEmail(String),

    #[error("password must not be empty")]
    EmptyPassword,

    /// Administrator must be the root or a member of the league.
    #[error("employee {employee} cannot administer league {league}: not root and not a member")]
    InsufficientRights {
        employee: EmployeeId,
        league: LeagueId,
    },

    #[error("the root employee cannot be removed")]
    CannotDeleteRoot,

    /// Unknown principal or wrong credential; the two are not distinguished.
    #[error("authentication failed")]
    AuthFailure,

    #[error("the personnel registry has already been opened in this process")]
    SingletonViolation,

    #[error("league not found: {0}")]
    LeagueNotFound(LeagueId),

    #[error("employee not found: {0}")]
    EmployeeNotFound(EmployeeId),
}

impl From<TenureError> for RegistryError {
    fn from(value: TenureError) -> Self {
        match value {
            TenureError::ArrivalInFuture { arrival, today } => Self::InvalidDate {
                date: arrival,
                today,
            },
            TenureError::DepartureBeforeArrival { arrival, departure } => {
                Self::InconsistentDate { arrival, departure }
            }
        }
    }
}

impl RegistryError {
    /// Short stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Persistence(_) => "persistence",
            Self::InvalidDate { .. } => "invalid_date",
            Self::InconsistentDate { .. } => "inconsistent_date",
            Self::DuplicateEmail(_) => "duplicate_email",
            Self::DuplicateName(_) => "duplicate_name",
            Self::EmptyName { .. } => "empty_name",
            Self::InvalidEmail(_) => "invalid_email",
            Self::EmptyPassword => "empty_password",
            Self::InsufficientRights { .. } => "insufficient_rights",
            Self::CannotDeleteRoot => "cannot_delete_root",
            Self::AuthFailure => "auth_failure",
            Self::SingletonViolation => "singleton_violation",
            Self::LeagueNotFound(_) => "league_not_found",
            Self::EmployeeNotFound(_) => "employee_not_found",
        }
    }
}
