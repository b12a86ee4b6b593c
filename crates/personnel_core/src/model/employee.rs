//! Employee domain model.
//!
//! # Responsibility
//! - Define the persisted `Employee` record and its transient draft.
//! - Provide field-level validation shared by creation and update paths.
//!
//! # Invariants
//! - `league == None` if and only if the employee is the root.
//! - Tenure ordering holds for every constructed `Employee`.
//! - Field setters are crate-private; callers mutate through
//!   `service::EmployeeHandle` so registry invariants stay enforced.

use crate::error::{RegistryError, RegistryResult};
use crate::model::league::{League, LeagueId};
use crate::model::tenure::{self, TenureError};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Storage-assigned employee identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

impl Display for EmployeeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transient employee, before the first successful insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    /// Opaque credential; hashing is the backend's concern.
    pub password: String,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    /// `None` marks the root.
    pub league: Option<LeagueId>,
}

impl NewEmployee {
    /// Returns whether this draft describes the root account.
    pub fn is_root(&self) -> bool {
        self.league.is_none()
    }

    /// Checks tenure ordering.
    pub fn validate(&self) -> Result<(), TenureError> {
        tenure::check_order(self.arrival_date, self.departure_date)
    }
}

/// Persisted employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employee {
    id: EmployeeId,
    last_name: String,
    first_name: String,
    email: String,
    #[serde(skip_serializing)]
    password: String,
    arrival_date: Option<NaiveDate>,
    departure_date: Option<NaiveDate>,
    league: Option<LeagueId>,
}

impl Employee {
    /// Builds a persisted employee from its storage identity and field values.
    ///
    /// Used by backends when hydrating rows and by the registry right after
    /// a successful insert.
    ///
    /// # Errors
    /// - Returns `TenureError::DepartureBeforeArrival` for reversed tenure.
    pub fn from_parts(id: EmployeeId, parts: NewEmployee) -> Result<Self, TenureError> {
        parts.validate()?;
        Ok(Self {
            id,
            last_name: parts.last_name,
            first_name: parts.first_name,
            email: parts.email,
            password: parts.password,
            arrival_date: parts.arrival_date,
            departure_date: parts.departure_date,
            league: parts.league,
        })
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Raw credential, exposed for persistence backends only.
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn arrival_date(&self) -> Option<NaiveDate> {
        self.arrival_date
    }

    pub fn departure_date(&self) -> Option<NaiveDate> {
        self.departure_date
    }

    /// League back-reference; `None` for the root.
    pub fn league(&self) -> Option<LeagueId> {
        self.league
    }

    pub fn is_root(&self) -> bool {
        self.league.is_none()
    }

    /// Returns whether this employee is the designated administrator of `league`.
    pub fn is_administrator_of(&self, league: &League) -> bool {
        league.administrator() == Some(self.id)
    }

    /// Returns whether the employee is still present on `date`.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        let arrived = self.arrival_date.map_or(true, |arrival| arrival <= date);
        let not_left = self.departure_date.map_or(true, |departure| departure >= date);
        arrived && not_left
    }

    /// Compares a candidate credential without short-circuiting on the
    /// first differing byte.
    pub fn check_password(&self, candidate: &str) -> bool {
        constant_time_eq(self.password.as_bytes(), candidate.as_bytes())
    }

    pub(crate) fn sort_key(&self) -> (&str, &str, EmployeeId) {
        (&self.last_name, &self.first_name, self.id)
    }

    /// Returns a copy with `update` applied after field-level validation.
    ///
    /// Uniqueness rules are checked by the registry, not here.
    pub(crate) fn with_update(
        &self,
        update: &EmployeeUpdate,
        today: NaiveDate,
    ) -> RegistryResult<Self> {
        let mut next = self.clone();
        if let Some(value) = &update.last_name {
            next.last_name = normalize_required("last name", value)?;
        }
        if let Some(value) = &update.first_name {
            next.first_name = normalize_required("first name", value)?;
        }
        if let Some(value) = &update.email {
            next.email = normalize_email(value, self.is_root())?;
        }
        if let Some(value) = &update.password {
            next.password = check_password_value(value)?;
        }
        if let Some(arrival) = update.arrival_date {
            tenure::check_arrival_not_future(arrival, today)?;
            next.arrival_date = Some(arrival);
        }
        if let Some(departure) = update.departure_date {
            next.departure_date = departure;
        }
        tenure::check_order(next.arrival_date, next.departure_date)?;
        Ok(next)
    }
}

impl Display for Employee {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} (", self.last_name, self.first_name, self.email)?;
        match self.league {
            None => write!(f, "super-user)"),
            Some(league) => write!(f, "league {league})"),
        }
    }
}

/// Batched field changes for one employee.
///
/// Every field left as `None` is unchanged. `departure_date: Some(None)`
/// clears the departure date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeUpdate {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<Option<NaiveDate>>,
}

impl EmployeeUpdate {
    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn password(mut self, value: impl Into<String>) -> Self {
        self.password = Some(value.into());
        self
    }

    pub fn arrival_date(mut self, value: NaiveDate) -> Self {
        self.arrival_date = Some(value);
        self
    }

    pub fn departure_date(mut self, value: Option<NaiveDate>) -> Self {
        self.departure_date = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Trims a required text field, rejecting blank values.
pub(crate) fn normalize_required(field: &'static str, value: &str) -> RegistryResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::EmptyName { field });
    }
    Ok(trimmed.to_string())
}

/// Trims an e-mail address and checks its shape.
///
/// The root keeps its well-known bare login, so only non-root addresses must
/// look like `local@domain`.
pub(crate) fn normalize_email(value: &str, is_root: bool) -> RegistryResult<String> {
    let trimmed = normalize_required("email", value)?;
    if !is_root && !EMAIL_RE.is_match(&trimmed) {
        return Err(RegistryError::InvalidEmail(trimmed));
    }
    Ok(trimmed)
}

/// Rejects empty and whitespace-only passwords; the value is kept as typed.
pub(crate) fn check_password_value(value: &str) -> RegistryResult<String> {
    if value.trim().is_empty() {
        return Err(RegistryError::EmptyPassword);
    }
    Ok(value.to_string())
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
