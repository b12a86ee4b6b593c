//! League domain model.
//!
//! # Responsibility
//! - Own the ordered member list of one league.
//! - Track the designated administrator by identity.
//!
//! # Invariants
//! - Members are kept sorted by `(last_name, first_name, id)`; one entry per id.
//! - Every member's back-reference equals this league's id.
//! - The administrator is the root or a current member. The registry checks
//!   this on every assignment; this type only stores the reference.

use crate::model::employee::{Employee, EmployeeId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Storage-assigned league identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueId(pub i64);

impl Display for LeagueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flat league row exchanged with persistence backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueRecord {
    pub id: LeagueId,
    pub name: String,
    pub administrator: Option<EmployeeId>,
}

/// League row before its first insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeague {
    pub name: String,
    pub administrator: Option<EmployeeId>,
}

/// In-memory league with its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct League {
    id: LeagueId,
    name: String,
    administrator: Option<EmployeeId>,
    members: Vec<Employee>,
}

impl League {
    /// Creates an empty league from its persisted row.
    pub fn from_record(record: LeagueRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            administrator: record.administrator,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> LeagueId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn administrator(&self) -> Option<EmployeeId> {
        self.administrator
    }

    /// Members ordered by last name, then first name.
    pub fn members(&self) -> &[Employee] {
        &self.members
    }

    pub fn member(&self, id: EmployeeId) -> Option<&Employee> {
        self.members.iter().find(|member| member.id() == id)
    }

    pub fn contains(&self, id: EmployeeId) -> bool {
        self.member(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Row view used for persistence writes.
    pub fn to_record(&self) -> LeagueRecord {
        LeagueRecord {
            id: self.id,
            name: self.name.clone(),
            administrator: self.administrator,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_administrator(&mut self, administrator: EmployeeId) {
        self.administrator = Some(administrator);
    }

    /// Inserts a member at its sorted position.
    ///
    /// Returns `false` without inserting when the id is already present.
    pub(crate) fn insert_member(&mut self, employee: Employee) -> bool {
        if self.contains(employee.id()) {
            return false;
        }
        let position = self
            .members
            .partition_point(|member| member.sort_key() < employee.sort_key());
        self.members.insert(position, employee);
        true
    }

    /// Replaces a member's field values, keeping the list sorted.
    pub(crate) fn replace_member(&mut self, employee: Employee) -> bool {
        if self.remove_member(employee.id()).is_none() {
            return false;
        }
        self.insert_member(employee)
    }

    pub(crate) fn remove_member(&mut self, id: EmployeeId) -> Option<Employee> {
        let position = self.members.iter().position(|member| member.id() == id)?;
        Some(self.members.remove(position))
    }
}

impl Display for League {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (id: {})", self.name, self.id)
    }
}
