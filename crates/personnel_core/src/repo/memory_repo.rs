//! In-memory implementation of the persistence port.
//!
//! # Responsibility
//! - Provide a storage backend for tests and scratch registries.
//! - Record every write in a journal so callers can assert ordering.
//! - Allow one-shot failure injection on the next write.
//!
//! # Invariants
//! - Same uniqueness rules as the SQLite schema: league names, employee
//!   e-mails (case-insensitive) and a single root.
//! - A failed write leaves the stored rows untouched.

use crate::model::employee::{Employee, EmployeeId, NewEmployee};
use crate::model::league::{LeagueId, LeagueRecord, NewLeague};
use crate::repo::{PersonnelRepository, PersonnelSnapshot, RepoError, RepoResult};
use std::collections::BTreeMap;

/// One successful write, in commit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    InsertLeague(LeagueId),
    InsertEmployee(EmployeeId),
    UpdateLeague {
        id: LeagueId,
        administrator: Option<EmployeeId>,
    },
    UpdateEmployee(EmployeeId),
    DeleteLeague(LeagueId),
    DeleteEmployee(EmployeeId),
}

/// Map-backed personnel repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersonnelRepository {
    leagues: BTreeMap<LeagueId, LeagueRecord>,
    employees: BTreeMap<EmployeeId, Employee>,
    last_league_id: i64,
    last_employee_id: i64,
    journal: Vec<JournalEntry>,
    /// Writes still to let through, and the reason the next one fails.
    pending_failure: Option<(usize, String)>,
}

impl InMemoryPersonnelRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next write fail with `RepoError::Unavailable(reason)`.
    pub fn fail_next_write(&mut self, reason: impl Into<String>) {
        self.fail_nth_write(1, reason);
    }

    /// Lets `n - 1` writes succeed, then fails the `n`-th one.
    ///
    /// `n == 0` is treated as 1.
    pub fn fail_nth_write(&mut self, n: usize, reason: impl Into<String>) {
        self.pending_failure = Some((n.saturating_sub(1), reason.into()));
    }

    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    pub fn league_count(&self) -> usize {
        self.leagues.len()
    }

    pub fn employee_count(&self) -> usize {
        self.employees.len()
    }

    fn take_failure(&mut self) -> RepoResult<()> {
        match self.pending_failure.take() {
            Some((0, reason)) => Err(RepoError::Unavailable(reason)),
            Some((remaining, reason)) => {
                self.pending_failure = Some((remaining - 1, reason));
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn ensure_unique_league_name(&self, name: &str, except: Option<LeagueId>) -> RepoResult<()> {
        let taken = self
            .leagues
            .values()
            .any(|league| league.name == name && Some(league.id) != except);
        if taken {
            return Err(RepoError::UniqueViolation {
                field: "name",
                value: name.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_unique_email(&self, email: &str, except: Option<EmployeeId>) -> RepoResult<()> {
        let taken = self.employees.values().any(|employee| {
            employee.email().eq_ignore_ascii_case(email) && Some(employee.id()) != except
        });
        if taken {
            return Err(RepoError::UniqueViolation {
                field: "email",
                value: email.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_employee_exists(&self, id: EmployeeId) -> RepoResult<()> {
        if !self.employees.contains_key(&id) {
            return Err(RepoError::NotFound {
                entity: "employee",
                id: id.0,
            });
        }
        Ok(())
    }
}

impl PersonnelRepository for InMemoryPersonnelRepository {
    fn insert_league(&mut self, league: &NewLeague) -> RepoResult<LeagueId> {
        self.take_failure()?;
        self.ensure_unique_league_name(&league.name, None)?;
        if let Some(administrator) = league.administrator {
            self.ensure_employee_exists(administrator)?;
        }

        self.last_league_id += 1;
        let id = LeagueId(self.last_league_id);
        self.leagues.insert(
            id,
            LeagueRecord {
                id,
                name: league.name.clone(),
                administrator: league.administrator,
            },
        );
        self.journal.push(JournalEntry::InsertLeague(id));
        Ok(id)
    }

    fn insert_employee(&mut self, employee: &NewEmployee) -> RepoResult<EmployeeId> {
        self.take_failure()?;
        self.ensure_unique_email(&employee.email, None)?;
        if employee.is_root() && self.employees.values().any(Employee::is_root) {
            return Err(RepoError::UniqueViolation {
                field: "root",
                value: employee.email.clone(),
            });
        }
        if !employee.is_root() && employee.arrival_date.is_none() {
            return Err(RepoError::InvalidData(
                "league member without an arrival date".to_string(),
            ));
        }
        if let Some(league) = employee.league {
            if !self.leagues.contains_key(&league) {
                return Err(RepoError::NotFound {
                    entity: "league",
                    id: league.0,
                });
            }
        }

        let id = EmployeeId(self.last_employee_id + 1);
        let stored = Employee::from_parts(id, employee.clone())
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        self.last_employee_id = id.0;
        self.employees.insert(id, stored);
        self.journal.push(JournalEntry::InsertEmployee(id));
        Ok(id)
    }

    fn update_league(&mut self, league: &LeagueRecord) -> RepoResult<()> {
        self.take_failure()?;
        if !self.leagues.contains_key(&league.id) {
            return Err(RepoError::NotFound {
                entity: "league",
                id: league.id.0,
            });
        }
        self.ensure_unique_league_name(&league.name, Some(league.id))?;
        if let Some(administrator) = league.administrator {
            self.ensure_employee_exists(administrator)?;
        }

        self.leagues.insert(league.id, league.clone());
        self.journal.push(JournalEntry::UpdateLeague {
            id: league.id,
            administrator: league.administrator,
        });
        Ok(())
    }

    fn update_employee(&mut self, employee: &Employee) -> RepoResult<()> {
        self.take_failure()?;
        let stored = self
            .employees
            .get(&employee.id())
            .ok_or(RepoError::NotFound {
                entity: "employee",
                id: employee.id().0,
            })?;
        if stored.league() != employee.league() {
            return Err(RepoError::InvalidData(format!(
                "employee {} cannot change league affiliation",
                employee.id()
            )));
        }
        self.ensure_unique_email(employee.email(), Some(employee.id()))?;

        self.employees.insert(employee.id(), employee.clone());
        self.journal.push(JournalEntry::UpdateEmployee(employee.id()));
        Ok(())
    }

    fn delete_league(&mut self, id: LeagueId) -> RepoResult<()> {
        self.take_failure()?;
        if !self.leagues.contains_key(&id) {
            return Err(RepoError::NotFound {
                entity: "league",
                id: id.0,
            });
        }
        if self
            .employees
            .values()
            .any(|employee| employee.league() == Some(id))
        {
            return Err(RepoError::InvalidData(format!(
                "league {id} still has members"
            )));
        }

        self.leagues.remove(&id);
        self.journal.push(JournalEntry::DeleteLeague(id));
        Ok(())
    }

    fn delete_employee(&mut self, id: EmployeeId) -> RepoResult<()> {
        self.take_failure()?;
        self.ensure_employee_exists(id)?;
        if let Some(league) = self
            .leagues
            .values()
            .find(|league| league.administrator == Some(id))
        {
            return Err(RepoError::InvalidData(format!(
                "employee {id} still administers league {}",
                league.id
            )));
        }

        self.employees.remove(&id);
        self.journal.push(JournalEntry::DeleteEmployee(id));
        Ok(())
    }

    fn load_all(&self) -> RepoResult<PersonnelSnapshot> {
        let mut leagues: Vec<LeagueRecord> = self.leagues.values().cloned().collect();
        leagues.sort_by(|left, right| left.name.cmp(&right.name));
        let employees: Vec<Employee> = self.employees.values().cloned().collect();
        let root = employees
            .iter()
            .find(|employee| employee.is_root())
            .map(Employee::id);
        Ok(PersonnelSnapshot {
            leagues,
            employees,
            root,
        })
    }

    fn find_employee_by_email(&self, email: &str) -> RepoResult<Option<Employee>> {
        let email = email.trim();
        Ok(self
            .employees
            .values()
            .find(|employee| employee.email().eq_ignore_ascii_case(email))
            .cloned())
    }

    fn find_employee_by_name(&self, last_name: &str) -> RepoResult<Option<Employee>> {
        Ok(self
            .employees
            .values()
            .find(|employee| employee.last_name() == last_name)
            .cloned())
    }

    fn find_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        Ok(self.employees.get(&id).cloned())
    }
}
