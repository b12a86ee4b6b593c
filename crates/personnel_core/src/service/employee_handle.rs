//! Scoped mutations on one employee.
//!
//! Every setter validates first, then writes the whole row once; a rejected
//! or failed change leaves the employee as it was.

use crate::error::{RegistryError, RegistryResult};
use crate::model::employee::{Employee, EmployeeId, EmployeeUpdate};
use crate::model::league::LeagueId;
use crate::model::tenure;
use crate::repo::PersonnelRepository;
use crate::service::registry::PersonnelRegistry;
use chrono::NaiveDate;
use log::{info, warn};

/// Mutable view of one employee, borrowed from the registry.
pub struct EmployeeHandle<'a, R: PersonnelRepository> {
    registry: &'a mut PersonnelRegistry<R>,
    id: EmployeeId,
}

impl<'a, R: PersonnelRepository> EmployeeHandle<'a, R> {
    pub(crate) fn new(registry: &'a mut PersonnelRegistry<R>, id: EmployeeId) -> Self {
        Self { registry, id }
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    pub fn employee(&self) -> RegistryResult<&Employee> {
        self.registry.employee_ref(self.id)
    }

    pub fn is_root(&self) -> bool {
        self.registry.is_root(self.id)
    }

    pub fn is_administrator_of(&self, league: LeagueId) -> bool {
        self.registry
            .league(league)
            .is_some_and(|league| league.administrator() == Some(self.id))
    }

    pub fn set_last_name(&mut self, value: &str) -> RegistryResult<()> {
        self.apply(EmployeeUpdate::default().last_name(value))
    }

    pub fn set_first_name(&mut self, value: &str) -> RegistryResult<()> {
        self.apply(EmployeeUpdate::default().first_name(value))
    }

    /// Changes the e-mail; must stay unique across the registry.
    pub fn set_email(&mut self, value: &str) -> RegistryResult<()> {
        self.apply(EmployeeUpdate::default().email(value))
    }

    pub fn set_password(&mut self, value: &str) -> RegistryResult<()> {
        self.apply(EmployeeUpdate::default().password(value))
    }

    /// Arrival may not lie in the future nor after the departure date.
    pub fn set_arrival_date(&mut self, value: NaiveDate) -> RegistryResult<()> {
        self.apply(EmployeeUpdate::default().arrival_date(value))
    }

    /// `None` clears the departure date.
    pub fn set_departure_date(&mut self, value: Option<NaiveDate>) -> RegistryResult<()> {
        self.apply(EmployeeUpdate::default().departure_date(value))
    }

    /// Applies several field changes with a single write.
    ///
    /// # Errors
    /// - Field errors as for the individual setters; checked against the
    ///   final values, so arrival and departure can move together.
    /// - `DuplicateEmail` when another employee uses the new address.
    /// - `Persistence` when the write fails.
    pub fn apply(&mut self, update: EmployeeUpdate) -> RegistryResult<()> {
        if update.is_empty() {
            return Ok(());
        }

        let current = self.registry.employee_ref(self.id)?;
        let next = current.with_update(&update, tenure::today()).inspect_err(|err| {
            warn!(
                "event=employee_update module=registry status=error error_code={} employee_id={}",
                err.code(),
                self.id
            );
        })?;
        if next == *current {
            return Ok(());
        }
        if self.registry.email_taken(next.email(), Some(self.id)) {
            return Err(RegistryError::DuplicateEmail(next.email().to_string()));
        }

        self.registry.commit_employee(next)?;
        info!(
            "event=employee_update module=registry status=ok employee_id={} root={}",
            self.id,
            self.is_root()
        );
        Ok(())
    }

    /// Removes the employee from its league and from storage.
    ///
    /// # Errors
    /// - `CannotDeleteRoot` for the root.
    pub fn remove(mut self) -> RegistryResult<()> {
        self.registry.remove_member(self.id).map(|_| ())
    }
}
