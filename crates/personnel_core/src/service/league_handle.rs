//! Scoped mutations on one league.
//!
//! # Invariants
//! - New members get the league as back-reference and land in sorted order.
//! - The administrator is only ever the root or a current member.
//! - Removing a league removes its members first, one by one.

use crate::error::{RegistryError, RegistryResult};
use crate::model::employee::{
    check_password_value, normalize_email, normalize_required, Employee, EmployeeId, NewEmployee,
};
use crate::model::league::{League, LeagueId};
use crate::model::tenure;
use crate::repo::PersonnelRepository;
use crate::service::registry::PersonnelRegistry;
use chrono::NaiveDate;
use log::{info, warn};

/// Mutable view of one league, borrowed from the registry.
pub struct LeagueHandle<'a, R: PersonnelRepository> {
    registry: &'a mut PersonnelRegistry<R>,
    id: LeagueId,
}

impl<'a, R: PersonnelRepository> LeagueHandle<'a, R> {
    pub(crate) fn new(registry: &'a mut PersonnelRegistry<R>, id: LeagueId) -> Self {
        Self { registry, id }
    }

    pub fn id(&self) -> LeagueId {
        self.id
    }

    pub fn league(&self) -> RegistryResult<&League> {
        self.registry.league_ref(self.id)
    }

    /// Creates a member of this league.
    ///
    /// `arrival` defaults to today and may not lie in the future.
    ///
    /// # Errors
    /// - `EmptyName`, `InvalidEmail`, `EmptyPassword` for bad fields.
    /// - `InvalidDate` / `InconsistentDate` for bad tenure.
    /// - `DuplicateEmail` when the address is already in use.
    /// - `Persistence` when the insert fails; nothing changes in memory.
    pub fn add_employee(
        &mut self,
        last_name: &str,
        first_name: &str,
        email: &str,
        password: &str,
        arrival: Option<NaiveDate>,
        departure: Option<NaiveDate>,
    ) -> RegistryResult<Employee> {
        self.registry.league_ref(self.id)?;

        let last_name = normalize_required("last name", last_name)?;
        let first_name = normalize_required("first name", first_name)?;
        let email = normalize_email(email, false)?;
        let password = check_password_value(password)?;

        let today = tenure::today();
        let arrival = arrival.unwrap_or(today);
        tenure::check_arrival_not_future(arrival, today)?;
        tenure::check_order(Some(arrival), departure)?;

        if self.registry.email_taken(&email, None) {
            warn!(
                "event=employee_add module=registry status=error error_code=duplicate_email league_id={}",
                self.id
            );
            return Err(RegistryError::DuplicateEmail(email));
        }

        let draft = NewEmployee {
            last_name,
            first_name,
            email,
            password,
            arrival_date: Some(arrival),
            departure_date: departure,
            league: Some(self.id),
        };
        let id = self.registry.repo.insert_employee(&draft)?;
        let employee = Employee::from_parts(id, draft)?;

        let league = self
            .registry
            .leagues
            .get_mut(&self.id)
            .ok_or(RegistryError::LeagueNotFound(self.id))?;
        league.insert_member(employee.clone());

        info!(
            "event=employee_add module=registry status=ok employee_id={id} league_id={}",
            self.id
        );
        Ok(employee)
    }

    /// Designates `employee` as administrator.
    ///
    /// # Errors
    /// - `InsufficientRights` when the employee is neither the root nor a
    ///   member of this league.
    pub fn set_administrator(&mut self, employee: EmployeeId) -> RegistryResult<()> {
        let league = self.registry.league_ref(self.id)?;
        if !self.registry.is_root(employee) && !league.contains(employee) {
            warn!(
                "event=administrator_set module=registry status=error error_code=insufficient_rights league_id={} employee_id={employee}",
                self.id
            );
            return Err(RegistryError::InsufficientRights {
                employee,
                league: self.id,
            });
        }
        if league.administrator() == Some(employee) {
            return Ok(());
        }

        self.registry.commit_administrator(self.id, employee)?;
        info!(
            "event=administrator_set module=registry status=ok league_id={} employee_id={employee}",
            self.id
        );
        Ok(())
    }

    /// Renames the league.
    ///
    /// # Errors
    /// - `EmptyName` for a blank name, `DuplicateName` when another league
    ///   already uses it.
    pub fn set_name(&mut self, name: &str) -> RegistryResult<()> {
        let name = normalize_required("league name", name)?;
        let current = self.registry.league_ref(self.id)?;
        if current.name() == name {
            return Ok(());
        }
        if self.registry.league_by_name(&name).is_some() {
            return Err(RegistryError::DuplicateName(name));
        }

        let mut record = current.to_record();
        record.name = name.clone();
        self.registry.repo.update_league(&record)?;

        if let Some(league) = self.registry.leagues.get_mut(&self.id) {
            league.set_name(name);
        }
        info!("event=league_rename module=registry status=ok league_id={}", self.id);
        Ok(())
    }

    /// Removes every member, then the league itself.
    ///
    /// A failure part-way leaves the members removed so far gone and the
    /// league in place with the rest.
    pub fn remove(mut self) -> RegistryResult<()> {
        let member_ids: Vec<EmployeeId> = self
            .registry
            .league_ref(self.id)?
            .members()
            .iter()
            .map(Employee::id)
            .collect();

        for member in &member_ids {
            self.registry.remove_member(*member)?;
        }

        self.registry.repo.delete_league(self.id).inspect_err(|err| {
            warn!(
                "event=league_remove module=registry status=error error_code=persistence league_id={} error={err}",
                self.id
            );
        })?;
        self.registry.leagues.remove(&self.id);

        info!(
            "event=league_remove module=registry status=ok league_id={} members_removed={}",
            self.id,
            member_ids.len()
        );
        Ok(())
    }
}
