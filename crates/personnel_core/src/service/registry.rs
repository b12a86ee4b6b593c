//! Personnel registry service.
//!
//! # Responsibility
//! - Own every league, every employee and the root for one process.
//! - Hydrate from the persistence port and bootstrap the root account.
//! - Be the only caller of the persistence port.
//!
//! # Invariants
//! - Exactly one root exists once construction returns; the root is never
//!   a league member.
//! - League names are unique; employee e-mails are unique ignoring case.
//! - Every league administrator is the root or a current member.
//! - Writes are persisted before the in-memory graph changes, so a failed
//!   write leaves the registry as it was. A member removal that fails after
//!   its administrator hand-over writes the previous administrator back.

use crate::config::{RegistryConfig, RootCredentials};
use crate::error::{RegistryError, RegistryResult};
use crate::model::employee::{normalize_required, Employee, EmployeeId, NewEmployee};
use crate::model::league::{League, LeagueId, LeagueRecord, NewLeague};
use crate::model::tenure;
use crate::repo::{PersonnelRepository, PersonnelSnapshot, RepoError};
use crate::service::employee_handle::EmployeeHandle;
use crate::service::league_handle::LeagueHandle;
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

static PROCESS_REGISTRY: OnceCell<()> = OnceCell::new();

/// Registry wrapper for callers on more than one thread.
pub type SharedRegistry<R> = Arc<Mutex<PersonnelRegistry<R>>>;

/// Process-wide personnel registry.
pub struct PersonnelRegistry<R: PersonnelRepository> {
    pub(crate) repo: R,
    pub(crate) leagues: BTreeMap<LeagueId, League>,
    pub(crate) root: Employee,
}

impl<R: PersonnelRepository> PersonnelRegistry<R> {
    /// Opens the registry for this process.
    ///
    /// Succeeds at most once per process. A failed attempt does not claim the
    /// slot, so it can be retried.
    ///
    /// # Errors
    /// - `SingletonViolation` when a registry was already opened.
    /// - Any error from `bootstrap`.
    pub fn open(repo: R, config: &RegistryConfig) -> RegistryResult<Self> {
        let mut opened = None;
        PROCESS_REGISTRY.get_or_try_init(|| -> RegistryResult<()> {
            opened = Some(Self::bootstrap(repo, config)?);
            Ok(())
        })?;
        opened.ok_or_else(|| {
            warn!("event=registry_open module=registry status=error error_code=singleton_violation");
            RegistryError::SingletonViolation
        })
    }

    /// Loads the full graph from `repo` and guarantees a root exists.
    ///
    /// Does not claim the process slot; used by `open`, tests and tools
    /// working on scratch stores.
    ///
    /// # Side effects
    /// - Inserts the root when the store has none.
    /// - Reassigns to the root any league whose stored administrator is
    ///   missing or no longer a member.
    pub fn bootstrap(mut repo: R, config: &RegistryConfig) -> RegistryResult<Self> {
        let started_at = Instant::now();
        info!("event=registry_bootstrap module=registry status=start");

        let PersonnelSnapshot {
            leagues: league_rows,
            employees,
            root: stored_root,
        } = repo.load_all()?;

        let mut leagues: BTreeMap<LeagueId, League> = league_rows
            .into_iter()
            .map(|row| (row.id, League::from_record(row)))
            .collect();

        let mut root = None;
        for employee in employees {
            match employee.league() {
                None => {
                    if stored_root != Some(employee.id()) || root.is_some() {
                        return Err(RepoError::InvalidData(format!(
                            "employee {} has no league but is not the root",
                            employee.id()
                        ))
                        .into());
                    }
                    root = Some(employee);
                }
                Some(league_id) => {
                    let employee_id = employee.id();
                    let league = leagues.get_mut(&league_id).ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "employee {employee_id} references unknown league {league_id}"
                        ))
                    })?;
                    if !league.insert_member(employee) {
                        return Err(RepoError::InvalidData(format!(
                            "employee {employee_id} loaded twice"
                        ))
                        .into());
                    }
                }
            }
        }

        let root_created = root.is_none();
        let root = match (root, stored_root) {
            (Some(root), _) => root,
            (None, Some(id)) => {
                return Err(RepoError::InvalidData(format!("root employee {id} was not loaded")).into());
            }
            (None, None) => create_root(&mut repo, &config.root)?,
        };

        let mut registry = Self {
            repo,
            leagues,
            root,
        };
        let repaired = registry.repair_administrators()?;

        info!(
            "event=registry_bootstrap module=registry status=ok duration_ms={} leagues={} employees={} root_id={} root_created={} administrators_repaired={}",
            started_at.elapsed().as_millis(),
            registry.leagues.len(),
            registry.employee_count(),
            registry.root.id(),
            root_created,
            repaired
        );
        Ok(registry)
    }

    /// Wraps the registry for multi-threaded callers.
    pub fn into_shared(self) -> SharedRegistry<R> {
        Arc::new(Mutex::new(self))
    }

    pub fn root(&self) -> &Employee {
        &self.root
    }

    /// Identity comparison against the root.
    pub fn is_root(&self, id: EmployeeId) -> bool {
        self.root.id() == id
    }

    /// Leagues ordered by name.
    pub fn leagues(&self) -> Vec<&League> {
        let mut leagues: Vec<&League> = self.leagues.values().collect();
        leagues.sort_by(|left, right| left.name().cmp(right.name()));
        leagues
    }

    pub fn league(&self, id: LeagueId) -> Option<&League> {
        self.leagues.get(&id)
    }

    pub fn league_by_name(&self, name: &str) -> Option<&League> {
        let name = name.trim();
        self.leagues.values().find(|league| league.name() == name)
    }

    /// Every employee: the root first, then members league by league.
    pub fn employees(&self) -> Vec<&Employee> {
        std::iter::once(&self.root)
            .chain(self.leagues().into_iter().flat_map(League::members))
            .collect()
    }

    pub fn employee_count(&self) -> usize {
        1 + self.leagues.values().map(League::len).sum::<usize>()
    }

    pub fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        if self.root.id() == id {
            return Some(&self.root);
        }
        self.leagues.values().find_map(|league| league.member(id))
    }

    /// Case-insensitive e-mail lookup.
    pub fn employee_by_email(&self, email: &str) -> Option<&Employee> {
        let email = email.trim();
        self.all_employees()
            .find(|employee| employee.email().eq_ignore_ascii_case(email))
    }

    /// Returns whether `user` matches an e-mail or a stored last name.
    pub fn user_exists(&self, user: &str) -> RegistryResult<bool> {
        if self.employee_by_email(user).is_some() {
            return Ok(true);
        }
        Ok(self.repo.find_employee_by_name(user.trim())?.is_some())
    }

    /// Human-readable line naming the employee's league.
    pub fn describe(&self, employee: &Employee) -> String {
        let affiliation = match employee.league() {
            None => "super-user".to_string(),
            Some(id) => self
                .league(id)
                .map_or_else(|| format!("league {id}"), |league| league.name().to_string()),
        };
        format!(
            "{} {} {} ({affiliation})",
            employee.last_name(),
            employee.first_name(),
            employee.email()
        )
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Direct backend access, bypassing registry invariants.
    ///
    /// Not part of the supported API: kept for test failure injection and
    /// journal inspection only. Application code mutates through handles.
    #[doc(hidden)]
    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    /// Creates a league administered by the root.
    ///
    /// # Errors
    /// - `EmptyName` for a blank name, `DuplicateName` when taken.
    /// - `Persistence` when the insert fails.
    pub fn add_league(&mut self, name: &str) -> RegistryResult<LeagueHandle<'_, R>> {
        let name = normalize_required("league name", name)?;
        if self.league_by_name(&name).is_some() {
            return Err(RegistryError::DuplicateName(name));
        }

        let draft = NewLeague {
            name,
            administrator: Some(self.root.id()),
        };
        let id = self.repo.insert_league(&draft).inspect_err(|err| {
            warn!("event=league_add module=registry status=error error_code=persistence error={err}");
        })?;

        let league = League::from_record(LeagueRecord {
            id,
            name: draft.name,
            administrator: draft.administrator,
        });
        self.leagues.insert(id, league);

        info!("event=league_add module=registry status=ok league_id={id}");
        Ok(LeagueHandle::new(self, id))
    }

    /// Scoped mutation entry point for one league.
    pub fn league_mut(&mut self, id: LeagueId) -> RegistryResult<LeagueHandle<'_, R>> {
        if !self.leagues.contains_key(&id) {
            return Err(RegistryError::LeagueNotFound(id));
        }
        Ok(LeagueHandle::new(self, id))
    }

    /// Scoped mutation entry point for one employee (root included).
    pub fn employee_mut(&mut self, id: EmployeeId) -> RegistryResult<EmployeeHandle<'_, R>> {
        if self.employee(id).is_none() {
            return Err(RegistryError::EmployeeNotFound(id));
        }
        Ok(EmployeeHandle::new(self, id))
    }

    /// Removes a league and, first, every one of its members.
    pub fn remove_league(&mut self, id: LeagueId) -> RegistryResult<()> {
        self.league_mut(id)?.remove()
    }

    /// Removes one employee; the root cannot be removed.
    pub fn remove_employee(&mut self, id: EmployeeId) -> RegistryResult<()> {
        self.employee_mut(id)?.remove()
    }

    /// Resolves `user` by e-mail, then by last name, and checks `password`.
    ///
    /// Unknown principals and wrong credentials both yield `AuthFailure`.
    pub fn authenticate(&self, user: &str, password: &str) -> RegistryResult<&Employee> {
        let user = user.trim();
        let candidate = match self.employee_by_email(user) {
            Some(employee) => Some(employee),
            None => self
                .repo
                .find_employee_by_name(user)?
                .and_then(|found| self.employee(found.id())),
        };

        match candidate {
            Some(employee) if employee.check_password(password) => {
                info!(
                    "event=auth module=registry status=ok employee_id={} root={}",
                    employee.id(),
                    employee.is_root()
                );
                Ok(employee)
            }
            _ => {
                warn!("event=auth module=registry status=error error_code=auth_failure");
                Err(RegistryError::AuthFailure)
            }
        }
    }

    pub(crate) fn all_employees(&self) -> impl Iterator<Item = &Employee> {
        std::iter::once(&self.root).chain(self.leagues.values().flat_map(League::members))
    }

    pub(crate) fn league_ref(&self, id: LeagueId) -> RegistryResult<&League> {
        self.leagues.get(&id).ok_or(RegistryError::LeagueNotFound(id))
    }

    pub(crate) fn employee_ref(&self, id: EmployeeId) -> RegistryResult<&Employee> {
        self.employee(id).ok_or(RegistryError::EmployeeNotFound(id))
    }

    pub(crate) fn email_taken(&self, email: &str, except: Option<EmployeeId>) -> bool {
        self.all_employees().any(|employee| {
            employee.email().eq_ignore_ascii_case(email) && Some(employee.id()) != except
        })
    }

    /// Persists and applies a new administrator without checking rights.
    pub(crate) fn commit_administrator(
        &mut self,
        league_id: LeagueId,
        administrator: EmployeeId,
    ) -> RegistryResult<()> {
        let mut record = self.league_ref(league_id)?.to_record();
        record.administrator = Some(administrator);
        self.repo.update_league(&record)?;

        if let Some(league) = self.leagues.get_mut(&league_id) {
            league.set_administrator(administrator);
        }
        Ok(())
    }

    /// Persists `next` and swaps it into the graph.
    pub(crate) fn commit_employee(&mut self, next: Employee) -> RegistryResult<()> {
        self.repo.update_employee(&next)?;

        match next.league() {
            None => self.root = next,
            Some(league_id) => {
                let league = self
                    .leagues
                    .get_mut(&league_id)
                    .ok_or(RegistryError::LeagueNotFound(league_id))?;
                let id = next.id();
                if !league.replace_member(next) {
                    return Err(RegistryError::EmployeeNotFound(id));
                }
            }
        }
        Ok(())
    }

    /// Removes one member.
    ///
    /// When the member administers its league, the administrator is switched
    /// to the root first; only then is the row deleted and the member
    /// detached. A failed delete puts the previous administrator back.
    pub(crate) fn remove_member(&mut self, id: EmployeeId) -> RegistryResult<Employee> {
        if self.is_root(id) {
            warn!("event=employee_remove module=registry status=error error_code=cannot_delete_root employee_id={id}");
            return Err(RegistryError::CannotDeleteRoot);
        }
        let league_id = self
            .employee_ref(id)?
            .league()
            .ok_or(RegistryError::CannotDeleteRoot)?;

        let administers = self.league_ref(league_id)?.administrator() == Some(id);
        if administers {
            let root_id = self.root.id();
            self.commit_administrator(league_id, root_id)?;
            info!(
                "event=administrator_reassign module=registry status=ok league_id={league_id} from={id} to={root_id}"
            );
        }

        if let Err(err) = self.repo.delete_employee(id) {
            warn!("event=employee_remove module=registry status=error error_code=persistence employee_id={id} error={err}");
            if administers {
                self.restore_administrator(league_id, id);
            }
            return Err(err.into());
        }

        let removed = self
            .leagues
            .get_mut(&league_id)
            .and_then(|league| league.remove_member(id))
            .ok_or(RegistryError::EmployeeNotFound(id))?;
        info!("event=employee_remove module=registry status=ok employee_id={id} league_id={league_id}");
        Ok(removed)
    }

    /// Puts `administrator` back after a removal failed part-way.
    ///
    /// If this write fails too, the root stays administrator in storage and
    /// in memory, which still satisfies the administrator invariant.
    fn restore_administrator(&mut self, league_id: LeagueId, administrator: EmployeeId) {
        match self.commit_administrator(league_id, administrator) {
            Ok(()) => info!(
                "event=administrator_restore module=registry status=ok league_id={league_id} administrator={administrator}"
            ),
            Err(err) => error!(
                "event=administrator_restore module=registry status=error error_code={} league_id={league_id} error={err}",
                err.code()
            ),
        }
    }

    fn repair_administrators(&mut self) -> RegistryResult<usize> {
        let root_id = self.root.id();
        let stale: Vec<LeagueId> = self
            .leagues
            .values()
            .filter(|league| match league.administrator() {
                Some(admin) => admin != root_id && !league.contains(admin),
                None => true,
            })
            .map(League::id)
            .collect();

        for league_id in &stale {
            self.commit_administrator(*league_id, root_id)?;
            warn!(
                "event=administrator_repair module=registry status=ok league_id={league_id} administrator={root_id}"
            );
        }
        Ok(stale.len())
    }
}

fn create_root<R: PersonnelRepository>(
    repo: &mut R,
    credentials: &RootCredentials,
) -> RegistryResult<Employee> {
    let draft = NewEmployee {
        last_name: credentials.last_name.trim().to_string(),
        first_name: credentials.first_name.trim().to_string(),
        email: credentials.email.trim().to_string(),
        password: credentials.password.clone(),
        arrival_date: Some(tenure::today()),
        departure_date: None,
        league: None,
    };
    let id = repo.insert_employee(&draft)?;
    info!("event=root_create module=registry status=ok employee_id={id}");
    Ok(Employee::from_parts(id, draft)?)
}
