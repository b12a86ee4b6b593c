//! SQLite implementation of the persistence port.
//!
//! # Responsibility
//! - Map leagues and employees onto the `leagues` / `employees` tables.
//! - Translate unique-constraint failures into `RepoError::UniqueViolation`.
//!
//! # Invariants
//! - Only migrated connections are accepted (`try_new`).
//! - `is_root = 1` exactly when `league_id IS NULL`; the schema enforces
//!   this and at most one root row.
//! - League affiliation is written once at insert and never rewritten.
//! - League members always carry an arrival date.

use crate::db::migrations::{current_user_version, latest_version};
use crate::model::employee::{Employee, EmployeeId, NewEmployee};
use crate::model::league::{LeagueId, LeagueRecord, NewLeague};
use crate::repo::{PersonnelRepository, PersonnelSnapshot, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};

const REQUIRED_TABLES: &[&str] = &["leagues", "employees"];

const LEAGUE_SELECT_SQL: &str = "SELECT id, name, administrator_id FROM leagues";

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    last_name,
    first_name,
    email,
    password,
    arrival_date,
    departure_date,
    league_id,
    is_root
FROM employees";

/// SQLite-backed personnel repository.
pub struct SqlitePersonnelRepository {
    conn: Connection,
}

impl SqlitePersonnelRepository {
    /// Wraps a connection returned by `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` when the schema is incomplete.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_one_employee(
        &self,
        filter: &str,
        param: impl rusqlite::ToSql,
    ) -> RepoResult<Option<Employee>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} {filter}"))?;
        let mut rows = stmt.query([param])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_employee_row(row)?)),
            None => Ok(None),
        }
    }
}

impl PersonnelRepository for SqlitePersonnelRepository {
    fn insert_league(&mut self, league: &NewLeague) -> RepoResult<LeagueId> {
        self.conn
            .execute(
                "INSERT INTO leagues (name, administrator_id) VALUES (?1, ?2);",
                params![league.name.as_str(), league.administrator.map(|id| id.0)],
            )
            .map_err(|err| map_write_error(err, &league.name))?;
        Ok(LeagueId(self.conn.last_insert_rowid()))
    }

    fn insert_employee(&mut self, employee: &NewEmployee) -> RepoResult<EmployeeId> {
        employee
            .validate()
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO employees (
                    last_name,
                    first_name,
                    email,
                    password,
                    arrival_date,
                    departure_date,
                    league_id,
                    is_root
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    employee.last_name.as_str(),
                    employee.first_name.as_str(),
                    employee.email.as_str(),
                    employee.password.as_str(),
                    employee.arrival_date,
                    employee.departure_date,
                    employee.league.map(|id| id.0),
                    bool_to_int(employee.is_root()),
                ],
            )
            .map_err(|err| map_write_error(err, &employee.email))?;
        Ok(EmployeeId(self.conn.last_insert_rowid()))
    }

    fn update_league(&mut self, league: &LeagueRecord) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE leagues
                 SET
                    name = ?1,
                    administrator_id = ?2,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?3;",
                params![
                    league.name.as_str(),
                    league.administrator.map(|id| id.0),
                    league.id.0
                ],
            )
            .map_err(|err| map_write_error(err, &league.name))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "league",
                id: league.id.0,
            });
        }
        Ok(())
    }

    fn update_employee(&mut self, employee: &Employee) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE employees
                 SET
                    last_name = ?1,
                    first_name = ?2,
                    email = ?3,
                    password = ?4,
                    arrival_date = ?5,
                    departure_date = ?6,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?7;",
                params![
                    employee.last_name(),
                    employee.first_name(),
                    employee.email(),
                    employee.password(),
                    employee.arrival_date(),
                    employee.departure_date(),
                    employee.id().0,
                ],
            )
            .map_err(|err| map_write_error(err, employee.email()))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "employee",
                id: employee.id().0,
            });
        }
        Ok(())
    }

    fn delete_league(&mut self, id: LeagueId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM leagues WHERE id = ?1;", [id.0])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "league",
                id: id.0,
            });
        }
        Ok(())
    }

    fn delete_employee(&mut self, id: EmployeeId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM employees WHERE id = ?1;", [id.0])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "employee",
                id: id.0,
            });
        }
        Ok(())
    }

    fn load_all(&self) -> RepoResult<PersonnelSnapshot> {
        let mut leagues = Vec::new();
        let mut stmt = self
            .conn
            .prepare(&format!("{LEAGUE_SELECT_SQL} ORDER BY name ASC, id ASC"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            leagues.push(parse_league_row(row)?);
        }

        let mut employees = Vec::new();
        let mut stmt = self
            .conn
            .prepare(&format!("{EMPLOYEE_SELECT_SQL} ORDER BY id ASC"))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            employees.push(parse_employee_row(row)?);
        }

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
        self.query_one_employee("WHERE email = ?1 LIMIT 1", email.trim())
    }

    fn find_employee_by_name(&self, last_name: &str) -> RepoResult<Option<Employee>> {
        self.query_one_employee("WHERE last_name = ?1 ORDER BY id ASC LIMIT 1", last_name)
    }

    fn find_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        self.query_one_employee("WHERE id = ?1", id.0)
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in REQUIRED_TABLES {
        let exists = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
                [table],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn parse_league_row(row: &Row<'_>) -> RepoResult<LeagueRecord> {
    Ok(LeagueRecord {
        id: LeagueId(row.get("id")?),
        name: row.get("name")?,
        administrator: row.get::<_, Option<i64>>("administrator_id")?.map(EmployeeId),
    })
}

fn parse_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let id = EmployeeId(row.get("id")?);
    let league = row.get::<_, Option<i64>>("league_id")?.map(LeagueId);

    let is_root = match row.get::<_, i64>("is_root")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_root value `{other}` in employees.is_root for employee {id}"
            )));
        }
    };
    if is_root != league.is_none() {
        return Err(RepoError::InvalidData(format!(
            "employee {id} has is_root={is_root} but league_id={league:?}"
        )));
    }

    let arrival_date: Option<NaiveDate> = row.get("arrival_date")?;
    if !is_root && arrival_date.is_none() {
        return Err(RepoError::InvalidData(format!(
            "employee {id} is a league member without an arrival date"
        )));
    }

    let parts = NewEmployee {
        last_name: row.get("last_name")?,
        first_name: row.get("first_name")?,
        email: row.get("email")?,
        password: row.get("password")?,
        arrival_date,
        departure_date: row.get("departure_date")?,
        league,
    };
    Employee::from_parts(id, parts)
        .map_err(|err| RepoError::InvalidData(format!("employee {id}: {err}")))
}

fn map_write_error(err: rusqlite::Error, value: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
            return RepoError::UniqueViolation {
                field: unique_field(message.as_deref().unwrap_or_default()),
                value: value.to_string(),
            };
        }
    }
    err.into()
}

fn unique_field(message: &str) -> &'static str {
    if message.contains("employees.email") {
        "email"
    } else if message.contains("leagues.name") {
        "name"
    } else if message.contains("employees.is_root") {
        "root"
    } else {
        "unknown"
    }
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

#[cfg(test)]
mod tests {
    use super::unique_field;

    #[test]
    fn unique_field_reads_sqlite_message() {
        assert_eq!(
            unique_field("UNIQUE constraint failed: employees.email"),
            "email"
        );
        assert_eq!(unique_field("UNIQUE constraint failed: leagues.name"), "name");
        assert_eq!(
            unique_field("UNIQUE constraint failed: employees.is_root"),
            "root"
        );
        assert_eq!(unique_field("something else"), "unknown");
    }
}
