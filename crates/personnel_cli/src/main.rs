//! `personnel` command-line entry point.
//!
//! Opens the process registry over SQLite, runs one command and exits.

mod cli;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use cli::{Cli, Commands};
use log::{info, warn};
use personnel_core::db::{open_db, open_db_in_memory};
use personnel_core::{
    Employee, EmployeeId, EmployeeUpdate, League, LeagueId, PersonnelRegistry, RegistryConfig,
    SqlitePersonnelRepository,
};
use serde_json::json;
use std::path::{Path, PathBuf};

type Registry = PersonnelRegistry<SqlitePersonnelRepository>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    personnel_core::init_logging_from_settings(&config.logging)
        .context("failed to initialize logging")?;
    info!(
        "event=cli_start module=cli status=ok core_version={}",
        personnel_core::core_version()
    );

    let repo = open_repository(&config)?;
    let mut registry = PersonnelRegistry::open(repo, &config)?;
    run(&mut registry, cli.command, cli.json)
}

fn load_config(cli: &Cli) -> Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::default(),
    };
    if let Some(database) = &cli.database {
        config.storage.database_path = Some(database.clone());
    }
    if let Some(log_dir) = &cli.log_dir {
        config.logging.log_dir = Some(absolutize(log_dir)?);
    }
    config.validate()?;
    Ok(config)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}

fn open_repository(config: &RegistryConfig) -> Result<SqlitePersonnelRepository> {
    let conn = match &config.storage.database_path {
        Some(path) => open_db(path)
            .with_context(|| format!("failed to open database {}", path.display()))?,
        None => {
            warn!("event=storage_select module=cli status=ok mode=memory");
            open_db_in_memory()?
        }
    };
    Ok(SqlitePersonnelRepository::try_new(conn)?)
}

fn run(registry: &mut Registry, command: Commands, as_json: bool) -> Result<()> {
    match command {
        Commands::Leagues => {
            let rows: Vec<_> = registry
                .leagues()
                .into_iter()
                .map(|league| {
                    let administrator = league
                        .administrator()
                        .and_then(|id| registry.employee(id))
                        .map(|employee| employee.email().to_string());
                    json!({
                        "id": league.id(),
                        "name": league.name(),
                        "administrator": administrator,
                        "members": league.len(),
                    })
                })
                .collect();
            if as_json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for league in registry.leagues() {
                    println!("{league}  members={}", league.len());
                }
            }
        }
        Commands::Members { league, active_on } => {
            let league = registry
                .league_by_name(&league)
                .with_context(|| format!("no league named `{league}`"))?;
            let members = members_active_on(league, active_on);
            if as_json {
                println!("{}", serde_json::to_string_pretty(&members)?);
            } else {
                for member in members {
                    let marker = if member.is_administrator_of(league) { " *" } else { "" };
                    println!("{}{marker}", registry.describe(member));
                }
            }
        }
        Commands::AddLeague { name } => {
            let id = registry.add_league(&name)?.id();
            print_league(registry, id, as_json)?;
        }
        Commands::RenameLeague { league, new_name } => {
            let id = league_id(registry, &league)?;
            registry.league_mut(id)?.set_name(&new_name)?;
            print_league(registry, id, as_json)?;
        }
        Commands::RemoveLeague { league } => {
            let id = league_id(registry, &league)?;
            registry.remove_league(id)?;
            println!("removed league `{league}`");
        }
        Commands::AddEmployee {
            league,
            last_name,
            first_name,
            email,
            password,
            arrival,
            departure,
        } => {
            let id = league_id(registry, &league)?;
            let employee = registry.league_mut(id)?.add_employee(
                &last_name,
                &first_name,
                &email,
                &password,
                arrival,
                departure,
            )?;
            print_employee(registry, employee.id(), as_json)?;
        }
        Commands::RemoveEmployee { email } => {
            let id = employee_id(registry, &email)?;
            registry.remove_employee(id)?;
            println!("removed employee `{email}`");
        }
        Commands::SetAdmin { league, email } => {
            let league = league_id(registry, &league)?;
            let employee = employee_id(registry, &email)?;
            registry.league_mut(league)?.set_administrator(employee)?;
            print_league(registry, league, as_json)?;
        }
        Commands::EditEmployee {
            email,
            last_name,
            first_name,
            new_email,
            password,
        } => {
            let id = employee_id(registry, &email)?;
            let update = profile_update(last_name, first_name, new_email, password)?;
            registry.employee_mut(id)?.apply(update)?;
            print_employee(registry, id, as_json)?;
        }
        Commands::SetTenure {
            email,
            arrival,
            departure,
            clear_departure,
        } => {
            let id = employee_id(registry, &email)?;
            let update = tenure_update(arrival, departure, clear_departure)?;
            registry.employee_mut(id)?.apply(update)?;
            print_employee(registry, id, as_json)?;
        }
        Commands::Login { user, password } => {
            let employee = registry.authenticate(&user, &password)?;
            let id = employee.id();
            print_employee(registry, id, as_json)?;
        }
        Commands::Root => {
            let id = registry.root().id();
            print_employee(registry, id, as_json)?;
        }
    }
    Ok(())
}

fn members_active_on(league: &League, date: Option<NaiveDate>) -> Vec<&Employee> {
    league
        .members()
        .iter()
        .filter(|member| date.map_or(true, |date| member.is_active_on(date)))
        .collect()
}

fn league_id(registry: &Registry, name: &str) -> Result<LeagueId> {
    registry
        .league_by_name(name)
        .map(|league| league.id())
        .with_context(|| format!("no league named `{name}`"))
}

fn employee_id(registry: &Registry, email: &str) -> Result<EmployeeId> {
    registry
        .employee_by_email(email)
        .map(|employee| employee.id())
        .with_context(|| format!("no employee with email `{email}`"))
}

fn profile_update(
    last_name: Option<String>,
    first_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<EmployeeUpdate> {
    let update = EmployeeUpdate {
        last_name,
        first_name,
        email,
        password,
        ..EmployeeUpdate::default()
    };
    if update.is_empty() {
        bail!("nothing to change: pass --last-name, --first-name, --email or --password");
    }
    Ok(update)
}

fn tenure_update(
    arrival: Option<NaiveDate>,
    departure: Option<NaiveDate>,
    clear_departure: bool,
) -> Result<EmployeeUpdate> {
    let mut update = EmployeeUpdate::default();
    if let Some(arrival) = arrival {
        update = update.arrival_date(arrival);
    }
    if clear_departure {
        update = update.departure_date(None);
    } else if let Some(departure) = departure {
        update = update.departure_date(Some(departure));
    }
    if update.is_empty() {
        bail!("nothing to change: pass --arrival, --departure or --clear-departure");
    }
    Ok(update)
}

fn print_league(registry: &Registry, id: LeagueId, as_json: bool) -> Result<()> {
    let league = registry
        .league(id)
        .with_context(|| format!("league {id} disappeared"))?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(league)?);
    } else {
        let administrator = league
            .administrator()
            .and_then(|admin| registry.employee(admin))
            .map_or_else(|| "-".to_string(), |employee| employee.email().to_string());
        println!("{league}  administrator={administrator}  members={}", league.len());
    }
    Ok(())
}

fn print_employee(registry: &Registry, id: EmployeeId, as_json: bool) -> Result<()> {
    let employee = registry
        .employee(id)
        .with_context(|| format!("employee {id} disappeared"))?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(employee)?);
    } else {
        let departure = employee
            .departure_date()
            .map_or_else(|| "-".to_string(), |date| date.to_string());
        let arrival = employee
            .arrival_date()
            .map_or_else(|| "-".to_string(), |date| date.to_string());
        println!(
            "{}  arrival={arrival}  departure={departure}",
            registry.describe(employee)
        );
    }
    Ok(())
}
