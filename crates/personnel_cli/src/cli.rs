//! Command-line arguments.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Personnel registry: leagues, members and their administrators.
#[derive(Parser, Debug)]
#[command(name = "personnel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "PERSONNEL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides the configuration)
    #[arg(long, env = "PERSONNEL_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    /// Directory for rolling log files (overrides the configuration)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List leagues by name
    Leagues,

    /// List the members of a league
    Members {
        /// League name
        league: String,

        /// Only members present on this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        active_on: Option<NaiveDate>,
    },

    /// Create a league administered by the root
    AddLeague { name: String },

    /// Rename a league
    RenameLeague {
        /// Current league name
        league: String,
        new_name: String,
    },

    /// Remove a league and all of its members
    RemoveLeague { league: String },

    /// Add a member to a league
    AddEmployee {
        /// League name
        league: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Arrival date (YYYY-MM-DD); defaults to today
        #[arg(long, value_parser = parse_date)]
        arrival: Option<NaiveDate>,

        /// Departure date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        departure: Option<NaiveDate>,
    },

    /// Remove a member, identified by e-mail
    RemoveEmployee { email: String },

    /// Make a member (or the root) administrator of a league
    SetAdmin {
        /// League name
        league: String,
        /// E-mail of the new administrator
        email: String,
    },

    /// Change an employee's names, e-mail or password (the root included)
    EditEmployee {
        /// Current e-mail (`root` for the root)
        email: String,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        /// New e-mail
        #[arg(long = "email", id = "new_email")]
        new_email: Option<String>,

        #[arg(long)]
        password: Option<String>,
    },

    /// Change an employee's arrival or departure date
    SetTenure {
        email: String,

        #[arg(long, value_parser = parse_date)]
        arrival: Option<NaiveDate>,

        #[arg(long, value_parser = parse_date, conflicts_with = "clear_departure")]
        departure: Option<NaiveDate>,

        /// Remove the departure date
        #[arg(long)]
        clear_departure: bool,
    },

    /// Check credentials (e-mail or last name)
    Login { user: String, password: String },

    /// Show the root profile
    Root,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD, got `{value}`: {err}"))
}
