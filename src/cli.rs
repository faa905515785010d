//! CLI struct definitions for the chantier command-line interface.
//!
//! Subsystem command groups are defined next to their subsystem; this file
//! assembles them. Dispatch lives in `lib.rs`.

use crate::core::ids::{self, RecordId};
use crate::core::output::OutputFormat;
use crate::plugins::{planning, sites, team};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "chantier",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track construction sites, their team and task planning, with earned-value indicators."
)]
pub(crate) struct Cli {
    /// Path to the SQLite store (overrides CHANTIER_STORE and the config file).
    #[clap(long, global = true)]
    pub store: Option<PathBuf>,
    /// Path to a TOML config file (defaults to ./chantier.toml when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Output format.
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    #[clap(subcommand)]
    pub command: Command,
}

fn parse_as_of(raw: &str) -> Result<NaiveDate, String> {
    crate::core::time::parse_date(raw).ok_or_else(|| format!("invalid date: {raw:?}"))
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create the store and seed sample records when empty
    #[clap(name = "init")]
    Init,

    /// Construction sites
    #[clap(name = "site", visible_alias = "s")]
    Site(sites::SiteCli),

    /// Team members
    #[clap(name = "team")]
    Team(team::TeamCli),

    /// Per-site task planning
    #[clap(name = "planning", visible_alias = "p")]
    Planning(planning::PlanningCli),

    /// Earned-value indicators of a site
    #[clap(name = "metrics", visible_alias = "m")]
    Metrics {
        #[clap(long, value_parser = ids::parse_cli_id)]
        site: RecordId,
        /// Reference date for planned value (defaults to today)
        #[clap(long, value_parser = parse_as_of)]
        as_of: Option<NaiveDate>,
    },

    /// Every site with its progress, schedule and indicators
    #[clap(name = "overview", visible_alias = "o")]
    Overview,

    /// Report data inconsistencies without changing anything
    #[clap(name = "check")]
    Check {
        #[clap(long, value_parser = ids::parse_cli_id)]
        site: Option<RecordId>,
    },
}
