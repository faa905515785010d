//! Chantier: a local-first tracker for construction sites.
//!
//! Sites ("chantiers"), their team and a per-site task schedule are kept in a
//! small record store. Progress and earned-value indicators (BAC, AC, EV, PV,
//! CPI, SPI, ETC, EAC, margin) are derived from that data on read.
//!
//! # Architecture
//!
//! Data flows one way. Commands write through the repositories into the record
//! store; reads come back through the repositories and into the metrics engine.
//!
//! - **Record store** ([`core::store`]): JSON values under the keys `sites`,
//!   `team` and `planning`, on a SQLite file or in memory. Seeded on first use.
//! - **Repositories** ([`plugins::sites`], [`plugins::team`],
//!   [`plugins::planning`]): full-collection read-modify-write.
//! - **Metrics engine** ([`plugins::metrics`]): pure functions of a site and
//!   its tasks.
//!
//! # Examples
//!
//! ```bash
//! chantier init
//! chantier site list
//! chantier planning list --site 1661346000001
//! chantier metrics --site 1661346000001 --format json
//! chantier check
//! ```

pub mod cli;
pub mod core;
pub mod plugins;

use crate::cli::{Cli, Command};
use crate::core::{config, error, logging, store::Store};
use crate::plugins::{overview, planning, sites, team};

use clap::Parser;

pub fn run() -> Result<(), error::ChantierError> {
    let cli = Cli::parse();

    let cfg = config::load_config(cli.config.as_deref())?;
    let log_filter = config::resolve_log_filter(
        std::env::var(config::LOG_ENV_VAR).ok().as_deref(),
        &cfg,
    );
    logging::init_logging(&log_filter);

    let store_path = config::resolve_store_path(
        cli.store.as_deref(),
        std::env::var(config::STORE_ENV_VAR).ok().as_deref(),
        &cfg,
    );
    tracing::debug!(path = %store_path.display(), "resolved store path");

    let store = Store::open(&store_path)?;
    store.initialize()?;

    let format = cli.format;
    match cli.command {
        Command::Init => {
            println!("✓ Store ready at {}", store_path.display());
        }
        Command::Site(site_cli) => sites::run_site_cli(&store, site_cli, format)?,
        Command::Team(team_cli) => team::run_team_cli(&store, team_cli, format)?,
        Command::Planning(planning_cli) => {
            planning::run_planning_cli(&store, planning_cli, format)?
        }
        Command::Metrics { site, as_of } => {
            overview::run_metrics_cli(&store, site, as_of, format)?
        }
        Command::Overview => overview::run_overview_cli(&store, format)?,
        Command::Check { site } => overview::run_check_cli(&store, site, format)?,
    }

    Ok(())
}
