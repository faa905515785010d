//! Site and portfolio overviews: a site joined with its planning and metrics,
//! as read by dashboards.

use crate::core::error;
use crate::core::ids::{self, RecordId};
use crate::core::output::{self, OutputFormat};
use crate::core::store::Store;
use crate::core::time;
use crate::plugins::consistency::{self, Finding, Severity};
use crate::plugins::metrics::{self, IndexReading, Profitability, SiteMetrics};
use crate::plugins::planning::{self, StatusCounts};
use crate::plugins::sites::{self, Chantier};
use chrono::{DateTime, NaiveDate, Utc};
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SiteOverview {
    pub site: Chantier,
    pub metrics: SiteMetrics,
    pub tasks: StatusCounts,
    /// `dateFin` when the site has one, else the latest planned task end.
    pub end_date: Option<String>,
    pub days_remaining: Option<i64>,
}

fn build_overview(store: &Store, site: Chantier, now: DateTime<Utc>) -> SiteOverview {
    let tasks = planning::get_tasks(store, site.id);
    let end = site
        .date_fin
        .as_deref()
        .and_then(time::parse_date)
        .or_else(|| planning::planned_end_date(&tasks));
    SiteOverview {
        metrics: metrics::compute_metrics_at(&site, &tasks, now.date_naive()),
        tasks: planning::status_counts(&tasks),
        end_date: end.map(time::format_date),
        days_remaining: end.map(|e| planning::days_remaining(e, now)),
        site,
    }
}

pub fn site_overview(store: &Store, site_id: RecordId, now: DateTime<Utc>) -> Option<SiteOverview> {
    let site = sites::get_site(store, site_id)?;
    Some(build_overview(store, site, now))
}

/// Overview of every site, in store order.
pub fn portfolio_overview(store: &Store, now: DateTime<Utc>) -> Vec<SiteOverview> {
    sites::list_sites(store)
        .into_iter()
        .map(|site| build_overview(store, site, now))
        .collect()
}

/// Planning keys that match no site (left behind by site removal).
pub fn orphaned_plannings(store: &Store) -> Vec<String> {
    let known: Vec<RecordId> = sites::list_sites(store).iter().map(|s| s.id).collect();
    planning::planning_keys(store)
        .into_iter()
        .filter(|k| !ids::parse_id(k).is_some_and(|id| known.contains(&id)))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub findings: Vec<Finding>,
    pub orphaned_plannings: Vec<String>,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }
}

/// Runs the consistency checks on one site, or on all of them.
pub fn check_store(store: &Store, site_id: Option<RecordId>) -> CheckReport {
    let targets: Vec<Chantier> = match site_id {
        Some(id) => sites::get_site(store, id).into_iter().collect(),
        None => sites::list_sites(store),
    };
    let mut findings = Vec::new();
    for site in &targets {
        findings.extend(consistency::check_site(site));
        findings.extend(consistency::check_tasks(&planning::get_tasks(store, site.id)));
    }
    CheckReport {
        findings,
        orphaned_plannings: if site_id.is_none() {
            orphaned_plannings(store)
        } else {
            Vec::new()
        },
    }
}

fn colored_reading(reading: IndexReading) -> String {
    match reading {
        IndexReading::OnTrack => reading.as_str().green().to_string(),
        IndexReading::Watch => reading.as_str().yellow().to_string(),
        IndexReading::Overrun => reading.as_str().red().to_string(),
        IndexReading::NotApplicable => reading.as_str().dimmed().to_string(),
    }
}

fn print_metrics(m: &SiteMetrics) {
    println!("  progression: {:.1}%", m.progression);
    println!(
        "  BAC {} | AC {} | EV {} | PV {}",
        output::amount(m.bac),
        output::amount(m.ac),
        output::amount(m.ev),
        output::amount(m.pv)
    );
    println!(
        "  CPI {} ({}) | SPI {} ({})",
        output::ratio_or_na(m.cpi),
        colored_reading(m.cost_reading),
        output::ratio_or_na(m.spi),
        colored_reading(m.schedule_reading)
    );
    println!(
        "  ETC {} | EAC {}",
        output::amount(m.etc),
        output::amount(m.eac)
    );
    let margin = format!(
        "{} ({}%)",
        output::amount(m.margin),
        output::ratio_or_na(m.margin_rate)
    );
    if m.margin_alert {
        println!("  margin: {} {}", margin.red().bold(), "ALERT".red().bold());
    } else {
        println!("  margin: {}", margin.green());
    }
    let verdict = match m.profitability {
        Profitability::Profitable => m.profitability.as_str().green(),
        Profitability::NotProfitable => m.profitability.as_str().yellow(),
    };
    println!(
        "  profitability: {} (threshold {}%)",
        verdict,
        metrics::MARGIN_RATE_PROFITABLE
    );
}

fn print_overview(o: &SiteOverview) {
    println!("{} [{}]", o.site.name.bold(), o.site.id);
    println!(
        "  tasks: {} planifie, {} en-cours, {} termine",
        o.tasks.planifie, o.tasks.en_cours, o.tasks.termine
    );
    match (&o.end_date, o.days_remaining) {
        (Some(end), Some(days)) => println!("  fin: {} ({} jours restants)", end, days),
        _ => println!("  fin: n/a"),
    }
    print_metrics(&o.metrics);
}

pub fn run_metrics_cli(
    store: &Store,
    site_id: RecordId,
    as_of: Option<NaiveDate>,
    format: OutputFormat,
) -> Result<(), error::ChantierError> {
    let site = sites::get_site(store, site_id)
        .ok_or_else(|| error::ChantierError::NotFound(format!("site {}", site_id)))?;
    let tasks = planning::get_tasks(store, site_id);
    let m = metrics::compute_metrics_at(&site, &tasks, as_of.unwrap_or_else(time::today));

    if format == OutputFormat::Json {
        output::print_json(&m)?;
    } else {
        println!("{} [{}]", site.name.bold(), site.id);
        print_metrics(&m);
    }
    Ok(())
}

pub fn run_overview_cli(store: &Store, format: OutputFormat) -> Result<(), error::ChantierError> {
    let overviews = portfolio_overview(store, Utc::now());
    if format == OutputFormat::Json {
        return output::print_json(&overviews);
    }
    if overviews.is_empty() {
        println!("No sites recorded yet.");
    }
    for o in &overviews {
        print_overview(o);
        println!();
    }
    Ok(())
}

pub fn run_check_cli(
    store: &Store,
    site_id: Option<RecordId>,
    format: OutputFormat,
) -> Result<(), error::ChantierError> {
    if let Some(id) = site_id
        && sites::get_site(store, id).is_none()
    {
        return Err(error::ChantierError::NotFound(format!("site {}", id)));
    }
    let report = check_store(store, site_id);

    if format == OutputFormat::Json {
        output::print_json(&report)?;
    } else if report.findings.is_empty() && report.orphaned_plannings.is_empty() {
        println!("{}", "✓ No inconsistencies found".green());
    } else {
        for f in &report.findings {
            let severity = match f.severity {
                Severity::Error => f.severity.to_string().red().bold(),
                Severity::Warning => f.severity.to_string().yellow(),
            };
            println!("{:<8} {:?} {}: {}", severity, f.subject, f.id, f.message);
        }
        for key in &report.orphaned_plannings {
            println!(
                "{:<8} planning {} has no matching site",
                "warning".yellow(),
                key
            );
        }
    }

    if report.has_errors() {
        return Err(error::ChantierError::ValidationError(format!(
            "{} consistency error(s) found",
            report
                .findings
                .iter()
                .filter(|f| f.severity == Severity::Error)
                .count()
        )));
    }
    Ok(())
}
