//! Earned-value indicators for a site.
//!
//! Pure derivations over a site's budget fields and its task list. Nothing here
//! touches the store. Degenerate inputs never fail: undefined ratios come back
//! as `None` ("n/a") and the caller decides how to show them.
//!
//! - BAC: category budgets summed, or the approved quote when all are zero.
//! - Progression: task progression weighted by planned hours (equal weights
//!   when no task carries hours).
//! - EV: BAC x progression / 100.
//! - AC: recorded actual cost when the site tracks one, otherwise BAC x
//!   progression / 100 (the sum of each task's BAC share at its progression).
//! - PV: each task's share of BAC, scaled by how much of its planned window
//!   has elapsed at the reference date.
//! - CPI = EV / AC, SPI = EV / PV.
//! - ETC = (BAC - EV) / CPI, or BAC - EV when CPI is undefined; zero when no
//!   task is planned.
//! - EAC = AC + ETC, margin = quote - EAC.
//! - Profitability: profitable when the margin is at least 20% of the quote.

use crate::core::time;
use crate::plugins::planning::PlanningTask;
use crate::plugins::sites::Chantier;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// CPI/SPI at or above this reads as on track.
pub const INDEX_ON_TRACK: f64 = 1.0;
/// CPI/SPI at or above this (and below on track) reads as watch.
pub const INDEX_WATCH: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndexReading {
    #[serde(rename = "on-track")]
    OnTrack,
    #[serde(rename = "watch")]
    Watch,
    #[serde(rename = "overrun")]
    Overrun,
    #[serde(rename = "n/a")]
    NotApplicable,
}

impl IndexReading {
    pub fn from_index(index: Option<f64>) -> Self {
        match index {
            None => IndexReading::NotApplicable,
            Some(v) if v >= INDEX_ON_TRACK => IndexReading::OnTrack,
            Some(v) if v >= INDEX_WATCH => IndexReading::Watch,
            Some(_) => IndexReading::Overrun,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexReading::OnTrack => "on-track",
            IndexReading::Watch => "watch",
            IndexReading::Overrun => "overrun",
            IndexReading::NotApplicable => "n/a",
        }
    }
}

impl fmt::Display for IndexReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Margin rate (percent of the quote) from which a site counts as profitable.
pub const MARGIN_RATE_PROFITABLE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profitability {
    Profitable,
    NotProfitable,
}

impl Profitability {
    /// A site without a quote has no margin rate and is never profitable.
    pub fn from_margin_rate(margin_rate: Option<f64>) -> Self {
        match margin_rate {
            Some(rate) if rate >= MARGIN_RATE_PROFITABLE => Profitability::Profitable,
            _ => Profitability::NotProfitable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profitability::Profitable => "profitable",
            Profitability::NotProfitable => "not-profitable",
        }
    }
}

impl fmt::Display for Profitability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteMetrics {
    #[serde(rename = "BAC")]
    pub bac: f64,
    #[serde(rename = "AC")]
    pub ac: f64,
    #[serde(rename = "EV")]
    pub ev: f64,
    #[serde(rename = "PV")]
    pub pv: f64,
    #[serde(rename = "CPI")]
    pub cpi: Option<f64>,
    #[serde(rename = "SPI")]
    pub spi: Option<f64>,
    #[serde(rename = "ETC")]
    pub etc: f64,
    #[serde(rename = "EAC")]
    pub eac: f64,
    pub margin: f64,
    /// Overall weighted progression, in percent.
    pub progression: f64,
    /// Margin as a percentage of the approved quote.
    pub margin_rate: Option<f64>,
    pub cost_reading: IndexReading,
    pub schedule_reading: IndexReading,
    /// Projected cost overrun (negative margin).
    pub margin_alert: bool,
    pub profitability: Profitability,
}

/// Metrics as of today (UTC).
pub fn compute_metrics(site: &Chantier, tasks: &[PlanningTask]) -> SiteMetrics {
    compute_metrics_at(site, tasks, time::today())
}

pub fn compute_metrics_at(site: &Chantier, tasks: &[PlanningTask], as_of: NaiveDate) -> SiteMetrics {
    let bac = budget_at_completion(site);
    let weights = task_weights(tasks);
    let progression = overall_progression(tasks);

    let ev = bac * progression / 100.0;
    // Without booked actuals, each task is taken to have cost its BAC share at
    // its own progression, which sums to EV.
    let ac = site.cout_reel.unwrap_or(ev);
    let pv: f64 = tasks
        .iter()
        .zip(&weights)
        .map(|(t, w)| bac * w * planned_fraction(t, as_of))
        .sum();

    let cpi = ratio(ev, ac);
    let spi = ratio(ev, pv);

    let etc = if tasks.is_empty() {
        0.0
    } else {
        match cpi {
            Some(c) if c > 0.0 => (bac - ev) / c,
            _ => bac - ev,
        }
    };
    let eac = ac + etc;
    let margin = site.devis_valide - eac;
    let margin_rate = ratio(margin * 100.0, site.devis_valide);

    SiteMetrics {
        bac,
        ac,
        ev,
        pv,
        cpi,
        spi,
        etc,
        eac,
        margin,
        progression,
        margin_rate,
        cost_reading: IndexReading::from_index(cpi),
        schedule_reading: IndexReading::from_index(spi),
        margin_alert: margin < 0.0,
        profitability: Profitability::from_margin_rate(margin_rate),
    }
}

/// Category budgets when any is set, otherwise the approved quote.
pub fn budget_at_completion(site: &Chantier) -> f64 {
    let categories = [
        site.budget_mo,
        site.budget_fournitures,
        site.budget_locations,
        site.budget_st,
    ];
    if categories.iter().all(|b| *b == 0.0) {
        site.devis_valide
    } else {
        site.category_budget_total()
    }
}

/// Share of each task in the site total: planned hours over total hours, or an
/// equal split when hours sum to zero.
pub fn task_weights(tasks: &[PlanningTask]) -> Vec<f64> {
    if tasks.is_empty() {
        return Vec::new();
    }
    let total_hours: f64 = tasks.iter().map(|t| t.heures_homme).sum();
    if total_hours > 0.0 {
        tasks.iter().map(|t| t.heures_homme / total_hours).collect()
    } else {
        let equal = 1.0 / tasks.len() as f64;
        vec![equal; tasks.len()]
    }
}

/// Weighted average of task progression, 0 for an empty list.
pub fn overall_progression(tasks: &[PlanningTask]) -> f64 {
    tasks
        .iter()
        .zip(task_weights(tasks))
        .map(|(t, w)| w * t.progression as f64)
        .sum()
}

/// Fraction of the task's planned window elapsed at `as_of`, in [0, 1].
/// Unreadable start dates count as not started.
pub fn planned_fraction(task: &PlanningTask, as_of: NaiveDate) -> f64 {
    let Some(start) = task.start_date() else {
        return 0.0;
    };
    if as_of < start {
        return 0.0;
    }
    if task.duree <= 0 {
        return 1.0;
    }
    let elapsed = (as_of - start).num_days() as f64;
    (elapsed / task.duree as f64).clamp(0.0, 1.0)
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        None
    } else {
        Some(numerator / denominator)
    }
}
