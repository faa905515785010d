//! Report-only consistency checks over sites and task lists.
//!
//! The repositories accept whatever they are given. These checks let a caller
//! that wants stricter guarantees see what is off, without anything being
//! corrected or rejected.

use crate::core::ids::RecordId;
use crate::core::time;
use crate::plugins::planning::{PlanningTask, TaskStatus};
use crate::plugins::sites::Chantier;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Site,
    Task,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub subject: Subject,
    pub id: RecordId,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn site(id: RecordId, severity: Severity, message: String) -> Self {
        Self {
            subject: Subject::Site,
            id,
            severity,
            message,
        }
    }

    fn task(id: RecordId, severity: Severity, message: String) -> Self {
        Self {
            subject: Subject::Task,
            id,
            severity,
            message,
        }
    }
}

pub fn check_site(site: &Chantier) -> Vec<Finding> {
    let mut findings = Vec::new();
    let amounts = [
        ("devisValide", site.devis_valide),
        ("budgetInitialHeures", site.budget_initial_heures),
        ("budgetMO", site.budget_mo),
        ("budgetFournitures", site.budget_fournitures),
        ("budgetLocations", site.budget_locations),
        ("budgetST", site.budget_st),
    ];
    for (field, value) in amounts {
        if value < 0.0 {
            findings.push(Finding::site(
                site.id,
                Severity::Error,
                format!("{} is negative ({})", field, value),
            ));
        }
    }
    if let Some(cost) = site.cout_reel.filter(|c| *c < 0.0) {
        findings.push(Finding::site(
            site.id,
            Severity::Error,
            format!("coutReel is negative ({})", cost),
        ));
    }
    if let Some(end) = &site.date_fin
        && time::parse_date(end).is_none()
    {
        findings.push(Finding::site(
            site.id,
            Severity::Warning,
            format!("dateFin is not a calendar date: {:?}", end),
        ));
    }
    findings
}

pub fn check_tasks(tasks: &[PlanningTask]) -> Vec<Finding> {
    tasks.iter().flat_map(check_task).collect()
}

fn check_task(task: &PlanningTask) -> Vec<Finding> {
    let mut findings = Vec::new();

    match task.statut {
        TaskStatus::Termine if task.progression != 100 => findings.push(Finding::task(
            task.id,
            Severity::Warning,
            format!("status termine with progression {}%", task.progression),
        )),
        TaskStatus::Planifie if task.progression != 0 => findings.push(Finding::task(
            task.id,
            Severity::Warning,
            format!("status planifie with progression {}%", task.progression),
        )),
        _ => {}
    }
    if !(0..=100).contains(&task.progression) {
        findings.push(Finding::task(
            task.id,
            Severity::Error,
            format!("progression {} is outside 0..=100", task.progression),
        ));
    }
    if task.heures_homme < 0.0 {
        findings.push(Finding::task(
            task.id,
            Severity::Error,
            format!("heuresHomme is negative ({})", task.heures_homme),
        ));
    }
    if task.operateurs <= 0 {
        findings.push(Finding::task(
            task.id,
            Severity::Warning,
            format!("operateurs should be positive (got {})", task.operateurs),
        ));
    }
    if task.duree <= 0 {
        findings.push(Finding::task(
            task.id,
            Severity::Warning,
            format!("duree should be positive (got {})", task.duree),
        ));
    }
    if task.start_date().is_none() {
        findings.push(Finding::task(
            task.id,
            Severity::Error,
            format!("dateDebut is not a calendar date: {:?}", task.date_debut),
        ));
    }

    findings
}
