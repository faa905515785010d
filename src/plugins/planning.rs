//! Planning repository: the ordered task list of each site.
//!
//! All lists live in one `planning` map keyed by the site id string. Saving a
//! site's list replaces it wholesale; callers pass the complete intended state.
//!
//! The repository does not reconcile `statut` with `progression`. Only the
//! explicit [`transition_task`] sets progression, and only for the two terminal
//! ends of the lifecycle (`planifie` = 0, `termine` = 100).

use crate::core::error;
use crate::core::ids::{self, RecordId};
use crate::core::lenient;
use crate::core::output::{self, OutputFormat};
use crate::core::schemas;
use crate::core::store::Store;
use crate::core::time;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

pub type PlanningMap = BTreeMap<String, Vec<PlanningTask>>;

/// The `planning` map with each site's list left unparsed.
type RawPlanningMap = BTreeMap<String, JsonValue>;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Planifie,
    EnCours,
    Termine,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Planifie => "planifie",
            TaskStatus::EnCours => "en-cours",
            TaskStatus::Termine => "termine",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningTask {
    #[serde(deserialize_with = "ids::deserialize_lenient")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub nom: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub responsable: String,
    /// Start date, `YYYY-MM-DD` once saved.
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub date_debut: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub heures_homme: f64,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub operateurs: i64,
    /// Planned duration in days.
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub duree: i64,
    /// Completion percentage; stored as given, not clamped.
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub progression: i64,
    #[serde(default)]
    pub statut: TaskStatus,
}

impl PlanningTask {
    pub fn start_date(&self) -> Option<NaiveDate> {
        time::parse_date(&self.date_debut)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub nom: String,
    pub responsable: String,
    pub date_debut: String,
    pub heures_homme: f64,
    pub operateurs: i64,
    pub duree: i64,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub nom: Option<String>,
    pub responsable: Option<String>,
    pub date_debut: Option<String>,
    pub heures_homme: Option<f64>,
    pub operateurs: Option<i64>,
    pub duree: Option<i64>,
    pub progression: Option<i64>,
    pub statut: Option<TaskStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub planifie: usize,
    pub en_cours: usize,
    pub termine: usize,
}

/// Every site's list. A list that does not parse is skipped, not the whole map.
pub fn load_planning(store: &Store) -> PlanningMap {
    let raw: RawPlanningMap = store.read(schemas::PLANNING_KEY);
    raw.into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(tasks) => Some((key, tasks)),
            Err(e) => {
                tracing::warn!(site = %key, error = %e, "malformed planning list skipped");
                None
            }
        })
        .collect()
}

/// Keys of every recorded list, readable or not.
pub fn planning_keys(store: &Store) -> Vec<String> {
    store
        .read::<RawPlanningMap>(schemas::PLANNING_KEY)
        .into_keys()
        .collect()
}

pub fn get_tasks(store: &Store, site_id: RecordId) -> Vec<PlanningTask> {
    let mut raw: RawPlanningMap = store.read(schemas::PLANNING_KEY);
    let Some(value) = raw.remove(&ids::planning_key(site_id)) else {
        return Vec::new();
    };
    serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!(site_id, error = %e, "malformed planning list, using empty list");
        Vec::new()
    })
}

fn load_raw_for_update(store: &Store) -> Result<RawPlanningMap, error::ChantierError> {
    store.read_for_update(schemas::PLANNING_KEY)
}

/// The site's list as stored, for a read-modify-write. Fails rather than
/// default when the list exists but does not parse.
fn tasks_for_update(
    store: &Store,
    site_id: RecordId,
) -> Result<Vec<PlanningTask>, error::ChantierError> {
    let key = ids::planning_key(site_id);
    let Some(value) = load_raw_for_update(store)?.remove(&key) else {
        return Ok(Vec::new());
    };
    serde_json::from_value(value).map_err(|source| error::ChantierError::CorruptRecord {
        key: format!("{}/{}", schemas::PLANNING_KEY, key),
        source,
    })
}

/// Replaces the site's task list with `tasks`, start dates canonicalized.
/// Other sites' lists are written back exactly as they were read.
pub fn save_tasks(
    store: &Store,
    site_id: RecordId,
    tasks: Vec<PlanningTask>,
) -> Result<(), error::ChantierError> {
    let mut planning = load_raw_for_update(store)?;
    let tasks: Vec<PlanningTask> = tasks
        .into_iter()
        .map(|mut t| {
            t.date_debut = time::normalize_date(&t.date_debut);
            t
        })
        .collect();
    let count = tasks.len();
    planning.insert(ids::planning_key(site_id), serde_json::to_value(&tasks)?);
    store.write(schemas::PLANNING_KEY, &planning)?;

    tracing::debug!(site_id, tasks = count, "planning saved");
    Ok(())
}

/// Drops the whole list of a site. Returns false when none was recorded.
pub fn delete_planning(store: &Store, site_id: RecordId) -> Result<bool, error::ChantierError> {
    let mut planning = load_raw_for_update(store)?;
    if planning.remove(&ids::planning_key(site_id)).is_none() {
        return Ok(false);
    }
    store.write(schemas::PLANNING_KEY, &planning)?;

    tracing::info!(site_id, "planning deleted");
    Ok(true)
}

pub fn add_task(
    store: &Store,
    site_id: RecordId,
    input: TaskInput,
) -> Result<PlanningTask, error::ChantierError> {
    let mut tasks = tasks_for_update(store, site_id)?;
    let task = PlanningTask {
        id: ids::next_sequential_id(tasks.iter().map(|t| t.id))?,
        nom: input.nom,
        responsable: input.responsable,
        date_debut: time::normalize_date(&input.date_debut),
        heures_homme: input.heures_homme,
        operateurs: input.operateurs,
        duree: input.duree,
        progression: 0,
        statut: TaskStatus::Planifie,
    };
    tasks.push(task.clone());
    save_tasks(store, site_id, tasks)?;

    tracing::info!(site_id, task_id = task.id, "task added");
    Ok(task)
}

/// Applies the patch as given, without reconciling status and progression.
pub fn update_task(
    store: &Store,
    site_id: RecordId,
    task_id: RecordId,
    patch: TaskPatch,
) -> Result<Option<PlanningTask>, error::ChantierError> {
    modify_task(store, site_id, task_id, |task| {
        if let Some(v) = patch.nom {
            task.nom = v;
        }
        if let Some(v) = patch.responsable {
            task.responsable = v;
        }
        if let Some(v) = patch.date_debut {
            task.date_debut = v;
        }
        if let Some(v) = patch.heures_homme {
            task.heures_homme = v;
        }
        if let Some(v) = patch.operateurs {
            task.operateurs = v;
        }
        if let Some(v) = patch.duree {
            task.duree = v;
        }
        if let Some(v) = patch.progression {
            task.progression = v;
        }
        if let Some(v) = patch.statut {
            task.statut = v;
        }
    })
}

/// Moves a task to `status`. `planifie` resets progression to 0 and `termine`
/// sets it to 100; `en-cours` keeps the recorded progression.
pub fn transition_task(
    store: &Store,
    site_id: RecordId,
    task_id: RecordId,
    status: TaskStatus,
) -> Result<Option<PlanningTask>, error::ChantierError> {
    modify_task(store, site_id, task_id, |task| {
        task.statut = status;
        match status {
            TaskStatus::Planifie => task.progression = 0,
            TaskStatus::Termine => task.progression = 100,
            TaskStatus::EnCours => {}
        }
    })
}

pub fn remove_task(
    store: &Store,
    site_id: RecordId,
    task_id: RecordId,
) -> Result<bool, error::ChantierError> {
    let mut tasks = tasks_for_update(store, site_id)?;
    let before = tasks.len();
    tasks.retain(|t| t.id != task_id);
    if tasks.len() == before {
        return Ok(false);
    }
    save_tasks(store, site_id, tasks)?;

    tracing::info!(site_id, task_id, "task removed");
    Ok(true)
}

fn modify_task<F>(
    store: &Store,
    site_id: RecordId,
    task_id: RecordId,
    f: F,
) -> Result<Option<PlanningTask>, error::ChantierError>
where
    F: FnOnce(&mut PlanningTask),
{
    let mut tasks = tasks_for_update(store, site_id)?;
    let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
        tracing::debug!(site_id, task_id, "task update skipped: not found");
        return Ok(None);
    };
    f(task);
    task.date_debut = time::normalize_date(&task.date_debut);
    let updated = task.clone();
    save_tasks(store, site_id, tasks)?;

    tracing::info!(site_id, task_id, statut = %updated.statut, "task updated");
    Ok(Some(updated))
}

/// Planned end: start date plus `duree` days.
pub fn task_end_date(task: &PlanningTask) -> Option<NaiveDate> {
    time::add_days(task.start_date()?, task.duree.max(0))
}

/// Latest planned end over the tasks that have a readable start date.
pub fn planned_end_date(tasks: &[PlanningTask]) -> Option<NaiveDate> {
    tasks.iter().filter_map(task_end_date).max()
}

pub fn status_counts(tasks: &[PlanningTask]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for task in tasks {
        match task.statut {
            TaskStatus::Planifie => counts.planifie += 1,
            TaskStatus::EnCours => counts.en_cours += 1,
            TaskStatus::Termine => counts.termine += 1,
        }
    }
    counts
}

/// Whole days from `now` until `end` (taken at 00:00 UTC), rounded up and
/// floored at zero, so an overdue site reports 0.
pub fn days_remaining(end: NaiveDate, now: DateTime<Utc>) -> i64 {
    let Some(end_midnight) = end.and_hms_opt(0, 0, 0) else {
        return 0;
    };
    let diff_ms = end_midnight.and_utc().timestamp_millis() - now.timestamp_millis();
    if diff_ms <= 0 {
        0
    } else {
        (diff_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }
}

// CLI types for clap integration
#[derive(clap::Args, Debug)]
pub struct PlanningCli {
    #[clap(subcommand)]
    pub command: PlanningCommand,
}

#[derive(clap::Subcommand, Debug)]
pub enum PlanningCommand {
    /// List the tasks of a site
    List {
        #[clap(long, value_parser = ids::parse_cli_id)]
        site: RecordId,
    },
    /// Append a task (status planifie, progression 0)
    Add {
        #[clap(long, value_parser = ids::parse_cli_id)]
        site: RecordId,
        #[clap(long)]
        nom: String,
        #[clap(long, default_value = "")]
        responsable: String,
        /// Start date (YYYY-MM-DD or RFC 3339)
        #[clap(long)]
        date_debut: String,
        #[clap(long, default_value_t = 0.0)]
        heures: f64,
        #[clap(long, default_value_t = 1)]
        operateurs: i64,
        /// Duration in days
        #[clap(long, default_value_t = 1)]
        duree: i64,
    },
    /// Edit task fields as given (no status/progression reconciliation)
    Edit {
        #[clap(long, value_parser = ids::parse_cli_id)]
        site: RecordId,
        #[clap(long, value_parser = ids::parse_cli_id)]
        task: RecordId,
        #[clap(long)]
        nom: Option<String>,
        #[clap(long)]
        responsable: Option<String>,
        #[clap(long)]
        date_debut: Option<String>,
        #[clap(long)]
        heures: Option<f64>,
        #[clap(long)]
        operateurs: Option<i64>,
        #[clap(long)]
        duree: Option<i64>,
        #[clap(long, allow_negative_numbers = true)]
        progression: Option<i64>,
        #[clap(long, value_enum)]
        statut: Option<TaskStatus>,
    },
    /// Move a task to a new status
    Status {
        #[clap(long, value_parser = ids::parse_cli_id)]
        site: RecordId,
        #[clap(long, value_parser = ids::parse_cli_id)]
        task: RecordId,
        #[clap(long, value_enum)]
        statut: TaskStatus,
    },
    /// Remove a task
    Remove {
        #[clap(long, value_parser = ids::parse_cli_id)]
        site: RecordId,
        #[clap(long, value_parser = ids::parse_cli_id)]
        task: RecordId,
    },
    /// Delete the whole planning of a site
    Clear {
        #[clap(long, value_parser = ids::parse_cli_id)]
        site: RecordId,
    },
}

fn print_task(task: &PlanningTask) {
    let end = task_end_date(task)
        .map(time::format_date)
        .unwrap_or_else(|| "?".to_string());
    println!(
        "{:>4}  {:<32}  {:<10} -> {:<10}  {:>7}h  {:>3}%  {}",
        task.id,
        output::compact_line(&task.nom, 32),
        task.date_debut,
        end,
        task.heures_homme,
        task.progression,
        task.statut
    );
}

fn task_not_found(site: RecordId, task: RecordId) -> error::ChantierError {
    error::ChantierError::NotFound(format!("task {} of site {}", task, site))
}

fn emit_task(task: &PlanningTask, verb: &str, format: OutputFormat) -> Result<(), error::ChantierError> {
    if format == OutputFormat::Json {
        output::print_json(task)?;
    } else {
        println!("✓ Task {}: {} (id: {}, {})", verb, task.nom, task.id, task.statut);
    }
    Ok(())
}

pub fn run_planning_cli(
    store: &Store,
    cli: PlanningCli,
    format: OutputFormat,
) -> Result<(), error::ChantierError> {
    match cli.command {
        PlanningCommand::List { site } => {
            let tasks = get_tasks(store, site);
            if format == OutputFormat::Json {
                output::print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("No tasks planned for site {}.", site);
            } else {
                for task in &tasks {
                    print_task(task);
                }
            }
        }
        PlanningCommand::Add {
            site,
            nom,
            responsable,
            date_debut,
            heures,
            operateurs,
            duree,
        } => {
            let input = TaskInput {
                nom,
                responsable,
                date_debut,
                heures_homme: heures,
                operateurs,
                duree,
            };
            let task = add_task(store, site, input)?;
            emit_task(&task, "added", format)?;
        }
        PlanningCommand::Edit {
            site,
            task,
            nom,
            responsable,
            date_debut,
            heures,
            operateurs,
            duree,
            progression,
            statut,
        } => {
            let patch = TaskPatch {
                nom,
                responsable,
                date_debut,
                heures_homme: heures,
                operateurs,
                duree,
                progression,
                statut,
            };
            let updated = update_task(store, site, task, patch)?
                .ok_or_else(|| task_not_found(site, task))?;
            emit_task(&updated, "updated", format)?;
        }
        PlanningCommand::Status { site, task, statut } => {
            let updated = transition_task(store, site, task, statut)?
                .ok_or_else(|| task_not_found(site, task))?;
            emit_task(&updated, "moved", format)?;
        }
        PlanningCommand::Remove { site, task } => {
            if !remove_task(store, site, task)? {
                return Err(task_not_found(site, task));
            }
            println!("✓ Task {} removed from site {}", task, site);
        }
        PlanningCommand::Clear { site } => {
            if delete_planning(store, site)? {
                println!("✓ Planning of site {} deleted", site);
            } else {
                println!("No planning recorded for site {}.", site);
            }
        }
    }

    Ok(())
}
