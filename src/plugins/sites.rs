//! Site repository: CRUD over construction-site ("chantier") records.
//!
//! Every mutation reads the full `sites` collection, edits it in memory and
//! writes it back. There is a single writer per store, so no locking is done.

use crate::core::error;
use crate::core::ids::{self, RecordId};
use crate::core::lenient;
use crate::core::output::{self, OutputFormat};
use crate::core::schemas;
use crate::core::store::Store;
use crate::core::time;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chantier {
    #[serde(deserialize_with = "ids::deserialize_lenient")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub budget_initial_heures: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub devis_valide: f64,
    #[serde(default, rename = "budgetMO", deserialize_with = "lenient::f64_or_zero")]
    pub budget_mo: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub budget_fournitures: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub budget_locations: f64,
    #[serde(default, rename = "budgetST", deserialize_with = "lenient::f64_or_zero")]
    pub budget_st: f64,
    /// Actual cost booked so far, when tracked.
    #[serde(
        default,
        deserialize_with = "lenient::optional_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub cout_reel: Option<f64>,
    /// Planned end date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_fin: Option<String>,
}

impl Chantier {
    /// Labor + supplies + rentals + subcontracting.
    pub fn category_budget_total(&self) -> f64 {
        self.budget_mo + self.budget_fournitures + self.budget_locations + self.budget_st
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInput {
    pub name: String,
    pub budget_initial_heures: f64,
    pub devis_valide: f64,
    #[serde(rename = "budgetMO")]
    pub budget_mo: f64,
    pub budget_fournitures: f64,
    pub budget_locations: f64,
    #[serde(rename = "budgetST")]
    pub budget_st: f64,
    pub cout_reel: Option<f64>,
    pub date_fin: Option<String>,
}

/// Partial update. `None` leaves the field as it is; the id is never patchable.
#[derive(Debug, Clone, Default)]
pub struct SitePatch {
    pub name: Option<String>,
    pub budget_initial_heures: Option<f64>,
    pub devis_valide: Option<f64>,
    pub budget_mo: Option<f64>,
    pub budget_fournitures: Option<f64>,
    pub budget_locations: Option<f64>,
    pub budget_st: Option<f64>,
    pub cout_reel: Option<f64>,
    pub date_fin: Option<String>,
}

impl SitePatch {
    fn apply(self, site: &mut Chantier) {
        if let Some(v) = self.name {
            site.name = v;
        }
        if let Some(v) = self.budget_initial_heures {
            site.budget_initial_heures = v;
        }
        if let Some(v) = self.devis_valide {
            site.devis_valide = v;
        }
        if let Some(v) = self.budget_mo {
            site.budget_mo = v;
        }
        if let Some(v) = self.budget_fournitures {
            site.budget_fournitures = v;
        }
        if let Some(v) = self.budget_locations {
            site.budget_locations = v;
        }
        if let Some(v) = self.budget_st {
            site.budget_st = v;
        }
        if let Some(v) = self.cout_reel {
            site.cout_reel = Some(v);
        }
        if let Some(v) = self.date_fin {
            site.date_fin = Some(time::normalize_date(&v));
        }
    }
}

pub fn list_sites(store: &Store) -> Vec<Chantier> {
    store.read(schemas::SITES_KEY)
}

/// Collection as stored, for a read-modify-write. Fails rather than default.
fn load_sites_for_update(store: &Store) -> Result<Vec<Chantier>, error::ChantierError> {
    store.read_for_update(schemas::SITES_KEY)
}

fn save_sites(store: &Store, sites: &[Chantier]) -> Result<(), error::ChantierError> {
    store.write(schemas::SITES_KEY, sites)
}

pub fn get_site(store: &Store, id: RecordId) -> Option<Chantier> {
    list_sites(store).into_iter().find(|s| s.id == id)
}

pub fn create_site(store: &Store, input: SiteInput) -> Result<Chantier, error::ChantierError> {
    let mut sites = load_sites_for_update(store)?;
    let id = ids::next_time_based_id(sites.iter().map(|s| s.id), time::now_millis())?;

    let site = Chantier {
        id,
        name: input.name,
        budget_initial_heures: input.budget_initial_heures,
        devis_valide: input.devis_valide,
        budget_mo: input.budget_mo,
        budget_fournitures: input.budget_fournitures,
        budget_locations: input.budget_locations,
        budget_st: input.budget_st,
        cout_reel: input.cout_reel,
        date_fin: input.date_fin.as_deref().map(time::normalize_date),
    };
    sites.push(site.clone());
    save_sites(store, &sites)?;

    tracing::info!(site_id = id, name = %site.name, "site created");
    Ok(site)
}

/// Returns the updated site, or `None` when no site has this id.
pub fn update_site(
    store: &Store,
    id: RecordId,
    patch: SitePatch,
) -> Result<Option<Chantier>, error::ChantierError> {
    let mut sites = load_sites_for_update(store)?;
    let Some(site) = sites.iter_mut().find(|s| s.id == id) else {
        tracing::debug!(site_id = id, "site update skipped: not found");
        return Ok(None);
    };
    patch.apply(site);
    let updated = site.clone();
    save_sites(store, &sites)?;

    tracing::info!(site_id = id, "site updated");
    Ok(Some(updated))
}

/// Removes the site. Its planning list, if any, is left in place.
pub fn remove_site(store: &Store, id: RecordId) -> Result<bool, error::ChantierError> {
    let mut sites = load_sites_for_update(store)?;
    let before = sites.len();
    sites.retain(|s| s.id != id);
    if sites.len() == before {
        return Ok(false);
    }
    save_sites(store, &sites)?;

    tracing::info!(site_id = id, "site removed");
    Ok(true)
}

// CLI types for clap integration
#[derive(clap::Args, Debug)]
pub struct SiteCli {
    #[clap(subcommand)]
    pub command: SiteCommand,
}

#[derive(clap::Args, Debug, Default)]
pub struct SiteFields {
    /// Planned labor hours
    #[clap(long)]
    pub heures: Option<f64>,
    /// Approved quote amount
    #[clap(long)]
    pub devis: Option<f64>,
    /// Labor budget
    #[clap(long)]
    pub mo: Option<f64>,
    /// Supplies budget
    #[clap(long)]
    pub fournitures: Option<f64>,
    /// Rentals budget
    #[clap(long)]
    pub locations: Option<f64>,
    /// Subcontracting budget
    #[clap(long)]
    pub st: Option<f64>,
    /// Actual cost booked to date
    #[clap(long)]
    pub cout_reel: Option<f64>,
    /// Planned end date (YYYY-MM-DD)
    #[clap(long)]
    pub date_fin: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
pub enum SiteCommand {
    /// List all sites
    List,
    /// Show one site
    Get {
        #[clap(long, value_parser = ids::parse_cli_id)]
        id: RecordId,
    },
    /// Create a site
    Add {
        #[clap(long)]
        name: String,
        #[clap(flatten)]
        fields: SiteFields,
    },
    /// Update fields of a site
    Edit {
        #[clap(long, value_parser = ids::parse_cli_id)]
        id: RecordId,
        #[clap(long)]
        name: Option<String>,
        #[clap(flatten)]
        fields: SiteFields,
    },
    /// Remove a site (its planning is kept unless cleared)
    Remove {
        #[clap(long, value_parser = ids::parse_cli_id)]
        id: RecordId,
    },
}

fn print_site(site: &Chantier) {
    println!("{} [{}]", site.name, site.id);
    println!(
        "  devis: {} | heures: {} | MO: {} | fournitures: {} | locations: {} | ST: {}",
        output::amount(site.devis_valide),
        site.budget_initial_heures,
        output::amount(site.budget_mo),
        output::amount(site.budget_fournitures),
        output::amount(site.budget_locations),
        output::amount(site.budget_st)
    );
    if let Some(cost) = site.cout_reel {
        println!("  coût réel: {}", output::amount(cost));
    }
    if let Some(end) = &site.date_fin {
        println!("  fin prévue: {}", end);
    }
}

pub fn run_site_cli(
    store: &Store,
    cli: SiteCli,
    format: OutputFormat,
) -> Result<(), error::ChantierError> {
    match cli.command {
        SiteCommand::List => {
            let sites = list_sites(store);
            if format == OutputFormat::Json {
                output::print_json(&sites)?;
            } else if sites.is_empty() {
                println!("No sites recorded yet.");
            } else {
                for site in &sites {
                    println!(
                        "{:>15}  {:<40}  devis {}",
                        site.id,
                        output::compact_line(&site.name, 40),
                        output::amount(site.devis_valide)
                    );
                }
            }
        }
        SiteCommand::Get { id } => {
            let site = get_site(store, id)
                .ok_or_else(|| error::ChantierError::NotFound(format!("site {}", id)))?;
            if format == OutputFormat::Json {
                output::print_json(&site)?;
            } else {
                print_site(&site);
            }
        }
        SiteCommand::Add { name, fields } => {
            let input = SiteInput {
                name,
                budget_initial_heures: fields.heures.unwrap_or_default(),
                devis_valide: fields.devis.unwrap_or_default(),
                budget_mo: fields.mo.unwrap_or_default(),
                budget_fournitures: fields.fournitures.unwrap_or_default(),
                budget_locations: fields.locations.unwrap_or_default(),
                budget_st: fields.st.unwrap_or_default(),
                cout_reel: fields.cout_reel,
                date_fin: fields.date_fin,
            };
            let site = create_site(store, input)?;
            if format == OutputFormat::Json {
                output::print_json(&site)?;
            } else {
                println!("✓ Site created: {} (id: {})", site.name, site.id);
            }
        }
        SiteCommand::Edit { id, name, fields } => {
            let patch = SitePatch {
                name,
                budget_initial_heures: fields.heures,
                devis_valide: fields.devis,
                budget_mo: fields.mo,
                budget_fournitures: fields.fournitures,
                budget_locations: fields.locations,
                budget_st: fields.st,
                cout_reel: fields.cout_reel,
                date_fin: fields.date_fin,
            };
            let site = update_site(store, id, patch)?
                .ok_or_else(|| error::ChantierError::NotFound(format!("site {}", id)))?;
            if format == OutputFormat::Json {
                output::print_json(&site)?;
            } else {
                println!("✓ Site updated: {} (id: {})", site.name, site.id);
            }
        }
        SiteCommand::Remove { id } => {
            if !remove_site(store, id)? {
                return Err(error::ChantierError::NotFound(format!("site {}", id)));
            }
            println!("✓ Site {} removed", id);
        }
    }

    Ok(())
}
