//! Team repository: CRUD over team members.
//!
//! Members are referenced from sites and tasks by name or role text only. No
//! referential check runs between the team and the other collections.

use crate::core::error;
use crate::core::ids::{self, RecordId};
use crate::core::lenient;
use crate::core::output::{self, OutputFormat};
use crate::core::schemas;
use crate::core::store::Store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Open set of roles. Unknown labels are kept verbatim; a missing role reads
/// as an empty label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Role {
    ChefChantier,
    ChefEquipe,
    ConducteurTravaux,
    Operateur,
    Hse,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::ChefChantier => "chef-chantier",
            Role::ChefEquipe => "chef-equipe",
            Role::ConducteurTravaux => "conducteur-travaux",
            Role::Operateur => "operateur",
            Role::Hse => "hse",
            Role::Other(label) => label,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "chef-chantier" => Role::ChefChantier,
            "chef-equipe" => Role::ChefEquipe,
            "conducteur-travaux" => Role::ConducteurTravaux,
            "operateur" => Role::Operateur,
            "hse" => Role::Hse,
            _ => Role::Other(raw),
        }
    }
}

impl From<Option<String>> for Role {
    fn from(raw: Option<String>) -> Self {
        Role::from(raw.unwrap_or_default())
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Other(String::new())
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Role::from(raw.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipeMember {
    #[serde(deserialize_with = "ids::deserialize_lenient")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
}

impl EquipeMember {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct MemberInput {
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct MemberPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

pub fn list_members(store: &Store) -> Vec<EquipeMember> {
    store.read(schemas::TEAM_KEY)
}

fn load_members_for_update(store: &Store) -> Result<Vec<EquipeMember>, error::ChantierError> {
    store.read_for_update(schemas::TEAM_KEY)
}

fn save_members(store: &Store, members: &[EquipeMember]) -> Result<(), error::ChantierError> {
    store.write(schemas::TEAM_KEY, members)
}

pub fn get_member(store: &Store, id: RecordId) -> Option<EquipeMember> {
    list_members(store).into_iter().find(|m| m.id == id)
}

pub fn create_member(
    store: &Store,
    input: MemberInput,
) -> Result<EquipeMember, error::ChantierError> {
    let mut members = load_members_for_update(store)?;
    let member = EquipeMember {
        id: ids::next_sequential_id(members.iter().map(|m| m.id))?,
        first_name: input.first_name,
        last_name: input.last_name,
        role: input.role,
    };
    members.push(member.clone());
    save_members(store, &members)?;

    tracing::info!(member_id = member.id, role = %member.role, "team member created");
    Ok(member)
}

pub fn update_member(
    store: &Store,
    id: RecordId,
    patch: MemberPatch,
) -> Result<Option<EquipeMember>, error::ChantierError> {
    let mut members = load_members_for_update(store)?;
    let Some(member) = members.iter_mut().find(|m| m.id == id) else {
        return Ok(None);
    };
    if let Some(v) = patch.first_name {
        member.first_name = v;
    }
    if let Some(v) = patch.last_name {
        member.last_name = v;
    }
    if let Some(v) = patch.role {
        member.role = v;
    }
    let updated = member.clone();
    save_members(store, &members)?;

    tracing::info!(member_id = id, "team member updated");
    Ok(Some(updated))
}

pub fn remove_member(store: &Store, id: RecordId) -> Result<bool, error::ChantierError> {
    let mut members = load_members_for_update(store)?;
    let before = members.len();
    members.retain(|m| m.id != id);
    if members.len() == before {
        return Ok(false);
    }
    save_members(store, &members)?;

    tracing::info!(member_id = id, "team member removed");
    Ok(true)
}

/// Members grouped by role label, for display.
pub fn members_by_role(store: &Store) -> BTreeMap<String, Vec<EquipeMember>> {
    let mut grouped: BTreeMap<String, Vec<EquipeMember>> = BTreeMap::new();
    for member in list_members(store) {
        grouped
            .entry(member.role.as_str().to_string())
            .or_default()
            .push(member);
    }
    grouped
}

// CLI types for clap integration
#[derive(clap::Args, Debug)]
pub struct TeamCli {
    #[clap(subcommand)]
    pub command: TeamCommand,
}

#[derive(clap::Subcommand, Debug)]
pub enum TeamCommand {
    /// List team members grouped by role
    List,
    /// Add a team member
    Add {
        #[clap(long)]
        first_name: String,
        #[clap(long)]
        last_name: String,
        /// Role label (chef-chantier, chef-equipe, conducteur-travaux, operateur, hse, ...)
        #[clap(long)]
        role: String,
    },
    /// Update a team member
    Edit {
        #[clap(long, value_parser = ids::parse_cli_id)]
        id: RecordId,
        #[clap(long)]
        first_name: Option<String>,
        #[clap(long)]
        last_name: Option<String>,
        #[clap(long)]
        role: Option<String>,
    },
    /// Remove a team member
    Remove {
        #[clap(long, value_parser = ids::parse_cli_id)]
        id: RecordId,
    },
}

pub fn run_team_cli(
    store: &Store,
    cli: TeamCli,
    format: OutputFormat,
) -> Result<(), error::ChantierError> {
    match cli.command {
        TeamCommand::List => {
            if format == OutputFormat::Json {
                output::print_json(&list_members(store))?;
                return Ok(());
            }
            let grouped = members_by_role(store);
            if grouped.is_empty() {
                println!("No team members recorded yet.");
            }
            for (role, members) in grouped {
                println!("\n[{}]", role);
                for m in members {
                    println!("  {:>4}  {}", m.id, m.full_name());
                }
            }
        }
        TeamCommand::Add {
            first_name,
            last_name,
            role,
        } => {
            let member = create_member(
                store,
                MemberInput {
                    first_name,
                    last_name,
                    role: Role::from(role),
                },
            )?;
            if format == OutputFormat::Json {
                output::print_json(&member)?;
            } else {
                println!("✓ Member added: {} (id: {})", member.full_name(), member.id);
            }
        }
        TeamCommand::Edit {
            id,
            first_name,
            last_name,
            role,
        } => {
            let patch = MemberPatch {
                first_name,
                last_name,
                role: role.map(Role::from),
            };
            let member = update_member(store, id, patch)?
                .ok_or_else(|| error::ChantierError::NotFound(format!("team member {}", id)))?;
            if format == OutputFormat::Json {
                output::print_json(&member)?;
            } else {
                println!("✓ Member updated: {} (id: {})", member.full_name(), member.id);
            }
        }
        TeamCommand::Remove { id } => {
            if !remove_member(store, id)? {
                return Err(error::ChantierError::NotFound(format!("team member {}", id)));
            }
            println!("✓ Team member {} removed", id);
        }
    }

    Ok(())
}
