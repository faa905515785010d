//! Sample records written on first use of an empty store.

use crate::core::schemas;
use serde_json::{Value as JsonValue, json};

pub const SEED_SITE_LYON: i64 = 1661346000001;
pub const SEED_SITE_LA_CIOTAT: i64 = 1661346000002;

pub fn seed_value(key: &str) -> Option<JsonValue> {
    match key {
        schemas::SITES_KEY => Some(seed_sites()),
        schemas::TEAM_KEY => Some(seed_team()),
        schemas::PLANNING_KEY => Some(seed_planning()),
        _ => None,
    }
}

fn seed_sites() -> JsonValue {
    json!([
        {
            "id": SEED_SITE_LYON,
            "name": "Rénovation Usine Lyon",
            "budgetInitialHeures": 250,
            "devisValide": 55000,
            "budgetMO": 24000,
            "budgetFournitures": 12000,
            "budgetLocations": 3000,
            "budgetST": 0
        },
        {
            "id": SEED_SITE_LA_CIOTAT,
            "name": "Chantier Naval - La Ciotat",
            "budgetInitialHeures": 1800,
            "devisValide": 210000,
            "budgetMO": 90000,
            "budgetFournitures": 40000,
            "budgetLocations": 15000,
            "budgetST": 25000
        }
    ])
}

fn seed_team() -> JsonValue {
    json!([
        { "id": 1, "firstName": "Farid", "lastName": "MESSAL", "role": "chef-chantier" },
        { "id": 2, "firstName": "Loic", "lastName": "ANTUNEZ", "role": "chef-equipe" }
    ])
}

fn seed_planning() -> JsonValue {
    json!({
        (SEED_SITE_LYON.to_string()): [
            {
                "id": 1,
                "nom": "Démarrage & Préparation",
                "responsable": "Conducteur de travaux",
                "dateDebut": "2025-08-21",
                "heuresHomme": 42.5,
                "operateurs": 1,
                "duree": 5,
                "progression": 100,
                "statut": "termine"
            },
            {
                "id": 2,
                "nom": "Sablage Zone A",
                "responsable": "Equipe operateurs",
                "dateDebut": "2025-08-28",
                "heuresHomme": 119,
                "operateurs": 2,
                "duree": 7,
                "progression": 50,
                "statut": "en-cours"
            },
            {
                "id": 3,
                "nom": "Peinture Zone A",
                "responsable": "Chef atelier St Maurice",
                "dateDebut": "2025-09-08",
                "heuresHomme": 85,
                "operateurs": 1,
                "duree": 10,
                "progression": 0,
                "statut": "planifie"
            }
        ]
    })
}
