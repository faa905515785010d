//! Record identifier normalization.
//!
//! Ids are canonical `i64` values. Stored records and command-line input may
//! carry them as numeric strings; both forms normalize here so lookups compare
//! integers only.

use crate::core::error;
use serde::{Deserialize, Deserializer};

pub type RecordId = i64;

/// Parses an id given as text (`"1661346000001"`, `" 42 "`).
pub fn parse_id(raw: &str) -> Option<RecordId> {
    raw.trim().parse::<RecordId>().ok()
}

/// `clap` value parser for ids given on the command line.
pub fn parse_cli_id(raw: &str) -> Result<RecordId, String> {
    parse_id(raw).ok_or_else(|| format!("invalid record id: {raw:?}"))
}

/// Planning map key for a site id.
pub fn planning_key(site_id: RecordId) -> String {
    site_id.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Serde helper accepting an integer, an integral float or a numeric string.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<RecordId, D::Error>
where
    D: Deserializer<'de>,
{
    match RawId::deserialize(deserializer)? {
        RawId::Int(v) => Ok(v),
        RawId::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        RawId::Float(v) => Err(serde::de::Error::custom(format!(
            "record id must be integral, got {v}"
        ))),
        RawId::Text(s) => parse_id(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("record id is not numeric: {s:?}"))),
    }
}

fn id_after(max: RecordId) -> Result<RecordId, error::ChantierError> {
    max.checked_add(1).ok_or_else(|| {
        error::ChantierError::ValidationError(format!("no record id left after {max}"))
    })
}

/// Next id after the largest one in use, starting at 1.
pub fn next_sequential_id<I>(existing: I) -> Result<RecordId, error::ChantierError>
where
    I: IntoIterator<Item = RecordId>,
{
    match existing.into_iter().max() {
        Some(max) => id_after(max),
        None => Ok(1),
    }
}

/// Time-based id (unix milliseconds), bumped past every id in use.
pub fn next_time_based_id<I>(existing: I, now_millis: i64) -> Result<RecordId, error::ChantierError>
where
    I: IntoIterator<Item = RecordId>,
{
    match existing.into_iter().max() {
        Some(max) if max >= now_millis => id_after(max),
        _ => Ok(now_millis),
    }
}
