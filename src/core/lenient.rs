//! Lenient field readers for stored records.
//!
//! Records edited through forms carry numbers as text (`"50"`, `"12,5"`), and a
//! cleared field comes back as `null` or `""`. These serde helpers read all of
//! those so one sloppy field does not make a whole collection unreadable.
//! Text that is not a number at all is still an error.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

fn number_value<E: serde::de::Error>(raw: RawNumber) -> Result<Option<f64>, E> {
    let value = match raw {
        RawNumber::Int(v) => v as f64,
        RawNumber::Float(v) => v,
        RawNumber::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| E::custom(format!("not a number: {s:?}")))?
        }
    };
    Ok(value.is_finite().then_some(value))
}

/// `null`, `""` and non-finite values read as `None`.
pub fn optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawNumber>::deserialize(deserializer)? {
        Some(raw) => number_value(raw),
        None => Ok(None),
    }
}

/// Like [`optional_f64`], with absent values read as 0.
pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_f64(deserializer)?.unwrap_or(0.0))
}

/// Integer field; fractional input is rounded, absent values read as 0.
pub fn i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawNumber>::deserialize(deserializer)? {
        None => 0,
        Some(RawNumber::Int(v)) => v,
        Some(raw) => number_value::<D::Error>(raw)?.map_or(0, |v| v.round() as i64),
    })
}

/// Text field where `null` reads as empty.
pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
