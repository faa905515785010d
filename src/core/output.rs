//! Output rendering helpers for CLI surfaces.
//!
//! Keeps table cells bounded and readable; JSON output is pretty-printed.

use crate::core::error::ChantierError;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), ChantierError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Renders an optional ratio, `n/a` when undefined.
pub fn ratio_or_na(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

/// Plain amount rendering with two decimals. Locale-aware currency formatting is
/// left to presentation layers.
pub fn amount(value: f64) -> String {
    format!("{:.2}", value)
}
