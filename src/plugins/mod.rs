//! Domain subsystems built on the record store.
//!
//! - `sites`, `team`, `planning`: repositories over the three record keys.
//! - `metrics`: earned-value derivations (no storage access).
//! - `consistency`: report-only data checks.
//! - `overview`: sites joined with planning and metrics for dashboards.

pub mod consistency;
pub mod metrics;
pub mod overview;
pub mod planning;
pub mod sites;
pub mod team;
