//! Core modules shared by every subsystem.
//!
//! Errors, the record store and its substrates, configuration, logging and
//! date helpers live here.

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod lenient;
pub mod logging;
pub mod output;
pub mod schemas;
pub mod seed;
pub mod store;
pub mod time;
