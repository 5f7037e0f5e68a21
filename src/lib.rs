//! recdupe - Duplicate record detection with master selection.
//!
//! Groups flat key-value records (CSV or JSON) by an exact-match key built
//! from configured fields, selects a master per duplicate group by a
//! field-and-strategy rule, and reports the groups as text, JSON, or CSV.

pub mod app;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod loader;
pub mod logging;
pub mod output;
pub mod record;
pub mod web;

pub use app::run_app;
