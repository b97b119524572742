//! goalflow library
//!
//! Goal hierarchy and carry-over engine: quarterly, weekly and daily goals
//! stored in SQLite, lineage tracking across periods, period-to-period
//! migration and the fire/pending status flags.

pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod hierarchy;
pub mod period;
pub mod services;
