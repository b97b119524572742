//! Services module
//!
//! Business logic services that coordinate between commands and repository.

pub mod adhoc;
pub mod goals;
pub mod logs;
pub mod migration;
pub mod sessions;
pub mod settings;
pub mod status;

pub use adhoc::AdhocService;
pub use goals::GoalsService;
pub use logs::GoalLogsService;
pub use migration::{MaxWeekScan, MigrationReport, MigrationService};
pub use sessions::SessionService;
pub use settings::{AppSettings, SettingsService};
pub use status::StatusService;
