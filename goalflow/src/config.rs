//! Engine configuration constants
//!
//! Central location for resource limits and validation boundaries
//! used throughout the engine.

// ===== Database =====

/// Default database file name inside the data directory
pub const DEFAULT_DATABASE_FILE: &str = "goalflow.db";

/// Settings file name inside the data directory
pub const SETTINGS_FILE: &str = "settings.json";

/// Connections in the application pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a writer waits on a locked database before failing, in seconds
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

// ===== Goal Hierarchy =====

/// Deepest level of the quarterly/weekly/daily tree
pub const MAX_GOAL_DEPTH: i64 = 2;

/// Materialized path stored on quarterly goals
pub const ROOT_PATH: &str = "/";

/// Maximum length of a goal title in characters
pub const MAX_TITLE_LENGTH: usize = 500;

// ===== Periods =====

/// Earliest year accepted for a period
pub const MIN_PERIOD_YEAR: i32 = 1970;

/// Latest year accepted for a period
pub const MAX_PERIOD_YEAR: i32 = 9999;

// ===== Logs and Flags =====

/// Maximum length of a goal log entry in characters
pub const MAX_LOG_CONTENT_LENGTH: usize = 10_000;

/// Maximum length of a pending-status description in characters
pub const MAX_PENDING_DESCRIPTION_LENGTH: usize = 1_000;

// ===== Sessions =====

/// Lifetime of a freshly created session, in days
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;
