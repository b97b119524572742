//! Migration commands
//!
//! Max-week scan and "pull goals from last period".

use crate::app::AppState;
use crate::error::Result;
use crate::period::Period;
use crate::services::{MaxWeekScan, MigrationReport};

/// Last week with recorded state for any weekly child of a quarterly goal
pub async fn find_max_week_for_quarterly_goal(
    state: &AppState,
    session_token: String,
    quarterly_goal_id: String,
    period: Period,
) -> Result<MaxWeekScan> {
    let owner = state.authenticate(&session_token).await?;
    state
        .migration_service
        .find_max_week_for_quarterly_goal(&owner, &quarterly_goal_id, period)
        .await
}

/// Preview (`dry_run = true`) or commit copying open goals from `source`
/// into `destination`
pub async fn preview_or_commit_migration(
    state: &AppState,
    session_token: String,
    source: Period,
    destination: Period,
    dry_run: bool,
) -> Result<MigrationReport> {
    let owner = state.authenticate(&session_token).await?;
    state
        .migration_service
        .preview_or_commit(&owner, source, destination, dry_run)
        .await
}
