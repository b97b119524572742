//! Goal log commands

use crate::app::AppState;
use crate::database::GoalLog;
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Append a log entry; `log_date` defaults to now
pub async fn create_goal_log(
    state: &AppState,
    session_token: String,
    goal_id: String,
    content: String,
    log_date: Option<DateTime<Utc>>,
) -> Result<GoalLog> {
    let owner = state.authenticate(&session_token).await?;
    state
        .logs_service
        .create_log(&owner, &goal_id, log_date.unwrap_or_else(Utc::now), &content)
        .await
}

pub async fn update_goal_log(
    state: &AppState,
    session_token: String,
    id: String,
    content: Option<String>,
    log_date: Option<DateTime<Utc>>,
) -> Result<GoalLog> {
    let owner = state.authenticate(&session_token).await?;
    state
        .logs_service
        .update_log(&owner, &id, content.as_deref(), log_date)
        .await
}

pub async fn delete_goal_log(state: &AppState, session_token: String, id: String) -> Result<()> {
    let owner = state.authenticate(&session_token).await?;
    state.logs_service.delete_log(&owner, &id).await
}

/// Logs of one goal instance, or of its whole carry-over lineage
pub async fn list_goal_logs(
    state: &AppState,
    session_token: String,
    goal_id: String,
    whole_lineage: bool,
) -> Result<Vec<GoalLog>> {
    let owner = state.authenticate(&session_token).await?;

    if whole_lineage {
        state
            .logs_service
            .list_logs_for_lineage(&owner, &goal_id)
            .await
    } else {
        state.logs_service.list_logs_for_goal(&owner, &goal_id).await
    }
}
