//! Adhoc goal commands

use crate::app::AppState;
use crate::database::{AdhocGoal, CreateAdhocGoalRequest};
use crate::error::Result;

pub async fn create_adhoc_goal(
    state: &AppState,
    session_token: String,
    req: CreateAdhocGoalRequest,
) -> Result<AdhocGoal> {
    let owner = state.authenticate(&session_token).await?;
    state.adhoc_service.create_adhoc_goal(&owner, req).await
}

/// Adhoc goals planned for one ISO week
pub async fn list_adhoc_goals(
    state: &AppState,
    session_token: String,
    year: i32,
    week_number: i32,
) -> Result<Vec<AdhocGoal>> {
    let owner = state.authenticate(&session_token).await?;
    state
        .adhoc_service
        .list_for_week(&owner, year, week_number)
        .await
}

pub async fn set_adhoc_goal_complete(
    state: &AppState,
    session_token: String,
    id: String,
    is_complete: bool,
) -> Result<AdhocGoal> {
    let owner = state.authenticate(&session_token).await?;
    state
        .adhoc_service
        .set_complete(&owner, &id, is_complete)
        .await
}

pub async fn delete_adhoc_goal(state: &AppState, session_token: String, id: String) -> Result<()> {
    let owner = state.authenticate(&session_token).await?;
    state.adhoc_service.delete_adhoc_goal(&owner, &id).await
}
