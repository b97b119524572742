//! Fire and pending status commands

use crate::app::AppState;
use crate::database::{FireGoal, PendingGoal};
use crate::error::Result;

/// Mark a goal pending; a goal on fire stops being on fire
pub async fn set_pending_status(
    state: &AppState,
    session_token: String,
    goal_id: String,
    description: String,
) -> Result<PendingGoal> {
    let owner = state.authenticate(&session_token).await?;
    state
        .status_service
        .set_pending(&owner, &goal_id, &description)
        .await
}

/// Take a goal out of pending; it comes back on fire
pub async fn clear_pending_status(
    state: &AppState,
    session_token: String,
    goal_id: String,
) -> Result<()> {
    let owner = state.authenticate(&session_token).await?;
    state.status_service.clear_pending(&owner, &goal_id).await
}

/// Flip the fire flag, returning the new value
pub async fn toggle_fire_status(
    state: &AppState,
    session_token: String,
    goal_id: String,
) -> Result<bool> {
    let owner = state.authenticate(&session_token).await?;
    state.status_service.toggle_fire(&owner, &goal_id).await
}

pub async fn list_fire_goals(state: &AppState, session_token: String) -> Result<Vec<FireGoal>> {
    let owner = state.authenticate(&session_token).await?;
    state.status_service.list_fire_goals(&owner).await
}

pub async fn list_pending_goals(
    state: &AppState,
    session_token: String,
) -> Result<Vec<PendingGoal>> {
    let owner = state.authenticate(&session_token).await?;
    state.status_service.list_pending_goals(&owner).await
}
