//! Goal-related commands
//!
//! Tree view, goal CRUD, per-week star/pin and carry-over.

use crate::app::AppState;
use crate::database::{CreateGoalRequest, Goal, UpdateGoalRequest, WeeklyGoalState};
use crate::error::Result;
use crate::hierarchy::NestedGoal;
use crate::period::Period;

/// Goals of a period as a tree, with each goal's state for `week_number`
pub async fn get_goal_tree(
    state: &AppState,
    session_token: String,
    period: Period,
    week_number: i32,
) -> Result<Vec<NestedGoal<Option<WeeklyGoalState>>>> {
    let owner = state.authenticate(&session_token).await?;
    state
        .goals_service
        .get_goal_tree(&owner, period, week_number)
        .await
}

/// Create a goal
pub async fn create_goal(
    state: &AppState,
    session_token: String,
    req: CreateGoalRequest,
) -> Result<Goal> {
    let owner = state.authenticate(&session_token).await?;
    state.goals_service.create_goal(&owner, req).await
}

/// Get a goal by ID
pub async fn get_goal(state: &AppState, session_token: String, id: String) -> Result<Goal> {
    let owner = state.authenticate(&session_token).await?;
    state.goals_service.get_goal(&owner, &id).await
}

/// Every period instance of a goal
pub async fn list_goal_lineage(
    state: &AppState,
    session_token: String,
    id: String,
) -> Result<Vec<Goal>> {
    let owner = state.authenticate(&session_token).await?;
    state.goals_service.list_lineage(&owner, &id).await
}

/// Update title and/or details
pub async fn update_goal(
    state: &AppState,
    session_token: String,
    req: UpdateGoalRequest,
) -> Result<Goal> {
    let owner = state.authenticate(&session_token).await?;
    state.goals_service.update_goal(&owner, req).await
}

pub async fn set_goal_complete(
    state: &AppState,
    session_token: String,
    id: String,
    is_complete: bool,
) -> Result<Goal> {
    let owner = state.authenticate(&session_token).await?;
    state
        .goals_service
        .set_complete(&owner, &id, is_complete)
        .await
}

/// Delete a goal together with its children
pub async fn delete_goal(state: &AppState, session_token: String, id: String) -> Result<()> {
    let owner = state.authenticate(&session_token).await?;
    state.goals_service.delete_goal(&owner, &id).await
}

/// Star or pin a goal for one week
pub async fn update_week_state(
    state: &AppState,
    session_token: String,
    goal_id: String,
    week_number: i32,
    is_starred: Option<bool>,
    is_pinned: Option<bool>,
) -> Result<WeeklyGoalState> {
    let owner = state.authenticate(&session_token).await?;
    state
        .goals_service
        .update_week_state(&owner, &goal_id, week_number, is_starred, is_pinned)
        .await
}

/// Copy a goal into `destination`, under `parent_id` when given.
///
/// Without a parent the copy is a quarterly goal; otherwise it sits one
/// level below the parent, which must already live in `destination`.
pub async fn create_carried_over_goal(
    state: &AppState,
    session_token: String,
    source_goal_id: String,
    destination: Period,
    parent_id: Option<String>,
) -> Result<String> {
    let owner = state.authenticate(&session_token).await?;
    state
        .goals_service
        .carry_over_goal(&owner, &source_goal_id, destination, parent_id.as_deref())
        .await
}
