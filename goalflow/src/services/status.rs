//! Status flag service
//!
//! Fire (urgent) and pending (blocked, with a reason) markers per goal.
//! Marking a goal pending puts out its fire; clearing pending sets it on
//! fire again.

use crate::config::MAX_PENDING_DESCRIPTION_LENGTH;
use crate::database::{FireGoal, PendingGoal, Repository};
use crate::error::{AppError, Result};

/// Service coordinating the fire and pending flags
#[derive(Clone)]
pub struct StatusService {
    repo: Repository,
}

impl StatusService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Mark a goal pending with `description`, removing any fire marker
    pub async fn set_pending(
        &self,
        user_id: &str,
        goal_id: &str,
        description: &str,
    ) -> Result<PendingGoal> {
        self.repo.get_owned_goal(user_id, goal_id).await?;

        let description = description.trim();
        if description.chars().count() > MAX_PENDING_DESCRIPTION_LENGTH {
            return Err(AppError::InvalidArgument(format!(
                "pending description exceeds {} characters",
                MAX_PENDING_DESCRIPTION_LENGTH
            )));
        }

        tracing::info!("Marking goal {} pending", goal_id);
        self.repo.set_pending(user_id, goal_id, description).await
    }

    /// Remove the pending marker.
    ///
    /// The goal comes out of pending on fire, whether or not it was on fire
    /// before it went pending.
    // TODO: confirm with product whether clearing pending should re-arm fire
    pub async fn clear_pending(&self, user_id: &str, goal_id: &str) -> Result<()> {
        self.repo.get_owned_goal(user_id, goal_id).await?;

        tracing::info!("Clearing pending status of goal {}", goal_id);
        self.repo.clear_pending(user_id, goal_id).await
    }

    /// Flip the fire marker; returns whether the goal is now on fire
    pub async fn toggle_fire(&self, user_id: &str, goal_id: &str) -> Result<bool> {
        self.repo.get_owned_goal(user_id, goal_id).await?;

        let on_fire = self.repo.toggle_fire(user_id, goal_id).await?;
        tracing::info!("Goal {} on fire: {}", goal_id, on_fire);

        Ok(on_fire)
    }

    pub async fn is_on_fire(&self, user_id: &str, goal_id: &str) -> Result<bool> {
        self.repo.is_on_fire(user_id, goal_id).await
    }

    pub async fn get_pending(&self, user_id: &str, goal_id: &str) -> Result<Option<PendingGoal>> {
        self.repo.get_pending(user_id, goal_id).await
    }

    pub async fn list_fire_goals(&self, user_id: &str) -> Result<Vec<FireGoal>> {
        self.repo.list_fire_goals(user_id).await
    }

    pub async fn list_pending_goals(&self, user_id: &str) -> Result<Vec<PendingGoal>> {
        self.repo.list_pending_goals(user_id).await
    }
}
