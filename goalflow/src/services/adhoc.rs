//! Adhoc goals service
//!
//! Tasks planned against a week (and optionally a day) rather than a
//! position in the quarterly tree.

use crate::config::{MAX_PERIOD_YEAR, MIN_PERIOD_YEAR, MAX_TITLE_LENGTH};
use crate::database::{AdhocGoal, CreateAdhocGoalRequest, Repository};
use crate::error::{AppError, Result};
use crate::period::weekday_from_number;

/// Service for managing adhoc goals
#[derive(Clone)]
pub struct AdhocService {
    repo: Repository,
}

impl AdhocService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn create_adhoc_goal(
        &self,
        user_id: &str,
        req: CreateAdhocGoalRequest,
    ) -> Result<AdhocGoal> {
        let req = validate(req)?;

        tracing::info!("Creating adhoc goal in week {}: {}", req.week_number, req.title);
        let goal = self.repo.create_adhoc_goal(user_id, &req, None).await?;
        tracing::info!("Adhoc goal created successfully: {}", goal.id);

        Ok(goal)
    }

    pub async fn list_for_week(
        &self,
        user_id: &str,
        year: i32,
        week_number: i32,
    ) -> Result<Vec<AdhocGoal>> {
        self.repo
            .list_adhoc_goals_for_week(user_id, year, week_number)
            .await
    }

    pub async fn set_complete(
        &self,
        user_id: &str,
        id: &str,
        is_complete: bool,
    ) -> Result<AdhocGoal> {
        self.repo.get_owned_adhoc_goal(user_id, id).await?;

        tracing::info!("Setting adhoc goal {} complete = {}", id, is_complete);
        self.repo.set_adhoc_goal_complete(id, is_complete).await
    }

    pub async fn delete_adhoc_goal(&self, user_id: &str, id: &str) -> Result<()> {
        self.repo.get_owned_adhoc_goal(user_id, id).await?;

        tracing::info!("Deleting adhoc goal: {}", id);
        self.repo.delete_adhoc_goal(id).await
    }
}

fn validate(req: CreateAdhocGoalRequest) -> Result<CreateAdhocGoalRequest> {
    let title = req.title.trim().to_string();

    if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::InvalidArgument(format!(
            "adhoc goal title must be 1 to {} characters",
            MAX_TITLE_LENGTH
        )));
    }

    if !(MIN_PERIOD_YEAR..=MAX_PERIOD_YEAR).contains(&req.year) {
        return Err(AppError::InvalidArgument(format!("invalid year {}", req.year)));
    }

    if !(1..=53).contains(&req.week_number) {
        return Err(AppError::InvalidArgument(format!(
            "invalid week number {}",
            req.week_number
        )));
    }

    if let Some(day) = req.day_of_week {
        if weekday_from_number(day).is_none() {
            return Err(AppError::InvalidArgument(format!(
                "day of week must be between 1 and 7, got {}",
                day
            )));
        }
    }

    Ok(CreateAdhocGoalRequest { title, ..req })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::create_test_repo;

    fn request(title: &str, day_of_week: Option<i32>) -> CreateAdhocGoalRequest {
        CreateAdhocGoalRequest {
            title: title.to_string(),
            details: None,
            domain_id: None,
            year: 2025,
            week_number: 10,
            day_of_week,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_complete_delete() {
        let service = AdhocService::new(create_test_repo().await);

        let goal = service
            .create_adhoc_goal("u1", request(" Call plumber ", Some(1)))
            .await
            .unwrap();
        assert_eq!(goal.title, "Call plumber");

        let done = service.set_complete("u1", &goal.id, true).await.unwrap();
        assert!(done.is_complete);

        let err = service.delete_adhoc_goal("u2", &goal.id).await.unwrap_err();
        assert_eq!(err.code(), "forbidden");

        service.delete_adhoc_goal("u1", &goal.id).await.unwrap();
        assert!(service.list_for_week("u1", 2025, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_day_is_rejected() {
        let service = AdhocService::new(create_test_repo().await);

        let err = service
            .create_adhoc_goal("u1", request("Call plumber", Some(9)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }
}
