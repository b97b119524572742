//! Goal log service
//!
//! Log entries are written against the concrete goal instance and its
//! lineage root, so history reads either per instance or across every
//! carried-over copy.

use crate::config::MAX_LOG_CONTENT_LENGTH;
use crate::database::{GoalLog, Repository};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};

/// Service for managing goal logs
#[derive(Clone)]
pub struct GoalLogsService {
    repo: Repository,
}

impl GoalLogsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn create_log(
        &self,
        user_id: &str,
        goal_id: &str,
        log_date: DateTime<Utc>,
        content: &str,
    ) -> Result<GoalLog> {
        let content = validate_content(content)?;
        let goal = self.repo.get_owned_goal(user_id, goal_id).await?;

        tracing::info!("Adding log to goal {}", goal_id);
        self.repo
            .create_log(user_id, &goal.id, goal.root_goal_id(), log_date, content)
            .await
    }

    pub async fn update_log(
        &self,
        user_id: &str,
        log_id: &str,
        content: Option<&str>,
        log_date: Option<DateTime<Utc>>,
    ) -> Result<GoalLog> {
        let content = content.map(validate_content).transpose()?;
        self.repo.get_owned_log(user_id, log_id).await?;

        tracing::debug!("Updating log: {}", log_id);
        self.repo.update_log(log_id, content, log_date).await
    }

    pub async fn delete_log(&self, user_id: &str, log_id: &str) -> Result<()> {
        self.repo.get_owned_log(user_id, log_id).await?;

        tracing::info!("Deleting log: {}", log_id);
        self.repo.delete_log(log_id).await
    }

    /// History of one goal instance
    pub async fn list_logs_for_goal(&self, user_id: &str, goal_id: &str) -> Result<Vec<GoalLog>> {
        self.repo.get_owned_goal(user_id, goal_id).await?;
        self.repo.list_logs_for_goal(user_id, goal_id).await
    }

    /// History across the goal's whole carry-over lineage
    pub async fn list_logs_for_lineage(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<Vec<GoalLog>> {
        let goal = self.repo.get_owned_goal(user_id, goal_id).await?;
        self.repo.list_logs_for_root(user_id, goal.root_goal_id()).await
    }
}

fn validate_content(content: &str) -> Result<&str> {
    let content = content.trim();

    if content.is_empty() {
        return Err(AppError::InvalidArgument(
            "log content cannot be empty".to_string(),
        ));
    }

    if content.chars().count() > MAX_LOG_CONTENT_LENGTH {
        return Err(AppError::InvalidArgument(format!(
            "log content exceeds {} characters",
            MAX_LOG_CONTENT_LENGTH
        )));
    }

    Ok(content)
}
