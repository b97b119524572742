//! Goal log storage

use super::Repository;
use crate::database::models::*;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl Repository {
    pub async fn create_log(
        &self,
        user_id: &str,
        goal_id: &str,
        root_goal_id: &str,
        log_date: DateTime<Utc>,
        content: &str,
    ) -> Result<GoalLog> {
        let id = Uuid::new_v4().to_string();

        let log = sqlx::query_as::<_, GoalLog>(
            r#"
            INSERT INTO goal_logs (id, user_id, goal_id, root_goal_id, log_date, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(goal_id)
        .bind(root_goal_id)
        .bind(log_date)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created log {} for goal {}", id, goal_id);
        Ok(log)
    }

    /// Get a log entry that must belong to `user_id`
    pub async fn get_owned_log(&self, user_id: &str, id: &str) -> Result<GoalLog> {
        let log = sqlx::query_as::<_, GoalLog>("SELECT * FROM goal_logs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Goal log", id))?;

        if log.user_id != user_id {
            return Err(AppError::forbidden("Goal log", id));
        }

        Ok(log)
    }

    /// Change content and/or date of a log entry
    pub async fn update_log(
        &self,
        id: &str,
        content: Option<&str>,
        log_date: Option<DateTime<Utc>>,
    ) -> Result<GoalLog> {
        let log = sqlx::query_as::<_, GoalLog>(
            r#"
            UPDATE goal_logs
            SET content = COALESCE(?, content),
                log_date = COALESCE(?, log_date),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(content)
        .bind(log_date)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Goal log", id))?;

        tracing::debug!("Updated log: {}", id);
        Ok(log)
    }

    pub async fn delete_log(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM goal_logs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Goal log", id));
        }

        tracing::debug!("Deleted log: {}", id);
        Ok(())
    }

    /// Logs of one goal instance, newest first
    pub async fn list_logs_for_goal(&self, user_id: &str, goal_id: &str) -> Result<Vec<GoalLog>> {
        let logs = sqlx::query_as::<_, GoalLog>(
            r#"
            SELECT * FROM goal_logs
            WHERE user_id = ? AND goal_id = ?
            ORDER BY log_date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(goal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    /// Logs across every carried-over instance of a lineage, newest first
    pub async fn list_logs_for_root(
        &self,
        user_id: &str,
        root_goal_id: &str,
    ) -> Result<Vec<GoalLog>> {
        let logs = sqlx::query_as::<_, GoalLog>(
            r#"
            SELECT * FROM goal_logs
            WHERE user_id = ? AND root_goal_id = ?
            ORDER BY log_date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(root_goal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
