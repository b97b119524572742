//! Adhoc goal storage

use super::Repository;
use crate::database::models::*;
use crate::error::{AppError, Result};
use crate::period::Period;
use chrono::Utc;
use std::ops::RangeInclusive;
use uuid::Uuid;

impl Repository {
    /// Create an adhoc goal, optionally recording the goal it was copied from
    pub async fn create_adhoc_goal(
        &self,
        user_id: &str,
        req: &CreateAdhocGoalRequest,
        copied_from_id: Option<&str>,
    ) -> Result<AdhocGoal> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let goal = sqlx::query_as::<_, AdhocGoal>(
            r#"
            INSERT INTO adhoc_goals (
                id, user_id, title, details, domain_id, year, week_number, day_of_week,
                due_date, is_complete, copied_from_id, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.details)
        .bind(&req.domain_id)
        .bind(req.year)
        .bind(req.week_number)
        .bind(req.day_of_week)
        .bind(req.due_date)
        .bind(copied_from_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created adhoc goal: {}", id);
        Ok(goal)
    }

    /// Get an adhoc goal that must belong to `user_id`
    pub async fn get_owned_adhoc_goal(&self, user_id: &str, id: &str) -> Result<AdhocGoal> {
        let goal = sqlx::query_as::<_, AdhocGoal>("SELECT * FROM adhoc_goals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Adhoc goal", id))?;

        if goal.user_id != user_id {
            return Err(AppError::forbidden("Adhoc goal", id));
        }

        Ok(goal)
    }

    /// Adhoc goals planned in one week
    pub async fn list_adhoc_goals_for_week(
        &self,
        user_id: &str,
        year: i32,
        week_number: i32,
    ) -> Result<Vec<AdhocGoal>> {
        let goals = sqlx::query_as::<_, AdhocGoal>(
            r#"
            SELECT * FROM adhoc_goals
            WHERE user_id = ? AND year = ? AND week_number = ?
            ORDER BY day_of_week IS NULL, day_of_week ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(year)
        .bind(week_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(goals)
    }

    /// Incomplete adhoc goals within a range of weeks
    pub async fn list_open_adhoc_goals(
        &self,
        user_id: &str,
        year: i32,
        weeks: RangeInclusive<i32>,
    ) -> Result<Vec<AdhocGoal>> {
        let goals = sqlx::query_as::<_, AdhocGoal>(
            r#"
            SELECT * FROM adhoc_goals
            WHERE user_id = ? AND year = ? AND week_number BETWEEN ? AND ? AND is_complete = 0
            ORDER BY week_number DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(year)
        .bind(*weeks.start())
        .bind(*weeks.end())
        .fetch_all(&self.pool)
        .await?;

        Ok(goals)
    }

    /// Copy of an adhoc goal that an earlier migration placed in
    /// `destination`, if any
    pub async fn find_adhoc_copy(
        &self,
        user_id: &str,
        destination: Period,
        copied_from_id: &str,
    ) -> Result<Option<AdhocGoal>> {
        let weeks = destination.week_range()?;

        let goal = sqlx::query_as::<_, AdhocGoal>(
            r#"
            SELECT * FROM adhoc_goals
            WHERE user_id = ? AND copied_from_id = ?
              AND year = ? AND week_number BETWEEN ? AND ?
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(copied_from_id)
        .bind(destination.year)
        .bind(*weeks.start())
        .bind(*weeks.end())
        .fetch_optional(&self.pool)
        .await?;

        Ok(goal)
    }

    pub async fn set_adhoc_goal_complete(&self, id: &str, is_complete: bool) -> Result<AdhocGoal> {
        let now = Utc::now();

        let goal = sqlx::query_as::<_, AdhocGoal>(
            r#"
            UPDATE adhoc_goals SET is_complete = ?, completed_at = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(is_complete)
        .bind(is_complete.then_some(now))
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Adhoc goal", id))?;

        tracing::debug!("Set adhoc goal {} complete = {}", id, is_complete);
        Ok(goal)
    }

    pub async fn delete_adhoc_goal(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM adhoc_goals WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Adhoc goal", id));
        }

        tracing::debug!("Deleted adhoc goal: {}", id);
        Ok(())
    }
}
