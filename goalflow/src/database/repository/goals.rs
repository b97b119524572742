//! Hierarchical goal storage

use super::Repository;
use crate::database::models::*;
use crate::error::{AppError, Result};
use crate::period::Period;
use chrono::Utc;
use sqlx::SqliteConnection;

/// Insert a goal on an open connection or transaction
pub(super) async fn insert_goal_on(conn: &mut SqliteConnection, goal: &Goal) -> Result<Goal> {
    let (num_weeks, previous_goal_id, root_goal_id) = match &goal.carry_over {
        Some(carry) => (
            Some(carry.num_weeks),
            Some(carry.from_goal.previous_goal_id.as_str()),
            Some(carry.from_goal.root_goal_id.as_str()),
        ),
        None => (None, None, None),
    };

    let inserted = sqlx::query_as::<_, Goal>(
        r#"
        INSERT INTO goals (
            id, user_id, year, quarter, title, details, parent_id, depth, in_path,
            is_complete, completed_at,
            carry_over_num_weeks, carry_over_previous_goal_id, carry_over_root_goal_id,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&goal.id)
    .bind(&goal.user_id)
    .bind(goal.year)
    .bind(goal.quarter)
    .bind(&goal.title)
    .bind(&goal.details)
    .bind(&goal.parent_id)
    .bind(goal.depth.as_i64())
    .bind(&goal.in_path)
    .bind(goal.is_complete)
    .bind(goal.completed_at)
    .bind(num_weeks)
    .bind(previous_goal_id)
    .bind(root_goal_id)
    .bind(goal.created_at)
    .bind(goal.updated_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(inserted)
}

impl Repository {
    /// Insert a single goal record
    pub async fn insert_goal(&self, goal: &Goal) -> Result<Goal> {
        let mut conn = self.pool.acquire().await?;
        let inserted = insert_goal_on(&mut conn, goal).await?;

        tracing::debug!("Created goal: {} (depth {:?})", inserted.id, inserted.depth);
        Ok(inserted)
    }

    /// Insert a goal together with its first weekly state row, atomically
    pub async fn insert_goal_with_state(
        &self,
        goal: &Goal,
        state: &NewWeeklyGoalState,
    ) -> Result<(Goal, WeeklyGoalState)> {
        let mut tx = self.pool.begin().await?;

        let inserted = insert_goal_on(&mut tx, goal).await?;
        let state = super::states::insert_state_on(
            &mut tx,
            &inserted.user_id,
            &inserted.id,
            inserted.period(),
            state,
        )
        .await?;

        tx.commit().await?;

        tracing::debug!(
            "Created goal: {} with state for week {}",
            inserted.id,
            state.week_number
        );
        Ok((inserted, state))
    }

    /// Look up a goal by ID regardless of owner
    pub async fn find_goal(&self, id: &str) -> Result<Option<Goal>> {
        let goal = sqlx::query_as::<_, Goal>("SELECT * FROM goals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(goal)
    }

    /// Get a goal that must belong to `user_id`
    pub async fn get_owned_goal(&self, user_id: &str, id: &str) -> Result<Goal> {
        let goal = self
            .find_goal(id)
            .await?
            .ok_or_else(|| AppError::not_found("Goal", id))?;

        if goal.user_id != user_id {
            return Err(AppError::forbidden("Goal", id));
        }

        Ok(goal)
    }

    /// All goals of a user in a period, shallowest first
    pub async fn list_goals_for_period(&self, user_id: &str, period: Period) -> Result<Vec<Goal>> {
        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT * FROM goals
            WHERE user_id = ? AND year = ? AND quarter = ?
            ORDER BY depth ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(period.year)
        .bind(period.quarter)
        .fetch_all(&self.pool)
        .await?;

        Ok(goals)
    }

    /// Goals at one depth in a period, most recently created first
    pub async fn list_goals_at_depth(
        &self,
        user_id: &str,
        period: Period,
        depth: GoalDepth,
    ) -> Result<Vec<Goal>> {
        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT * FROM goals
            WHERE user_id = ? AND year = ? AND quarter = ? AND depth = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(period.year)
        .bind(period.quarter)
        .bind(depth.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(goals)
    }

    /// Direct children of a goal within a period
    pub async fn list_children(
        &self,
        user_id: &str,
        parent_id: &str,
        period: Period,
    ) -> Result<Vec<Goal>> {
        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT * FROM goals
            WHERE user_id = ? AND parent_id = ? AND year = ? AND quarter = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(parent_id)
        .bind(period.year)
        .bind(period.quarter)
        .fetch_all(&self.pool)
        .await?;

        Ok(goals)
    }

    /// Copy of `previous_goal_id` already carried into `period`, if any
    pub async fn find_carried_copy(
        &self,
        user_id: &str,
        period: Period,
        previous_goal_id: &str,
    ) -> Result<Option<Goal>> {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            SELECT * FROM goals
            WHERE user_id = ? AND year = ? AND quarter = ? AND carry_over_previous_goal_id = ?
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(period.year)
        .bind(period.quarter)
        .bind(previous_goal_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(goal)
    }

    /// Every instance in a lineage, newest period first
    pub async fn list_lineage(&self, user_id: &str, root_goal_id: &str) -> Result<Vec<Goal>> {
        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT * FROM goals
            WHERE user_id = ? AND (id = ? OR carry_over_root_goal_id = ?)
            ORDER BY year DESC, quarter DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(root_goal_id)
        .bind(root_goal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(goals)
    }

    /// Patch title and/or details
    pub async fn update_goal(&self, req: &UpdateGoalRequest) -> Result<Goal> {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            UPDATE goals
            SET title = COALESCE(?, title),
                details = COALESCE(?, details),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.details)
        .bind(Utc::now())
        .bind(&req.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Goal", &req.id))?;

        tracing::debug!("Updated goal: {}", goal.id);
        Ok(goal)
    }

    /// Set completion state, stamping or clearing `completed_at`
    pub async fn set_goal_complete(&self, id: &str, is_complete: bool) -> Result<Goal> {
        let now = Utc::now();
        let completed_at = is_complete.then_some(now);

        let goal = sqlx::query_as::<_, Goal>(
            r#"
            UPDATE goals SET is_complete = ?, completed_at = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(is_complete)
        .bind(completed_at)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Goal", id))?;

        tracing::debug!("Set goal {} complete = {}", id, is_complete);
        Ok(goal)
    }

    /// Delete a goal and every descendant sharing its path prefix.
    /// States, logs and flags go with them through cascading foreign keys.
    pub async fn delete_goal_subtree(&self, goal: &Goal) -> Result<u64> {
        let path = goal.path();

        let rows = sqlx::query(
            r#"
            DELETE FROM goals
            WHERE user_id = ? AND (id = ? OR in_path = ? OR in_path LIKE ? || '/%')
            "#,
        )
        .bind(&goal.user_id)
        .bind(&goal.id)
        .bind(&path)
        .bind(&path)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::debug!("Deleted goal subtree {} ({} rows)", goal.id, rows);
        Ok(rows)
    }
}
