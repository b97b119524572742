//! Per-week goal state storage

use super::Repository;
use crate::database::models::*;
use crate::error::Result;
use crate::period::Period;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

/// Insert a fresh state row on an open connection or transaction
pub(super) async fn insert_state_on(
    conn: &mut SqliteConnection,
    user_id: &str,
    goal_id: &str,
    period: Period,
    state: &NewWeeklyGoalState,
) -> Result<WeeklyGoalState> {
    let daily = state.daily;

    let inserted = sqlx::query_as::<_, WeeklyGoalState>(
        r#"
        INSERT INTO goal_state_by_week (
            id, user_id, goal_id, year, quarter, week_number,
            is_starred, is_pinned, day_of_week, date_timestamp, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, 0, 0, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(goal_id)
    .bind(period.year)
    .bind(period.quarter)
    .bind(state.week_number)
    .bind(daily.map(|d| d.day_of_week))
    .bind(daily.map(|d| d.date_timestamp))
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(inserted)
}

impl Repository {
    /// State of one goal in one week
    pub async fn get_state(
        &self,
        user_id: &str,
        goal_id: &str,
        period: Period,
        week_number: i32,
    ) -> Result<Option<WeeklyGoalState>> {
        let state = sqlx::query_as::<_, WeeklyGoalState>(
            r#"
            SELECT * FROM goal_state_by_week
            WHERE user_id = ? AND goal_id = ? AND year = ? AND quarter = ? AND week_number = ?
            "#,
        )
        .bind(user_id)
        .bind(goal_id)
        .bind(period.year)
        .bind(period.quarter)
        .bind(week_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    /// Create a state row for an existing goal
    pub async fn insert_state(
        &self,
        user_id: &str,
        goal_id: &str,
        period: Period,
        state: &NewWeeklyGoalState,
    ) -> Result<WeeklyGoalState> {
        let mut conn = self.pool.acquire().await?;
        let inserted = insert_state_on(&mut conn, user_id, goal_id, period, state).await?;

        tracing::debug!(
            "Created state for goal {} in week {}",
            goal_id,
            inserted.week_number
        );
        Ok(inserted)
    }

    /// Write star/pin flags, creating the row on first interaction
    pub async fn upsert_state_flags(
        &self,
        user_id: &str,
        goal_id: &str,
        period: Period,
        week_number: i32,
        is_starred: bool,
        is_pinned: bool,
    ) -> Result<WeeklyGoalState> {
        let state = sqlx::query_as::<_, WeeklyGoalState>(
            r#"
            INSERT INTO goal_state_by_week (
                id, user_id, goal_id, year, quarter, week_number, is_starred, is_pinned, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, goal_id, year, quarter, week_number) DO UPDATE SET
                is_starred = excluded.is_starred,
                is_pinned = excluded.is_pinned
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(goal_id)
        .bind(period.year)
        .bind(period.quarter)
        .bind(week_number)
        .bind(is_starred)
        .bind(is_pinned)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            "Set state flags for goal {} week {}: starred={}, pinned={}",
            goal_id,
            week_number,
            is_starred,
            is_pinned
        );
        Ok(state)
    }

    /// All state rows of a user in one week
    pub async fn list_states_for_week(
        &self,
        user_id: &str,
        period: Period,
        week_number: i32,
    ) -> Result<Vec<WeeklyGoalState>> {
        let states = sqlx::query_as::<_, WeeklyGoalState>(
            r#"
            SELECT * FROM goal_state_by_week
            WHERE user_id = ? AND year = ? AND quarter = ? AND week_number = ?
            "#,
        )
        .bind(user_id)
        .bind(period.year)
        .bind(period.quarter)
        .bind(week_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(states)
    }

    /// State rows in a period belonging to any of `goal_ids`
    pub async fn list_states_for_goals(
        &self,
        user_id: &str,
        period: Period,
        goal_ids: &[String],
    ) -> Result<Vec<WeeklyGoalState>> {
        if goal_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT * FROM goal_state_by_week WHERE user_id = ");
        query
            .push_bind(user_id)
            .push(" AND year = ")
            .push_bind(period.year)
            .push(" AND quarter = ")
            .push_bind(period.quarter)
            .push(" AND goal_id IN (");

        let mut ids = query.separated(", ");
        for id in goal_ids {
            ids.push_bind(id.as_str());
        }
        ids.push_unseparated(")");

        query.push(" ORDER BY week_number DESC, created_at ASC");

        let states = query
            .build_query_as::<WeeklyGoalState>()
            .fetch_all(&self.pool)
            .await?;

        Ok(states)
    }
}
