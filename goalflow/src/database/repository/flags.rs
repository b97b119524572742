//! Fire and pending flag storage
//!
//! Each mutation runs in its own transaction. `set_pending` and
//! `clear_pending` change both side tables atomically; `toggle_fire` only
//! touches the fire table, so a pending goal can also be set on fire.

use super::Repository;
use crate::database::models::*;
use crate::error::Result;
use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

async fn delete_fire_on(conn: &mut SqliteConnection, user_id: &str, goal_id: &str) -> Result<u64> {
    let rows = sqlx::query("DELETE FROM fire_goals WHERE user_id = ? AND goal_id = ?")
        .bind(user_id)
        .bind(goal_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(rows)
}

async fn insert_fire_on(conn: &mut SqliteConnection, user_id: &str, goal_id: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO fire_goals (id, user_id, goal_id, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, goal_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(goal_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

impl Repository {
    /// Upsert the pending record and drop any fire record
    pub async fn set_pending(
        &self,
        user_id: &str,
        goal_id: &str,
        description: &str,
    ) -> Result<PendingGoal> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let pending = sqlx::query_as::<_, PendingGoal>(
            r#"
            INSERT INTO pending_goals (id, user_id, goal_id, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, goal_id) DO UPDATE SET
                description = excluded.description,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(goal_id)
        .bind(description)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        delete_fire_on(&mut tx, user_id, goal_id).await?;

        tx.commit().await?;

        tracing::debug!("Goal {} marked pending", goal_id);
        Ok(pending)
    }

    /// Drop the pending record and arm the fire record
    pub async fn clear_pending(&self, user_id: &str, goal_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM pending_goals WHERE user_id = ? AND goal_id = ?")
            .bind(user_id)
            .bind(goal_id)
            .execute(&mut *tx)
            .await?;

        insert_fire_on(&mut tx, user_id, goal_id).await?;

        tx.commit().await?;

        tracing::debug!("Goal {} cleared from pending", goal_id);
        Ok(())
    }

    /// Flip the fire record; returns whether the goal is now on fire
    pub async fn toggle_fire(&self, user_id: &str, goal_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = delete_fire_on(&mut tx, user_id, goal_id).await?;
        let on_fire = removed == 0;

        if on_fire {
            insert_fire_on(&mut tx, user_id, goal_id).await?;
        }

        tx.commit().await?;

        tracing::debug!("Goal {} on fire = {}", goal_id, on_fire);
        Ok(on_fire)
    }

    pub async fn is_on_fire(&self, user_id: &str, goal_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM fire_goals WHERE user_id = ? AND goal_id = ?",
        )
        .bind(user_id)
        .bind(goal_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn get_pending(&self, user_id: &str, goal_id: &str) -> Result<Option<PendingGoal>> {
        let pending = sqlx::query_as::<_, PendingGoal>(
            "SELECT * FROM pending_goals WHERE user_id = ? AND goal_id = ?",
        )
        .bind(user_id)
        .bind(goal_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pending)
    }

    pub async fn list_fire_goals(&self, user_id: &str) -> Result<Vec<FireGoal>> {
        let fire = sqlx::query_as::<_, FireGoal>(
            "SELECT * FROM fire_goals WHERE user_id = ? ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(fire)
    }

    pub async fn list_pending_goals(&self, user_id: &str) -> Result<Vec<PendingGoal>> {
        let pending = sqlx::query_as::<_, PendingGoal>(
            "SELECT * FROM pending_goals WHERE user_id = ? ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pending)
    }
}
