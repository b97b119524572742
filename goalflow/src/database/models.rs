//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to the presentation layer.

use crate::config::{MAX_GOAL_DEPTH, ROOT_PATH};
use crate::error::{AppError, Result};
use crate::period::Period;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Position of a goal in the quarterly/weekly/daily tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalDepth {
    Quarterly,
    Weekly,
    Daily,
}

impl GoalDepth {
    pub fn as_i64(self) -> i64 {
        match self {
            GoalDepth::Quarterly => 0,
            GoalDepth::Weekly => 1,
            GoalDepth::Daily => 2,
        }
    }

    /// Depth of this level's parent, `None` for quarterly goals
    pub fn parent(self) -> Option<GoalDepth> {
        match self {
            GoalDepth::Quarterly => None,
            GoalDepth::Weekly => Some(GoalDepth::Quarterly),
            GoalDepth::Daily => Some(GoalDepth::Weekly),
        }
    }

    pub fn child(self) -> Option<GoalDepth> {
        match self {
            GoalDepth::Quarterly => Some(GoalDepth::Weekly),
            GoalDepth::Weekly => Some(GoalDepth::Daily),
            GoalDepth::Daily => None,
        }
    }
}

impl TryFrom<i64> for GoalDepth {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(GoalDepth::Quarterly),
            1 => Ok(GoalDepth::Weekly),
            2 => Ok(GoalDepth::Daily),
            other => Err(AppError::StructuralFault(format!(
                "goal depth {} is outside 0..={}",
                other, MAX_GOAL_DEPTH
            ))),
        }
    }
}

/// Where a carried-over goal came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryOverSource {
    /// The goal this one was copied from
    pub previous_goal_id: String,
    /// The first goal of the chain, never an intermediate copy
    pub root_goal_id: String,
}

/// Lineage stamped on a goal copied forward from an earlier period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryOver {
    /// Number of hops from the root goal
    pub num_weeks: i64,
    pub from_goal: CarryOverSource,
}

/// A quarterly, weekly or daily goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub year: i32,
    pub quarter: i32,
    pub title: String,
    pub details: Option<String>,
    pub parent_id: Option<String>,
    pub depth: GoalDepth,
    /// Materialized path of the parent (`/` for quarterly goals)
    pub in_path: String,
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub carry_over: Option<CarryOver>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn period(&self) -> Period {
        Period {
            year: self.year,
            quarter: self.quarter,
        }
    }

    /// Full materialized path: parent path plus own id
    pub fn path(&self) -> String {
        child_path(&self.in_path, &self.id)
    }

    /// Effective lineage root: the chain's first goal, or this goal itself
    pub fn root_goal_id(&self) -> &str {
        self.carry_over
            .as_ref()
            .map(|c| c.from_goal.root_goal_id.as_str())
            .unwrap_or(&self.id)
    }
}

/// Path of a child whose parent is stored under `parent_path`
pub fn child_path(parent_path: &str, id: &str) -> String {
    if parent_path == ROOT_PATH {
        format!("/{}", id)
    } else {
        format!("{}/{}", parent_path, id)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Goal {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let depth: i64 = row.try_get("depth")?;
        let depth = GoalDepth::try_from(depth).map_err(|e| sqlx::Error::ColumnDecode {
            index: "depth".to_string(),
            source: Box::new(e),
        })?;

        let num_weeks: Option<i64> = row.try_get("carry_over_num_weeks")?;
        let previous_goal_id: Option<String> = row.try_get("carry_over_previous_goal_id")?;
        let root_goal_id: Option<String> = row.try_get("carry_over_root_goal_id")?;

        let carry_over = match (num_weeks, previous_goal_id, root_goal_id) {
            (Some(num_weeks), Some(previous_goal_id), Some(root_goal_id)) => Some(CarryOver {
                num_weeks,
                from_goal: CarryOverSource {
                    previous_goal_id,
                    root_goal_id,
                },
            }),
            _ => None,
        };

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            year: row.try_get("year")?,
            quarter: row.try_get("quarter")?,
            title: row.try_get("title")?,
            details: row.try_get("details")?,
            parent_id: row.try_get("parent_id")?,
            depth,
            in_path: row.try_get("in_path")?,
            is_complete: row.try_get("is_complete")?,
            completed_at: row.try_get("completed_at")?,
            carry_over,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Create goal request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGoalRequest {
    pub period: Period,
    pub title: String,
    pub details: Option<String>,
    pub parent_id: Option<String>,
    /// Week the goal is planned in; required for weekly and daily goals
    pub week_number: Option<i32>,
    /// 1 (Monday) ..= 7 (Sunday); daily goals only
    pub day_of_week: Option<i32>,
}

/// Update goal request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGoalRequest {
    pub id: String,
    pub title: Option<String>,
    pub details: Option<String>,
}

/// Per-week view state of a goal
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklyGoalState {
    pub id: String,
    pub user_id: String,
    pub goal_id: String,
    pub year: i32,
    pub quarter: i32,
    pub week_number: i32,
    pub is_starred: bool,
    pub is_pinned: bool,
    /// 1 (Monday) ..= 7 (Sunday); daily goals only
    pub day_of_week: Option<i32>,
    /// Midnight UTC of `day_of_week` in this week, epoch milliseconds
    pub date_timestamp: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl WeeklyGoalState {
    pub fn daily(&self) -> Option<DailyState> {
        match (self.day_of_week, self.date_timestamp) {
            (Some(day_of_week), Some(date_timestamp)) => Some(DailyState {
                day_of_week,
                date_timestamp,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyState {
    pub day_of_week: i32,
    pub date_timestamp: i64,
}

/// State row to be written next to a new goal
#[derive(Debug, Clone)]
pub struct NewWeeklyGoalState {
    pub week_number: i32,
    pub daily: Option<DailyState>,
}

/// A task tagged with a domain and week instead of a tree position
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdhocGoal {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub details: Option<String>,
    pub domain_id: Option<String>,
    pub year: i32,
    pub week_number: i32,
    pub day_of_week: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Adhoc goal this one was migrated from
    pub copied_from_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create adhoc goal request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAdhocGoalRequest {
    pub title: String,
    pub details: Option<String>,
    pub domain_id: Option<String>,
    pub year: i32,
    pub week_number: i32,
    pub day_of_week: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

/// A dated note against a goal instance and its lineage root
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GoalLog {
    pub id: String,
    pub user_id: String,
    pub goal_id: String,
    pub root_goal_id: String,
    pub log_date: DateTime<Utc>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Urgent marker on a goal
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FireGoal {
    pub id: String,
    pub user_id: String,
    pub goal_id: String,
    pub created_at: DateTime<Utc>,
}

/// Blocked-with-reason marker on a goal
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingGoal {
    pub id: String,
    pub user_id: String,
    pub goal_id: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Authenticated session
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}
