//! Goals service
//!
//! Direct creation and editing of quarterly, weekly and daily goals, the
//! carry-over factory, and the per-week tree view.

use crate::config::{MAX_TITLE_LENGTH, ROOT_PATH};
use crate::database::{
    CreateGoalRequest, DailyState, Goal, GoalDepth, NewWeeklyGoalState, Repository,
    UpdateGoalRequest, WeeklyGoalState,
};
use crate::error::{AppError, Result};
use crate::hierarchy::{build_tree, carried_over_goal, NestedGoal};
use crate::period::{self, Period};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Service for managing hierarchical goals
#[derive(Clone)]
pub struct GoalsService {
    repo: Repository,
}

impl GoalsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a quarterly goal (no parent) or a weekly/daily goal under
    /// `parent_id`. Weekly and daily goals get their state row for
    /// `week_number` in the same transaction.
    pub async fn create_goal(&self, user_id: &str, req: CreateGoalRequest) -> Result<Goal> {
        req.period.validate()?;
        let title = validate_title(&req.title)?;

        let (depth, in_path) = self
            .placement(user_id, req.period, req.parent_id.as_deref())
            .await?;

        let state = match (depth, req.week_number) {
            (GoalDepth::Quarterly, None) => None,
            (_, None) => {
                return Err(AppError::InvalidArgument(
                    "weekly and daily goals need a week number".to_string(),
                ));
            }
            (_, Some(week_number)) => {
                if !req.period.contains_week(week_number)? {
                    return Err(AppError::InvalidArgument(format!(
                        "week {} is not part of {}",
                        week_number, req.period
                    )));
                }

                let daily = match (depth, req.day_of_week) {
                    (GoalDepth::Daily, Some(day_of_week)) => Some(DailyState {
                        day_of_week,
                        date_timestamp: period::date_timestamp(
                            req.period.year,
                            week_number,
                            day_of_week,
                        )?,
                    }),
                    (GoalDepth::Daily, None) => {
                        return Err(AppError::InvalidArgument(
                            "daily goals need a day of week".to_string(),
                        ));
                    }
                    _ => None,
                };

                Some(NewWeeklyGoalState { week_number, daily })
            }
        };

        let now = Utc::now();
        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            year: req.period.year,
            quarter: req.period.quarter,
            title,
            details: req.details,
            parent_id: req.parent_id,
            depth,
            in_path,
            is_complete: false,
            completed_at: None,
            carry_over: None,
            created_at: now,
            updated_at: now,
        };

        tracing::info!("Creating {:?} goal in {}: {}", depth, req.period, goal.title);

        let goal = match state {
            Some(state) => self.repo.insert_goal_with_state(&goal, &state).await?.0,
            None => self.repo.insert_goal(&goal).await?,
        };

        tracing::info!("Goal created successfully: {}", goal.id);
        Ok(goal)
    }

    /// Copy `source` into `destination`, stamping transitive lineage.
    /// Writes the goal record only; state rows are the caller's concern.
    ///
    /// `depth` and `in_path` must agree with `parent_id`: no parent means a
    /// quarterly goal at the root path, otherwise the copy sits one level
    /// below a parent of the same owner that already lives in `destination`.
    pub async fn create_carried_over_goal(
        &self,
        source: &Goal,
        destination: Period,
        parent_id: Option<&str>,
        depth: GoalDepth,
        in_path: &str,
    ) -> Result<String> {
        destination.validate()?;

        let (expected_depth, expected_path) = self
            .placement(&source.user_id, destination, parent_id)
            .await?;

        if depth != expected_depth {
            return Err(AppError::InvalidArgument(format!(
                "a {:?} goal cannot be placed where a {:?} goal belongs",
                depth, expected_depth
            )));
        }

        if in_path != expected_path {
            return Err(AppError::InvalidArgument(format!(
                "path {} does not match parent path {}",
                in_path, expected_path
            )));
        }

        let goal = carried_over_goal(source, destination, parent_id, depth, in_path);
        let goal = self.repo.insert_goal(&goal).await?;

        tracing::info!(
            "Carried goal {} into {} as {} (root {})",
            source.id,
            destination,
            goal.id,
            goal.root_goal_id()
        );

        Ok(goal.id)
    }

    /// Carry the owner's goal `source_id` into `destination`, under
    /// `parent_id` when given, deriving depth and path from the parent
    pub async fn carry_over_goal(
        &self,
        user_id: &str,
        source_id: &str,
        destination: Period,
        parent_id: Option<&str>,
    ) -> Result<String> {
        let source = self.repo.get_owned_goal(user_id, source_id).await?;
        let (depth, in_path) = self.placement(user_id, destination, parent_id).await?;

        self.create_carried_over_goal(&source, destination, parent_id, depth, &in_path)
            .await
    }

    /// Depth and materialized path of a new goal in `period` under `parent_id`
    async fn placement(
        &self,
        user_id: &str,
        period: Period,
        parent_id: Option<&str>,
    ) -> Result<(GoalDepth, String)> {
        let Some(parent_id) = parent_id else {
            return Ok((GoalDepth::Quarterly, ROOT_PATH.to_string()));
        };

        let parent = self.repo.get_owned_goal(user_id, parent_id).await?;

        if parent.period() != period {
            return Err(AppError::InvalidArgument(format!(
                "parent goal {} is in {}, not {}",
                parent.id,
                parent.period(),
                period
            )));
        }

        let depth = parent.depth.child().ok_or_else(|| {
            AppError::InvalidArgument("daily goals cannot have children".to_string())
        })?;

        Ok((depth, parent.path()))
    }

    pub async fn get_goal(&self, user_id: &str, id: &str) -> Result<Goal> {
        self.repo.get_owned_goal(user_id, id).await
    }

    /// Every instance of the goal's lineage, newest period first
    pub async fn list_lineage(&self, user_id: &str, id: &str) -> Result<Vec<Goal>> {
        let goal = self.repo.get_owned_goal(user_id, id).await?;
        self.repo.list_lineage(user_id, goal.root_goal_id()).await
    }

    pub async fn update_goal(&self, user_id: &str, req: UpdateGoalRequest) -> Result<Goal> {
        self.repo.get_owned_goal(user_id, &req.id).await?;

        let req = UpdateGoalRequest {
            title: req.title.as_deref().map(validate_title).transpose()?,
            ..req
        };

        tracing::debug!("Updating goal: {}", req.id);
        self.repo.update_goal(&req).await
    }

    pub async fn set_complete(&self, user_id: &str, id: &str, is_complete: bool) -> Result<Goal> {
        self.repo.get_owned_goal(user_id, id).await?;

        tracing::info!("Setting goal {} complete = {}", id, is_complete);
        self.repo.set_goal_complete(id, is_complete).await
    }

    /// Delete a goal and its descendants
    pub async fn delete_goal(&self, user_id: &str, id: &str) -> Result<()> {
        let goal = self.repo.get_owned_goal(user_id, id).await?;

        tracing::info!("Deleting goal subtree: {}", id);
        let removed = self.repo.delete_goal_subtree(&goal).await?;
        tracing::info!("Deleted {} goals under {}", removed, id);

        Ok(())
    }

    /// Change star/pin for one week, keeping whichever flag is not given
    pub async fn update_week_state(
        &self,
        user_id: &str,
        goal_id: &str,
        week_number: i32,
        is_starred: Option<bool>,
        is_pinned: Option<bool>,
    ) -> Result<WeeklyGoalState> {
        let goal = self.repo.get_owned_goal(user_id, goal_id).await?;
        let period = goal.period();

        if !period.contains_week(week_number)? {
            return Err(AppError::InvalidArgument(format!(
                "week {} is not part of {}",
                week_number, period
            )));
        }

        let current = self
            .repo
            .get_state(user_id, goal_id, period, week_number)
            .await?;

        let (was_starred, was_pinned) = current
            .map(|s| (s.is_starred, s.is_pinned))
            .unwrap_or((false, false));

        self.repo
            .upsert_state_flags(
                user_id,
                goal_id,
                period,
                week_number,
                is_starred.unwrap_or(was_starred),
                is_pinned.unwrap_or(was_pinned),
            )
            .await
    }

    /// The period's goals as a tree, each node carrying its state for
    /// `week_number` when one exists
    pub async fn get_goal_tree(
        &self,
        user_id: &str,
        period: Period,
        week_number: i32,
    ) -> Result<Vec<NestedGoal<Option<WeeklyGoalState>>>> {
        period.validate()?;

        let goals = self.repo.list_goals_for_period(user_id, period).await?;
        let mut states: HashMap<String, WeeklyGoalState> = self
            .repo
            .list_states_for_week(user_id, period, week_number)
            .await?
            .into_iter()
            .map(|state| (state.goal_id.clone(), state))
            .collect();

        let tree = build_tree(goals, |goal| states.remove(&goal.id))?;

        let orphans = tree.unattached_count();
        if orphans > 0 {
            tracing::warn!(
                "{} goals in {} hang off parents outside the period",
                orphans,
                period
            );
        }

        Ok(tree.into_nested())
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();

    if title.is_empty() {
        return Err(AppError::InvalidArgument(
            "goal title cannot be empty".to_string(),
        ));
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::InvalidArgument(format!(
            "goal title exceeds {} characters",
            MAX_TITLE_LENGTH
        )));
    }

    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::create_test_repo;

    async fn create_test_service() -> (GoalsService, Repository) {
        let repo = create_test_repo().await;
        (GoalsService::new(repo.clone()), repo)
    }

    fn q1() -> Period {
        Period::new(2025, 1).unwrap()
    }

    fn request(title: &str, parent_id: Option<&str>, week: Option<i32>) -> CreateGoalRequest {
        CreateGoalRequest {
            period: q1(),
            title: title.to_string(),
            details: None,
            parent_id: parent_id.map(str::to_string),
            week_number: week,
            day_of_week: None,
        }
    }

    #[tokio::test]
    async fn test_create_goal_hierarchy() {
        let (service, repo) = create_test_service().await;

        let quarterly = service
            .create_goal("u1", request("Launch", None, None))
            .await
            .unwrap();
        let weekly = service
            .create_goal("u1", request("Draft", Some(&quarterly.id), Some(3)))
            .await
            .unwrap();
        let daily = service
            .create_goal(
                "u1",
                CreateGoalRequest {
                    day_of_week: Some(2),
                    ..request("Outline", Some(&weekly.id), Some(3))
                },
            )
            .await
            .unwrap();

        assert_eq!(quarterly.depth, GoalDepth::Quarterly);
        assert_eq!(weekly.depth, GoalDepth::Weekly);
        assert_eq!(weekly.in_path, quarterly.path());
        assert_eq!(daily.depth, GoalDepth::Daily);
        assert_eq!(daily.path(), format!("/{}/{}/{}", quarterly.id, weekly.id, daily.id));

        let state = repo.get_state("u1", &daily.id, q1(), 3).await.unwrap().unwrap();
        assert_eq!(state.daily().map(|d| d.day_of_week), Some(2));
    }

    #[tokio::test]
    async fn test_create_goal_validation() {
        let (service, _repo) = create_test_service().await;

        let err = service
            .create_goal("u1", request("   ", None, None))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");

        let quarterly = service
            .create_goal("u1", request("Launch", None, None))
            .await
            .unwrap();

        // Weekly goals need a week inside the quarter
        let err = service
            .create_goal("u1", request("Draft", Some(&quarterly.id), None))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");

        let err = service
            .create_goal("u1", request("Draft", Some(&quarterly.id), Some(30)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");

        // Another user's parent
        let err = service
            .create_goal("u2", request("Draft", Some(&quarterly.id), Some(3)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn test_create_carried_over_goal() {
        let (service, repo) = create_test_service().await;
        let q2 = Period::new(2025, 2).unwrap();

        let original = service
            .create_goal("u1", request("Launch", None, None))
            .await
            .unwrap();

        let first_id = service
            .create_carried_over_goal(&original, q2, None, GoalDepth::Quarterly, ROOT_PATH)
            .await
            .unwrap();
        let first = repo.get_owned_goal("u1", &first_id).await.unwrap();

        let second_id = service
            .create_carried_over_goal(
                &first,
                Period::new(2025, 3).unwrap(),
                None,
                GoalDepth::Quarterly,
                ROOT_PATH,
            )
            .await
            .unwrap();
        let second = repo.get_owned_goal("u1", &second_id).await.unwrap();

        let carry = second.carry_over.unwrap();
        assert_eq!(carry.from_goal.root_goal_id, original.id);
        assert_eq!(carry.from_goal.previous_goal_id, first.id);
        assert_eq!(carry.num_weeks, 2);

        let lineage = service.list_lineage("u1", &second_id).await.unwrap();
        assert_eq!(lineage.len(), 3);
        assert_eq!(lineage[0].id, second_id);
    }

    #[tokio::test]
    async fn test_carried_over_goal_must_fit_its_parent() {
        let (service, _repo) = create_test_service().await;
        let q2 = Period::new(2025, 2).unwrap();

        let original = service
            .create_goal("u1", request("Launch", None, None))
            .await
            .unwrap();

        // Weekly copy without a parent
        let err = service
            .create_carried_over_goal(&original, q2, None, GoalDepth::Weekly, ROOT_PATH)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");

        let parent = service
            .create_goal("u1", CreateGoalRequest {
                period: q2,
                ..request("Q2 launch", None, None)
            })
            .await
            .unwrap();

        // Right parent, wrong depth
        let err = service
            .create_carried_over_goal(
                &original,
                q2,
                Some(&parent.id),
                GoalDepth::Daily,
                &parent.path(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");

        // Right depth, wrong path
        let err = service
            .create_carried_over_goal(&original, q2, Some(&parent.id), GoalDepth::Weekly, ROOT_PATH)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");

        // Nothing invalid reached storage
        let tree = service.get_goal_tree("u1", q2, 14).await.unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree[0].children.is_empty());

        let copy_id = service
            .carry_over_goal("u1", &original.id, q2, Some(&parent.id))
            .await
            .unwrap();
        let tree = service.get_goal_tree("u1", q2, 14).await.unwrap();
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].goal.id, copy_id);
        assert_eq!(tree[0].children[0].goal.depth, GoalDepth::Weekly);
    }

    #[tokio::test]
    async fn test_get_goal_tree_attaches_week_state() {
        let (service, _repo) = create_test_service().await;

        let quarterly = service
            .create_goal("u1", request("Launch", None, None))
            .await
            .unwrap();
        let weekly = service
            .create_goal("u1", request("Draft", Some(&quarterly.id), Some(3)))
            .await
            .unwrap();
        service
            .update_week_state("u1", &weekly.id, 3, Some(true), None)
            .await
            .unwrap();

        let tree = service.get_goal_tree("u1", q1(), 3).await.unwrap();

        assert_eq!(tree.len(), 1);
        assert!(tree[0].attached.is_none());
        let weekly_node = &tree[0].children[0];
        assert_eq!(weekly_node.goal.id, weekly.id);
        assert!(weekly_node.attached.as_ref().unwrap().is_starred);
    }

    #[tokio::test]
    async fn test_update_week_state_keeps_other_flag() {
        let (service, _repo) = create_test_service().await;

        let quarterly = service
            .create_goal("u1", request("Launch", None, None))
            .await
            .unwrap();

        service
            .update_week_state("u1", &quarterly.id, 2, Some(true), None)
            .await
            .unwrap();
        let state = service
            .update_week_state("u1", &quarterly.id, 2, None, Some(true))
            .await
            .unwrap();

        assert!(state.is_starred);
        assert!(state.is_pinned);
    }

    #[tokio::test]
    async fn test_delete_goal_removes_children() {
        let (service, repo) = create_test_service().await;

        let quarterly = service
            .create_goal("u1", request("Launch", None, None))
            .await
            .unwrap();
        service
            .create_goal("u1", request("Draft", Some(&quarterly.id), Some(3)))
            .await
            .unwrap();

        service.delete_goal("u1", &quarterly.id).await.unwrap();

        let remaining = repo.list_goals_for_period("u1", q1()).await.unwrap();
        assert!(remaining.is_empty());
    }
}
