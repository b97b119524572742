//! Period migration service
//!
//! Pulls an owner's open goals from one period into another. A preview
//! (dry run) only reads; a commit writes one transaction per copied goal,
//! so an interrupted commit can be retried and skips what already landed.

use crate::config::ROOT_PATH;
use crate::database::{
    AdhocGoal, CreateAdhocGoalRequest, Goal, GoalDepth, NewWeeklyGoalState, Repository,
    WeeklyGoalState,
};
use crate::error::{AppError, Result};
use crate::hierarchy::{carried_over_goal, deduplicate_by_root};
use crate::period::Period;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Last week in which any weekly child of a quarterly goal has state
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaxWeekScan {
    pub max_week: Option<i32>,
    pub child_ids_in_max_week: BTreeSet<String>,
    pub states_in_max_week: Vec<WeeklyGoalState>,
}

impl MaxWeekScan {
    pub fn is_empty(&self) -> bool {
        self.max_week.is_none()
    }
}

/// Daily goal shown under a weekly goal in the preview
#[derive(Debug, Clone, Serialize)]
pub struct DailyGoalPreview {
    pub id: String,
    pub title: String,
    pub is_complete: bool,
    pub day_of_week: Option<i32>,
}

/// Weekly goal from the last active week, shown for context
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyGoalPreview {
    pub id: String,
    pub title: String,
    pub details: Option<String>,
    pub is_complete: bool,
    pub is_starred: bool,
    pub is_pinned: bool,
    pub daily_goals: Vec<DailyGoalPreview>,
}

/// A quarterly goal selected for carry-over
#[derive(Debug, Clone, Serialize)]
pub struct QuarterlyGoalToCopy {
    pub id: String,
    pub title: String,
    pub details: Option<String>,
    pub root_goal_id: String,
    /// Hop count the copy will carry
    pub num_weeks: i64,
    /// A copy already exists in the destination and will be skipped
    pub already_migrated: bool,
    pub last_active_week: Option<i32>,
    pub weekly_goals: Vec<WeeklyGoalPreview>,
}

/// An adhoc goal selected for copying
#[derive(Debug, Clone, Serialize)]
pub struct AdhocGoalToCopy {
    pub id: String,
    pub title: String,
    pub details: Option<String>,
    pub domain_id: Option<String>,
    pub day_of_week: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub already_migrated: bool,
}

/// Outcome of a preview or commit
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub source: Period,
    pub destination: Period,
    pub dry_run: bool,
    pub quarterly_goals_to_copy: Vec<QuarterlyGoalToCopy>,
    pub adhoc_goals_to_copy: Vec<AdhocGoalToCopy>,
    /// Goals written by this call; empty on a dry run
    pub created_goal_ids: Vec<String>,
    /// Adhoc goals written by this call; empty on a dry run
    pub created_adhoc_goal_ids: Vec<String>,
}

/// Selected source records, shared by preview and commit
struct MigrationPlan {
    quarterly: Vec<(Goal, QuarterlyGoalToCopy)>,
    adhoc: Vec<(AdhocGoal, AdhocGoalToCopy)>,
}

/// Service for period-to-period migration
#[derive(Clone)]
pub struct MigrationService {
    repo: Repository,
}

impl MigrationService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Find the last week with recorded state for any weekly child of a
    /// quarterly goal. "No data" is an empty scan, not an error.
    pub async fn find_max_week_for_quarterly_goal(
        &self,
        user_id: &str,
        quarterly_goal_id: &str,
        period: Period,
    ) -> Result<MaxWeekScan> {
        period.validate()?;

        let goal = self.repo.get_owned_goal(user_id, quarterly_goal_id).await?;
        if goal.depth != GoalDepth::Quarterly {
            return Err(AppError::InvalidArgument(format!(
                "goal {} is not a quarterly goal",
                quarterly_goal_id
            )));
        }

        let (scan, _children) = self.scan_children(user_id, quarterly_goal_id, period).await?;
        Ok(scan)
    }

    /// Scan plus the weekly children it was computed from
    async fn scan_children(
        &self,
        user_id: &str,
        quarterly_goal_id: &str,
        period: Period,
    ) -> Result<(MaxWeekScan, Vec<Goal>)> {
        let children: Vec<Goal> = self
            .repo
            .list_children(user_id, quarterly_goal_id, period)
            .await?
            .into_iter()
            .filter(|child| child.depth == GoalDepth::Weekly)
            .collect();

        if children.is_empty() {
            return Ok((MaxWeekScan::default(), children));
        }

        let child_ids: Vec<String> = children.iter().map(|c| c.id.clone()).collect();
        let states = self
            .repo
            .list_states_for_goals(user_id, period, &child_ids)
            .await?;

        let Some(max_week) = states.iter().map(|s| s.week_number).max() else {
            return Ok((MaxWeekScan::default(), children));
        };

        let states_in_max_week: Vec<WeeklyGoalState> = states
            .into_iter()
            .filter(|s| s.week_number == max_week)
            .collect();
        let child_ids_in_max_week = states_in_max_week
            .iter()
            .map(|s| s.goal_id.clone())
            .collect();

        Ok((
            MaxWeekScan {
                max_week: Some(max_week),
                child_ids_in_max_week,
                states_in_max_week,
            },
            children,
        ))
    }

    /// Preview (`dry_run`) or perform copying of open goals from `source`
    /// into `destination`
    pub async fn preview_or_commit(
        &self,
        user_id: &str,
        source: Period,
        destination: Period,
        dry_run: bool,
    ) -> Result<MigrationReport> {
        source.validate()?;
        destination.validate()?;

        if source == destination {
            return Err(AppError::InvalidArgument(format!(
                "cannot migrate {} into itself",
                source
            )));
        }

        tracing::info!(
            "{} migration for {} from {} to {}",
            if dry_run { "Previewing" } else { "Committing" },
            user_id,
            source,
            destination
        );

        let plan = self.plan(user_id, source, destination).await?;

        let (created_goal_ids, created_adhoc_goal_ids) = if dry_run {
            (Vec::new(), Vec::new())
        } else {
            self.commit(user_id, destination, &plan).await?
        };

        tracing::info!(
            "Migration {} -> {}: {} quarterly and {} adhoc candidates, {} goals and {} adhoc goals created",
            source,
            destination,
            plan.quarterly.len(),
            plan.adhoc.len(),
            created_goal_ids.len(),
            created_adhoc_goal_ids.len()
        );

        Ok(MigrationReport {
            source,
            destination,
            dry_run,
            quarterly_goals_to_copy: plan.quarterly.into_iter().map(|(_, c)| c).collect(),
            adhoc_goals_to_copy: plan.adhoc.into_iter().map(|(_, c)| c).collect(),
            created_goal_ids,
            created_adhoc_goal_ids,
        })
    }

    /// Select candidates; reads only
    async fn plan(
        &self,
        user_id: &str,
        source: Period,
        destination: Period,
    ) -> Result<MigrationPlan> {
        // Newest first so deduplication keeps the latest instance of a lineage
        let open_quarterly: Vec<Goal> = self
            .repo
            .list_goals_at_depth(user_id, source, GoalDepth::Quarterly)
            .await?
            .into_iter()
            .filter(|goal| !goal.is_complete)
            .collect();

        let mut quarterly = Vec::new();
        for goal in deduplicate_by_root(open_quarterly) {
            let (scan, children) = self.scan_children(user_id, &goal.id, source).await?;

            if !children.is_empty() && children.iter().all(|child| child.is_complete) {
                tracing::debug!("Skipping {}: no open weekly goals remain", goal.id);
                continue;
            }

            let weekly_goals = self.preview_last_week(user_id, source, &scan, &children).await?;
            let already_migrated = self
                .repo
                .find_carried_copy(user_id, destination, &goal.id)
                .await?
                .is_some();

            let candidate = QuarterlyGoalToCopy {
                id: goal.id.clone(),
                title: goal.title.clone(),
                details: goal.details.clone(),
                root_goal_id: goal.root_goal_id().to_string(),
                num_weeks: goal.carry_over.as_ref().map(|c| c.num_weeks).unwrap_or(0) + 1,
                already_migrated,
                last_active_week: scan.max_week,
                weekly_goals,
            };
            quarterly.push((goal, candidate));
        }

        let open_adhoc = self
            .repo
            .list_open_adhoc_goals(user_id, source.year, source.week_range()?)
            .await?;
        let open_ids: HashSet<String> = open_adhoc.iter().map(|g| g.id.clone()).collect();

        let mut adhoc = Vec::new();
        for goal in open_adhoc {
            // A copy whose original is also open here is the same task
            if goal
                .copied_from_id
                .as_ref()
                .is_some_and(|from| open_ids.contains(from))
            {
                continue;
            }

            // Quarters can share a boundary week; goals already sitting in
            // the destination's weeks stay where they are
            if goal.year == destination.year && destination.contains_week(goal.week_number)? {
                continue;
            }

            let already_migrated = self
                .repo
                .find_adhoc_copy(user_id, destination, &goal.id)
                .await?
                .is_some();

            let candidate = AdhocGoalToCopy {
                id: goal.id.clone(),
                title: goal.title.clone(),
                details: goal.details.clone(),
                domain_id: goal.domain_id.clone(),
                day_of_week: goal.day_of_week,
                due_date: goal.due_date,
                already_migrated,
            };
            adhoc.push((goal, candidate));
        }

        Ok(MigrationPlan { quarterly, adhoc })
    }

    /// Weekly goals of the last active week with their daily goals
    async fn preview_last_week(
        &self,
        user_id: &str,
        source: Period,
        scan: &MaxWeekScan,
        children: &[Goal],
    ) -> Result<Vec<WeeklyGoalPreview>> {
        let Some(max_week) = scan.max_week else {
            return Ok(Vec::new());
        };

        let states: HashMap<&str, &WeeklyGoalState> = scan
            .states_in_max_week
            .iter()
            .map(|s| (s.goal_id.as_str(), s))
            .collect();

        let mut previews = Vec::new();
        for weekly in children
            .iter()
            .filter(|c| scan.child_ids_in_max_week.contains(&c.id))
        {
            let dailies = self.repo.list_children(user_id, &weekly.id, source).await?;
            let daily_ids: Vec<String> = dailies.iter().map(|d| d.id.clone()).collect();

            let daily_days: HashMap<String, i32> = self
                .repo
                .list_states_for_goals(user_id, source, &daily_ids)
                .await?
                .into_iter()
                .filter(|s| s.week_number == max_week)
                .filter_map(|s| s.day_of_week.map(|day| (s.goal_id, day)))
                .collect();

            let daily_goals = dailies
                .into_iter()
                .map(|daily| DailyGoalPreview {
                    day_of_week: daily_days.get(&daily.id).copied(),
                    id: daily.id,
                    title: daily.title,
                    is_complete: daily.is_complete,
                })
                .collect();

            let state = states.get(weekly.id.as_str());
            previews.push(WeeklyGoalPreview {
                id: weekly.id.clone(),
                title: weekly.title.clone(),
                details: weekly.details.clone(),
                is_complete: weekly.is_complete,
                is_starred: state.map(|s| s.is_starred).unwrap_or(false),
                is_pinned: state.map(|s| s.is_pinned).unwrap_or(false),
                daily_goals,
            });
        }

        Ok(previews)
    }

    /// Write the plan, one transaction per goal, skipping copies that exist
    async fn commit(
        &self,
        user_id: &str,
        destination: Period,
        plan: &MigrationPlan,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let week_number = destination.first_week()?;
        let mut created_goal_ids = Vec::new();
        let mut created_adhoc_goal_ids = Vec::new();

        for (source_goal, _) in &plan.quarterly {
            // Re-checked here: the preview may be stale by the time of commit
            if let Some(existing) = self
                .repo
                .find_carried_copy(user_id, destination, &source_goal.id)
                .await?
            {
                tracing::debug!(
                    "Goal {} already carried into {} as {}",
                    source_goal.id,
                    destination,
                    existing.id
                );
                continue;
            }

            let copy = carried_over_goal(
                source_goal,
                destination,
                None,
                GoalDepth::Quarterly,
                ROOT_PATH,
            );
            let (copy, _state) = self
                .repo
                .insert_goal_with_state(
                    &copy,
                    &NewWeeklyGoalState {
                        week_number,
                        daily: None,
                    },
                )
                .await?;

            tracing::info!(
                "Carried goal {} into {} as {}",
                source_goal.id,
                destination,
                copy.id
            );
            created_goal_ids.push(copy.id);
        }

        for (source_goal, _) in &plan.adhoc {
            if self
                .repo
                .find_adhoc_copy(user_id, destination, &source_goal.id)
                .await?
                .is_some()
            {
                tracing::debug!("Adhoc goal {} already copied", source_goal.id);
                continue;
            }

            let req = CreateAdhocGoalRequest {
                title: source_goal.title.clone(),
                details: source_goal.details.clone(),
                domain_id: source_goal.domain_id.clone(),
                year: destination.year,
                week_number,
                day_of_week: source_goal.day_of_week,
                due_date: source_goal.due_date,
            };
            let copy = self
                .repo
                .create_adhoc_goal(user_id, &req, Some(&source_goal.id))
                .await?;

            tracing::info!("Copied adhoc goal {} as {}", source_goal.id, copy.id);
            created_adhoc_goal_ids.push(copy.id);
        }

        Ok((created_goal_ids, created_adhoc_goal_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::{create_test_repo, goal};
    use crate::database::{CarryOver, CarryOverSource};

    fn q1() -> Period {
        Period::new(2025, 1).unwrap()
    }

    fn q2() -> Period {
        Period::new(2025, 2).unwrap()
    }

    async fn insert_with_week(repo: &Repository, goal: &Goal, week_number: i32) {
        repo.insert_goal_with_state(
            goal,
            &NewWeeklyGoalState {
                week_number,
                daily: None,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_max_week_no_children() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo.clone());

        let quarterly = goal("u1", q1(), "Q", GoalDepth::Quarterly, None, None);
        repo.insert_goal(&quarterly).await.unwrap();

        let scan = service
            .find_max_week_for_quarterly_goal("u1", &quarterly.id, q1())
            .await
            .unwrap();

        assert!(scan.is_empty());
        assert!(scan.child_ids_in_max_week.is_empty());
    }

    #[tokio::test]
    async fn test_max_week_children_without_state() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo.clone());

        let quarterly = goal("u1", q1(), "Q", GoalDepth::Quarterly, None, None);
        let weekly = goal("u1", q1(), "W", GoalDepth::Weekly, Some(&quarterly), None);
        repo.insert_goal(&quarterly).await.unwrap();
        repo.insert_goal(&weekly).await.unwrap();

        let scan = service
            .find_max_week_for_quarterly_goal("u1", &quarterly.id, q1())
            .await
            .unwrap();

        assert!(scan.is_empty());
    }

    #[tokio::test]
    async fn test_max_week_picks_latest_week() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo.clone());

        let quarterly = goal("u1", q1(), "Q", GoalDepth::Quarterly, None, None);
        let w1 = goal("u1", q1(), "W1", GoalDepth::Weekly, Some(&quarterly), None);
        let w2 = goal("u1", q1(), "W2", GoalDepth::Weekly, Some(&quarterly), None);
        repo.insert_goal(&quarterly).await.unwrap();
        insert_with_week(&repo, &w1, 3).await;
        insert_with_week(&repo, &w2, 5).await;

        let scan = service
            .find_max_week_for_quarterly_goal("u1", &quarterly.id, q1())
            .await
            .unwrap();

        assert_eq!(scan.max_week, Some(5));
        assert_eq!(scan.child_ids_in_max_week, BTreeSet::from([w2.id.clone()]));
        assert_eq!(scan.states_in_max_week.len(), 1);
    }

    #[tokio::test]
    async fn test_max_week_rejects_non_quarterly_goal() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo.clone());

        let quarterly = goal("u1", q1(), "Q", GoalDepth::Quarterly, None, None);
        let weekly = goal("u1", q1(), "W", GoalDepth::Weekly, Some(&quarterly), None);
        repo.insert_goal(&quarterly).await.unwrap();
        repo.insert_goal(&weekly).await.unwrap();

        let err = service
            .find_max_week_for_quarterly_goal("u1", &weekly.id, q1())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }

    #[tokio::test]
    async fn test_preview_writes_nothing() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo.clone());

        let quarterly = goal("u1", q1(), "Q", GoalDepth::Quarterly, None, None);
        repo.insert_goal(&quarterly).await.unwrap();

        for _ in 0..2 {
            let report = service.preview_or_commit("u1", q1(), q2(), true).await.unwrap();
            assert_eq!(report.quarterly_goals_to_copy.len(), 1);
            assert!(report.created_goal_ids.is_empty());
        }

        let destination = repo.list_goals_for_period("u1", q2()).await.unwrap();
        assert!(destination.is_empty());
    }

    #[tokio::test]
    async fn test_selection_skips_complete_and_finished_goals() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo.clone());

        let mut done = goal("u1", q1(), "Done", GoalDepth::Quarterly, None, None);
        done.is_complete = true;
        let finished = goal("u1", q1(), "All weeks done", GoalDepth::Quarterly, None, None);
        let mut finished_child =
            goal("u1", q1(), "W", GoalDepth::Weekly, Some(&finished), None);
        finished_child.is_complete = true;
        let open = goal("u1", q1(), "Open", GoalDepth::Quarterly, None, None);

        for g in [&done, &finished, &finished_child, &open] {
            repo.insert_goal(g).await.unwrap();
        }

        let report = service.preview_or_commit("u1", q1(), q2(), true).await.unwrap();

        let ids: Vec<&str> = report
            .quarterly_goals_to_copy
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec![open.id.as_str()]);
    }

    #[tokio::test]
    async fn test_selection_copies_latest_instance_once() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo.clone());

        let original = goal("u1", q1(), "Q", GoalDepth::Quarterly, None, None);
        repo.insert_goal(&original).await.unwrap();

        let mut again = goal(
            "u1",
            q1(),
            "Q",
            GoalDepth::Quarterly,
            None,
            Some(CarryOver {
                num_weeks: 1,
                from_goal: CarryOverSource {
                    previous_goal_id: original.id.clone(),
                    root_goal_id: original.id.clone(),
                },
            }),
        );
        again.created_at = original.created_at + chrono::Duration::seconds(1);
        repo.insert_goal(&again).await.unwrap();

        let report = service.preview_or_commit("u1", q1(), q2(), false).await.unwrap();

        assert_eq!(report.quarterly_goals_to_copy.len(), 1);
        assert_eq!(report.quarterly_goals_to_copy[0].id, again.id);
        assert_eq!(report.quarterly_goals_to_copy[0].num_weeks, 2);
        assert_eq!(report.created_goal_ids.len(), 1);

        let copy = repo
            .get_owned_goal("u1", &report.created_goal_ids[0])
            .await
            .unwrap();
        let carry = copy.carry_over.unwrap();
        assert_eq!(carry.from_goal.root_goal_id, original.id);
        assert_eq!(carry.from_goal.previous_goal_id, again.id);
    }

    #[tokio::test]
    async fn test_commit_retry_does_not_duplicate() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo.clone());

        let quarterly = goal("u1", q1(), "Q", GoalDepth::Quarterly, None, None);
        repo.insert_goal(&quarterly).await.unwrap();

        let first = service.preview_or_commit("u1", q1(), q2(), false).await.unwrap();
        assert_eq!(first.created_goal_ids.len(), 1);

        let second = service.preview_or_commit("u1", q1(), q2(), false).await.unwrap();
        assert!(second.created_goal_ids.is_empty());
        assert!(second.quarterly_goals_to_copy[0].already_migrated);

        let destination = repo.list_goals_for_period("u1", q2()).await.unwrap();
        assert_eq!(destination.len(), 1);
    }

    #[tokio::test]
    async fn test_adhoc_goals_preview_and_commit() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo.clone());

        let req = CreateAdhocGoalRequest {
            title: "Renew passport".to_string(),
            details: None,
            domain_id: Some("admin".to_string()),
            year: 2025,
            week_number: 6,
            day_of_week: Some(3),
            due_date: None,
        };
        let source = repo.create_adhoc_goal("u1", &req, None).await.unwrap();

        let preview = service.preview_or_commit("u1", q1(), q2(), true).await.unwrap();
        assert_eq!(preview.adhoc_goals_to_copy.len(), 1);
        assert_eq!(preview.adhoc_goals_to_copy[0].domain_id.as_deref(), Some("admin"));
        assert!(repo.find_adhoc_copy("u1", q2(), &source.id).await.unwrap().is_none());

        let commit = service.preview_or_commit("u1", q1(), q2(), false).await.unwrap();
        assert_eq!(commit.created_adhoc_goal_ids.len(), 1);

        let copy = repo.find_adhoc_copy("u1", q2(), &source.id).await.unwrap().unwrap();
        assert_eq!(copy.week_number, q2().first_week().unwrap());
        assert_eq!(copy.day_of_week, Some(3));

        // The copy sits in the shared boundary week and is not picked up again
        let retry = service.preview_or_commit("u1", q1(), q2(), false).await.unwrap();
        assert!(retry.created_adhoc_goal_ids.is_empty());
        assert_eq!(retry.adhoc_goals_to_copy.len(), 1);
        assert!(retry.adhoc_goals_to_copy[0].already_migrated);
    }

    #[tokio::test]
    async fn test_adhoc_goal_pulled_into_two_periods() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo.clone());
        let q3 = Period::new(2025, 3).unwrap();

        let req = CreateAdhocGoalRequest {
            title: "Book flights".to_string(),
            details: None,
            domain_id: None,
            year: 2025,
            week_number: 8,
            day_of_week: None,
            due_date: None,
        };
        let source = repo.create_adhoc_goal("u1", &req, None).await.unwrap();

        let into_q2 = service.preview_or_commit("u1", q1(), q2(), false).await.unwrap();
        assert_eq!(into_q2.created_adhoc_goal_ids.len(), 1);

        let preview = service.preview_or_commit("u1", q1(), q3, true).await.unwrap();
        assert_eq!(preview.adhoc_goals_to_copy.len(), 1);
        assert_eq!(preview.adhoc_goals_to_copy[0].id, source.id);
        assert!(!preview.adhoc_goals_to_copy[0].already_migrated);

        let into_q3 = service.preview_or_commit("u1", q1(), q3, false).await.unwrap();
        assert_eq!(into_q3.created_adhoc_goal_ids.len(), 1);

        let copy = repo.find_adhoc_copy("u1", q3, &source.id).await.unwrap().unwrap();
        assert_eq!(copy.id, into_q3.created_adhoc_goal_ids[0]);
        assert_eq!(copy.week_number, q3.first_week().unwrap());

        let retry = service.preview_or_commit("u1", q1(), q3, false).await.unwrap();
        assert!(retry.created_adhoc_goal_ids.is_empty());
    }

    #[tokio::test]
    async fn test_migrating_into_same_period_is_rejected() {
        let repo = create_test_repo().await;
        let service = MigrationService::new(repo);

        let err = service
            .preview_or_commit("u1", q1(), q1(), true)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }
}
