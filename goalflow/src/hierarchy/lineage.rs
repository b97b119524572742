//! Carry-over lineage
//!
//! A goal copied into a later period remembers the goal it came from and
//! the first goal of its chain. The root is transitive: copying a copy
//! points at the original, never at the intermediate instance.

use crate::database::{CarryOver, CarryOverSource, Goal, GoalDepth};
use crate::period::Period;
use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

/// Lineage for the next copy of `source`
pub fn next_carry_over(source: &Goal) -> CarryOver {
    let num_weeks = source
        .carry_over
        .as_ref()
        .map(|carry| carry.num_weeks)
        .unwrap_or(0);

    CarryOver {
        num_weeks: num_weeks + 1,
        from_goal: CarryOverSource {
            previous_goal_id: source.id.clone(),
            root_goal_id: source.root_goal_id().to_string(),
        },
    }
}

/// Unsaved copy of `source` placed in `destination`.
///
/// Only title and details travel; completion, stars, pins and logs belong
/// to the source period.
pub fn carried_over_goal(
    source: &Goal,
    destination: Period,
    parent_id: Option<&str>,
    depth: GoalDepth,
    in_path: &str,
) -> Goal {
    let now = Utc::now();

    Goal {
        id: Uuid::new_v4().to_string(),
        user_id: source.user_id.clone(),
        year: destination.year,
        quarter: destination.quarter,
        title: source.title.clone(),
        details: source.details.clone(),
        parent_id: parent_id.map(str::to_string),
        depth,
        in_path: in_path.to_string(),
        is_complete: false,
        completed_at: None,
        carry_over: Some(next_carry_over(source)),
        created_at: now,
        updated_at: now,
    }
}

/// Keep the first goal seen for each lineage root, preserving input order.
///
/// Callers wanting the latest instance of each lineage sort newest first.
pub fn deduplicate_by_root(goals: Vec<Goal>) -> Vec<Goal> {
    let mut seen = HashSet::new();

    goals
        .into_iter()
        .filter(|goal| seen.insert(goal.root_goal_id().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ROOT_PATH;

    fn quarterly(id: &str) -> Goal {
        let now = Utc::now();
        Goal {
            id: id.to_string(),
            user_id: "u1".to_string(),
            year: 2025,
            quarter: 1,
            title: format!("Goal {}", id),
            details: Some("notes".to_string()),
            parent_id: None,
            depth: GoalDepth::Quarterly,
            in_path: ROOT_PATH.to_string(),
            is_complete: true,
            completed_at: Some(now),
            carry_over: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_lineage_is_transitive() {
        let a = quarterly("a");
        let q2 = Period::new(2025, 2).unwrap();
        let q3 = Period::new(2025, 3).unwrap();

        let b = carried_over_goal(&a, q2, None, GoalDepth::Quarterly, ROOT_PATH);
        let b_carry = b.carry_over.clone().unwrap();
        assert_eq!(b_carry.num_weeks, 1);
        assert_eq!(b_carry.from_goal.root_goal_id, "a");
        assert_eq!(b_carry.from_goal.previous_goal_id, "a");

        let c = carried_over_goal(&b, q3, None, GoalDepth::Quarterly, ROOT_PATH);
        let c_carry = c.carry_over.clone().unwrap();
        assert_eq!(c_carry.num_weeks, 2);
        assert_eq!(c_carry.from_goal.root_goal_id, "a");
        assert_eq!(c_carry.from_goal.previous_goal_id, b.id);
    }

    #[test]
    fn test_copy_takes_title_and_details_only() {
        let a = quarterly("a");
        let q2 = Period::new(2025, 2).unwrap();

        let copy = carried_over_goal(&a, q2, Some("parent"), GoalDepth::Weekly, "/parent");

        assert_ne!(copy.id, a.id);
        assert_eq!(copy.title, a.title);
        assert_eq!(copy.details, a.details);
        assert!(!copy.is_complete);
        assert!(copy.completed_at.is_none());
        assert_eq!(copy.period(), q2);
        assert_eq!(copy.parent_id.as_deref(), Some("parent"));
        assert_eq!(copy.path(), format!("/parent/{}", copy.id));
    }

    #[test]
    fn test_deduplicate_keeps_first_per_root() {
        let a = quarterly("a");
        let q2 = Period::new(2025, 2).unwrap();
        let b = carried_over_goal(&a, q2, None, GoalDepth::Quarterly, ROOT_PATH);
        let c = carried_over_goal(&b, q2, None, GoalDepth::Quarterly, ROOT_PATH);
        let x = quarterly("x");
        let y = quarterly("y");

        let input = vec![c.clone(), x, b, a, y];
        let deduped = deduplicate_by_root(input);

        let ids: Vec<&str> = deduped.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec![c.id.as_str(), "x", "y"]);
    }

    #[test]
    fn test_deduplicate_empty() {
        assert!(deduplicate_by_root(Vec::new()).is_empty());
    }
}
