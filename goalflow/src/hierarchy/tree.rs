//! Tree builder
//!
//! Turns a flat list of goals into the quarterly → weekly → daily tree.
//! Nodes live in an arena indexed by id, so parents are found with one
//! lookup and no node is ever reachable from two parents.

use crate::database::{Goal, GoalDepth};
use crate::error::{AppError, Result};
use serde::Serialize;
use std::collections::HashMap;

/// A goal in the tree plus whatever the caller attached to it
#[derive(Debug, Clone)]
pub struct TreeNode<T> {
    pub goal: Goal,
    /// Full materialized path of this goal
    pub path: String,
    pub attached: T,
    children: Vec<usize>,
}

/// Arena-backed goal tree
#[derive(Debug, Clone)]
pub struct GoalTree<T> {
    nodes: Vec<TreeNode<T>>,
    index: HashMap<String, usize>,
    roots: Vec<usize>,
    orphans: Vec<usize>,
}

/// Owned nested form of a tree node, ready to hand to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct NestedGoal<T> {
    #[serde(flatten)]
    pub goal: Goal,
    pub path: String,
    pub attached: T,
    pub children: Vec<NestedGoal<T>>,
}

/// Build a tree from goals of one owner and period.
///
/// `attach` runs once per goal while the index is built and its result is
/// stored on the node. Weekly/daily goals whose parent is not in `goals`
/// are kept aside as orphans; a weekly/daily goal with no parent id at all,
/// a quarterly goal with one, a parent at the wrong depth, or a repeated id
/// is a structural fault.
pub fn build_tree<T, F>(goals: Vec<Goal>, mut attach: F) -> Result<GoalTree<T>>
where
    F: FnMut(&Goal) -> T,
{
    let mut nodes: Vec<TreeNode<T>> = Vec::with_capacity(goals.len());
    let mut index = HashMap::with_capacity(goals.len());

    for goal in goals {
        match (goal.depth, goal.parent_id.is_some()) {
            (GoalDepth::Quarterly, true) => {
                return Err(AppError::StructuralFault(format!(
                    "quarterly goal {} has a parent",
                    goal.id
                )));
            }
            (GoalDepth::Weekly | GoalDepth::Daily, false) => {
                return Err(AppError::StructuralFault(format!(
                    "{:?} goal {} is missing its parent",
                    goal.depth, goal.id
                )));
            }
            _ => {}
        }

        if index.contains_key(&goal.id) {
            return Err(AppError::StructuralFault(format!(
                "goal {} appears twice",
                goal.id
            )));
        }

        let attached = attach(&goal);
        index.insert(goal.id.clone(), nodes.len());
        nodes.push(TreeNode {
            path: goal.path(),
            goal,
            attached,
            children: Vec::new(),
        });
    }

    let mut roots = Vec::new();
    let mut orphans = Vec::new();

    for idx in 0..nodes.len() {
        let node = &nodes[idx];
        let expected_parent_depth = match node.goal.depth.parent() {
            None => {
                roots.push(idx);
                continue;
            }
            Some(depth) => depth,
        };

        let parent_idx = node
            .goal
            .parent_id
            .as_deref()
            .and_then(|parent_id| index.get(parent_id).copied());

        let Some(parent_idx) = parent_idx else {
            // Parent belongs to a period or fetch we were not given
            orphans.push(idx);
            continue;
        };

        if nodes[parent_idx].goal.depth != expected_parent_depth {
            return Err(AppError::StructuralFault(format!(
                "goal {} at {:?} has parent {} at {:?}",
                nodes[idx].goal.id,
                nodes[idx].goal.depth,
                nodes[parent_idx].goal.id,
                nodes[parent_idx].goal.depth
            )));
        }

        nodes[parent_idx].children.push(idx);
    }

    if !orphans.is_empty() {
        tracing::debug!("Tree built with {} orphaned goals", orphans.len());
    }

    Ok(GoalTree {
        nodes,
        index,
        roots,
        orphans,
    })
}

impl<T> GoalTree<T> {
    pub fn roots(&self) -> impl Iterator<Item = &TreeNode<T>> {
        self.roots.iter().map(|&idx| &self.nodes[idx])
    }

    /// Goals whose parent was not among the input; their own children
    /// stay attached to them
    pub fn orphans(&self) -> impl Iterator<Item = &TreeNode<T>> {
        self.orphans.iter().map(|&idx| &self.nodes[idx])
    }

    pub fn children<'a>(&'a self, node: &'a TreeNode<T>) -> impl Iterator<Item = &'a TreeNode<T>> {
        node.children.iter().map(|&idx| &self.nodes[idx])
    }

    /// O(1) lookup by goal id
    pub fn get(&self, id: &str) -> Option<&TreeNode<T>> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes reachable from the roots
    pub fn reachable_count(&self) -> usize {
        self.subtree_count(&self.roots)
    }

    /// Number of nodes hanging off orphans, the orphans included.
    /// Together with `reachable_count` this accounts for every input goal.
    pub fn unattached_count(&self) -> usize {
        self.subtree_count(&self.orphans)
    }

    fn subtree_count(&self, starts: &[usize]) -> usize {
        let mut count = 0;
        let mut stack: Vec<usize> = starts.to_vec();

        while let Some(idx) = stack.pop() {
            count += 1;
            stack.extend(self.nodes[idx].children.iter().copied());
        }

        count
    }

    /// Consume the arena into nested roots
    pub fn into_nested(self) -> Vec<NestedGoal<T>> {
        let roots = self.roots;
        let mut slots: Vec<Option<TreeNode<T>>> = self.nodes.into_iter().map(Some).collect();

        roots
            .into_iter()
            .filter_map(|idx| take_nested(&mut slots, idx))
            .collect()
    }
}

fn take_nested<T>(slots: &mut [Option<TreeNode<T>>], idx: usize) -> Option<NestedGoal<T>> {
    let node = slots.get_mut(idx)?.take()?;

    let children = node
        .children
        .iter()
        .filter_map(|&child| take_nested(slots, child))
        .collect();

    Some(NestedGoal {
        goal: node.goal,
        path: node.path,
        attached: node.attached,
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ROOT_PATH;
    use chrono::Utc;

    fn goal(id: &str, depth: GoalDepth, parent: Option<&Goal>) -> Goal {
        let now = Utc::now();
        Goal {
            id: id.to_string(),
            user_id: "u1".to_string(),
            year: 2025,
            quarter: 1,
            title: id.to_uppercase(),
            details: None,
            parent_id: parent.map(|p| p.id.clone()),
            depth,
            in_path: parent
                .map(|p| p.path())
                .unwrap_or_else(|| ROOT_PATH.to_string()),
            is_complete: false,
            completed_at: None,
            carry_over: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample() -> Vec<Goal> {
        let q = goal("q", GoalDepth::Quarterly, None);
        let w1 = goal("w1", GoalDepth::Weekly, Some(&q));
        let w2 = goal("w2", GoalDepth::Weekly, Some(&q));
        let d1 = goal("d1", GoalDepth::Daily, Some(&w1));
        let q2 = goal("q2", GoalDepth::Quarterly, None);
        // Children listed before parents on purpose
        vec![d1, w2, w1, q, q2]
    }

    #[test]
    fn test_build_tree_is_complete() {
        let goals = sample();
        let total = goals.len();

        let tree = build_tree(goals, |_| ()).unwrap();

        assert_eq!(tree.len(), total);
        assert_eq!(tree.reachable_count(), total);
        assert_eq!(tree.orphans().count(), 0);

        let root_ids: Vec<&str> = tree.roots().map(|n| n.goal.id.as_str()).collect();
        assert_eq!(root_ids, vec!["q", "q2"]);

        let q = tree.get("q").unwrap();
        let weekly: Vec<&str> = tree.children(q).map(|n| n.goal.id.as_str()).collect();
        assert_eq!(weekly, vec!["w2", "w1"]);

        let w1 = tree.get("w1").unwrap();
        assert_eq!(tree.children(w1).count(), 1);
        assert_eq!(tree.get("d1").unwrap().path, "/q/w1/d1");
    }

    #[test]
    fn test_unresolved_parent_becomes_orphan() {
        let elsewhere = goal("old-q", GoalDepth::Quarterly, None);
        let stray = goal("stray", GoalDepth::Weekly, Some(&elsewhere));
        let q = goal("q", GoalDepth::Quarterly, None);

        let tree = build_tree(vec![q, stray], |_| ()).unwrap();

        assert_eq!(tree.reachable_count(), 1);
        let orphans: Vec<&str> = tree.orphans().map(|n| n.goal.id.as_str()).collect();
        assert_eq!(orphans, vec!["stray"]);
        assert_eq!(tree.reachable_count() + orphans.len(), tree.len());
    }

    #[test]
    fn test_orphan_subtrees_are_counted() {
        let elsewhere = goal("old-q", GoalDepth::Quarterly, None);
        let stray = goal("stray", GoalDepth::Weekly, Some(&elsewhere));
        let day = goal("day", GoalDepth::Daily, Some(&stray));

        let tree = build_tree(vec![stray, day], |_| ()).unwrap();

        assert_eq!(tree.orphans().count(), 1);
        assert_eq!(tree.reachable_count(), 0);
        assert_eq!(tree.unattached_count(), 2);
        assert_eq!(tree.reachable_count() + tree.unattached_count(), tree.len());
    }

    #[test]
    fn test_missing_parent_id_is_structural_fault() {
        let mut weekly = goal("w", GoalDepth::Weekly, None);
        weekly.parent_id = None;

        let err = build_tree(vec![weekly], |_| ()).unwrap_err();
        assert_eq!(err.code(), "structural_fault");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_parent_at_wrong_depth_is_structural_fault() {
        let q = goal("q", GoalDepth::Quarterly, None);
        let daily = goal("d", GoalDepth::Daily, Some(&q));

        let err = build_tree(vec![q, daily], |_| ()).unwrap_err();
        assert_eq!(err.code(), "structural_fault");
    }

    #[test]
    fn test_attach_runs_once_per_node() {
        let mut calls = 0;
        let tree = build_tree(sample(), |g| {
            calls += 1;
            g.title.len()
        })
        .unwrap();

        assert_eq!(calls, 5);
        assert_eq!(tree.get("w1").unwrap().attached, 2);
    }

    #[test]
    fn test_into_nested() {
        let nested = build_tree(sample(), |_| ()).unwrap().into_nested();

        assert_eq!(nested.len(), 2);
        let q = &nested[0];
        assert_eq!(q.goal.id, "q");
        assert_eq!(q.children.len(), 2);

        let w1 = q.children.iter().find(|c| c.goal.id == "w1").unwrap();
        assert_eq!(w1.children[0].goal.id, "d1");
    }
}
