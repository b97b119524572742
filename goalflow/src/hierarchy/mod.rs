//! Goal hierarchy
//!
//! Pure functions over goal records: tree assembly and carry-over lineage.
//! Nothing here touches the database.

pub mod lineage;
pub mod tree;

pub use lineage::{carried_over_goal, deduplicate_by_root, next_carry_over};
pub use tree::{build_tree, GoalTree, NestedGoal, TreeNode};
