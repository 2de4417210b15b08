//! Stack graph discovery
//!
//! Builds the tree of PRs rooted at a given PR by treating every open PR that
//! targets a branch as that branch's child.

mod discover;

pub use discover::{
    ChildEdge, StackNode, collect_stack_ids, discover, discover_with_visited, find_children,
    needs_restack,
};
