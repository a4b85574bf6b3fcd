//! Test-only invariant auditor. Not part of the public contract in
//! spec.md §4.1 — used by the randomized property tests (spec.md §8) to
//! verify every mutation leaves the tree well-formed, the same role
//! `other_examples`'s `small-db` integration tests give their
//! `check_integrity()` helper.

use super::node::{Key, Node};
use super::{min_keys, BPlusTree};
use crate::error::BTreeError;

impl<const MAX_FANOUT: usize> BPlusTree<MAX_FANOUT> {
    pub(crate) fn check_invariants(&self) -> Result<(), BTreeError> {
        let Some(root_id) = self.root else {
            return Ok(());
        };

        // Depth + per-node occupancy, ascending keys, and the
        // separator-routing rule (spec.md §3 invariants 1, 3, 4, 5).
        let mut leaf_depths = Vec::new();
        self.walk(root_id, 0, true, &mut leaf_depths)?;
        if let (Some(first), Some(last)) = (leaf_depths.first(), leaf_depths.last()) {
            if leaf_depths.iter().any(|d| d != first) {
                return Err(BTreeError::InvariantViolation(format!(
                    "leaves at unequal depths: {leaf_depths:?}"
                )));
            }
            let _ = last;
        }

        // Sibling list, traversed forward from the leftmost leaf, matches
        // an in-order key sequence (spec.md §3 invariant 6).
        let mut leftmost = root_id;
        loop {
            match self.arena.get(leftmost) {
                Node::Leaf(_) => break,
                Node::Internal(internal) => leftmost = internal.children[0],
            }
        }
        if self.arena.get(leftmost).as_leaf().prev.is_some() {
            return Err(BTreeError::InvariantViolation(
                "leftmost leaf has a prev sibling".into(),
            ));
        }
        let mut forward_keys = Vec::new();
        let mut cursor = Some(leftmost);
        let mut last_id = leftmost;
        while let Some(id) = cursor {
            let leaf = self.arena.get(id).as_leaf();
            forward_keys.extend(leaf.keys.iter().copied());
            last_id = id;
            cursor = leaf.next;
        }
        if self.arena.get(last_id).as_leaf().next.is_some() {
            return Err(BTreeError::InvariantViolation(
                "rightmost leaf has a next sibling".into(),
            ));
        }
        let mut in_order = Vec::new();
        self.collect_in_order(root_id, &mut in_order);
        if forward_keys != in_order {
            return Err(BTreeError::InvariantViolation(format!(
                "sibling-list order {forward_keys:?} != in-order traversal {in_order:?}"
            )));
        }

        Ok(())
    }

    fn walk(
        &self,
        node_id: super::NodeId,
        depth: usize,
        is_root: bool,
        leaf_depths: &mut Vec<usize>,
    ) -> Result<(), BTreeError> {
        match self.arena.get(node_id) {
            Node::Leaf(leaf) => {
                if !is_root && leaf.keys.len() < min_keys(MAX_FANOUT) {
                    return Err(BTreeError::InvariantViolation(format!(
                        "leaf below minimum occupancy: {} keys",
                        leaf.keys.len()
                    )));
                }
                if leaf.keys.len() > MAX_FANOUT - 1 {
                    return Err(BTreeError::InvariantViolation(format!(
                        "leaf above maximum occupancy: {} keys",
                        leaf.keys.len()
                    )));
                }
                if !is_sorted_strict(&leaf.keys) {
                    return Err(BTreeError::InvariantViolation(format!(
                        "leaf keys not strictly ascending: {:?}",
                        leaf.keys
                    )));
                }
                if leaf.keys.len() != leaf.pointers.len() {
                    return Err(BTreeError::InvariantViolation(
                        "leaf keys/pointers length mismatch".into(),
                    ));
                }
                leaf_depths.push(depth);
                Ok(())
            }
            Node::Internal(internal) => {
                if !is_root && internal.keys.len() < min_keys(MAX_FANOUT) {
                    return Err(BTreeError::InvariantViolation(format!(
                        "internal node below minimum occupancy: {} keys",
                        internal.keys.len()
                    )));
                }
                if internal.keys.len() > MAX_FANOUT - 1 {
                    return Err(BTreeError::InvariantViolation(format!(
                        "internal node above maximum occupancy: {} keys",
                        internal.keys.len()
                    )));
                }
                if internal.children.len() != internal.keys.len() + 1 {
                    return Err(BTreeError::InvariantViolation(
                        "internal node children/keys count mismatch".into(),
                    ));
                }
                if !is_sorted_strict(&internal.keys) {
                    return Err(BTreeError::InvariantViolation(format!(
                        "internal keys not strictly ascending: {:?}",
                        internal.keys
                    )));
                }
                for (i, &child_id) in internal.children.iter().enumerate() {
                    let subtree_keys = self.subtree_key_range(child_id);
                    if let Some((min, max)) = subtree_keys {
                        if i < internal.keys.len() && max >= internal.keys[i] {
                            return Err(BTreeError::InvariantViolation(format!(
                                "child {i} has key {max} >= separator {}",
                                internal.keys[i]
                            )));
                        }
                        if i > 0 && min < internal.keys[i - 1] {
                            return Err(BTreeError::InvariantViolation(format!(
                                "child {i} has key {min} < separator {}",
                                internal.keys[i - 1]
                            )));
                        }
                    }
                    self.walk(child_id, depth + 1, false, leaf_depths)?;
                }
                Ok(())
            }
        }
    }

    fn subtree_key_range(&self, node_id: super::NodeId) -> Option<(Key, Key)> {
        match self.arena.get(node_id) {
            Node::Leaf(leaf) => {
                let min = *leaf.keys.first()?;
                let max = *leaf.keys.last()?;
                Some((min, max))
            }
            Node::Internal(internal) => {
                let first_child = *internal.children.first()?;
                let last_child = *internal.children.last()?;
                let (min, _) = self.subtree_key_range(first_child)?;
                let (_, max) = self.subtree_key_range(last_child)?;
                Some((min, max))
            }
        }
    }

    fn collect_in_order(&self, node_id: super::NodeId, out: &mut Vec<Key>) {
        match self.arena.get(node_id) {
            Node::Leaf(leaf) => out.extend(leaf.keys.iter().copied()),
            Node::Internal(internal) => {
                for &child in &internal.children {
                    self.collect_in_order(child, out);
                }
            }
        }
    }
}

fn is_sorted_strict(keys: &[Key]) -> bool {
    keys.windows(2).all(|w| w[0] < w[1])
}
