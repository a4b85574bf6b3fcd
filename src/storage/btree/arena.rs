//! Index-based node storage for the B+ tree.
//!
//! Nodes are never referenced by Rust pointer or lifetime; they live in a
//! single arena and are addressed by `NodeId`. This sidesteps the cyclic
//! ownership a parent/child pointer pair would otherwise need and matches the
//! arena-of-nodes shape used by the corpus' other from-scratch B+ trees
//! (`NodeId` + compact arena). Freed slots are recycled via a free list so a
//! long split/merge history doesn't leak arena capacity.

/// Opaque handle into an `Arena`. Never dereferenced directly by callers;
/// only `Arena::get`/`get_mut` resolve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display(fmt = "node#{_0}")]
pub(crate) struct NodeId(usize);

#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<usize>,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, value: T) -> NodeId {
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(value);
            NodeId(idx)
        } else {
            self.slots.push(Some(value));
            NodeId(self.slots.len() - 1)
        }
    }

    /// Removes and returns the value at `id`. Panics if `id` is dangling —
    /// every structural mutation must unlink a node from all live
    /// references before freeing it.
    pub(crate) fn dealloc(&mut self, id: NodeId) -> T {
        self.slots[id.0]
            .take()
            .expect("dealloc called on a dangling NodeId")
    }

    pub(crate) fn get(&self, id: NodeId) -> &T {
        self.slots[id.0]
            .as_ref()
            .expect("get called on a dangling NodeId")
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        self.slots[id.0]
            .as_mut()
            .expect("get_mut called on a dangling NodeId")
    }

    #[cfg(test)]
    pub(crate) fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
