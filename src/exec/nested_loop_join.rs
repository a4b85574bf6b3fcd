use super::hash_join::JoinAttribute;
use super::Executor;
use crate::storage::tuple::Tuple;

/// A textbook nested-loop join: for each right tuple, rescan the left child
/// from the start looking for matches on `join_attr`.
///
/// Grounded on `original_source/nested_loop_join_executor.{h,cpp}`, whose
/// `Next` held onto a stale `right_tuple_` across calls without a clear
/// state machine for when to pull a new one versus resume the left scan;
/// the state below is rebuilt so each call resumes the left scan exactly
/// where the previous match left off, re-pulling a right tuple and
/// restarting the left scan only once that scan is exhausted.
pub struct NestedLoopJoinExecutor<'a> {
    left: &'a mut dyn Executor,
    right: &'a mut dyn Executor,
    join_attr: JoinAttribute,
    current_right: Option<Tuple>,
    initialized: bool,
}

impl<'a> NestedLoopJoinExecutor<'a> {
    pub fn new(
        left: &'a mut dyn Executor,
        right: &'a mut dyn Executor,
        join_attr: JoinAttribute,
    ) -> Self {
        NestedLoopJoinExecutor {
            left,
            right,
            join_attr,
            current_right: None,
            initialized: false,
        }
    }

    fn attrs_match(&self, left: &Tuple, right: &Tuple) -> bool {
        match self.join_attr {
            JoinAttribute::Id => left.id == right.id,
            JoinAttribute::Val1 => left.val1 == right.val1,
            JoinAttribute::Val2 => left.val2 == right.val2,
        }
    }
}

impl Executor for NestedLoopJoinExecutor<'_> {
    fn init(&mut self) {
        self.left.init();
        self.right.init();
        self.current_right = None;
        self.initialized = true;
    }

    fn next(&mut self) -> Option<Tuple> {
        debug_assert!(self.initialized, "next() called before init()");
        loop {
            if self.current_right.is_none() {
                let right_tuple = self.right.next()?;
                self.left.init();
                self.current_right = Some(right_tuple);
            }

            let right_tuple = self.current_right.clone().expect("checked above");
            match self.left.next() {
                Some(left_tuple) => {
                    if self.attrs_match(&left_tuple, &right_tuple) {
                        return Some(left_tuple);
                    }
                }
                None => self.current_right = None,
            }
        }
    }
}
