use super::Executor;
use crate::storage::tuple::Tuple;

/// Grounded on `original_source/aggregation_executor.h`'s `AggregationType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationType {
    Count,
    Sum,
    Min,
    Max,
}

/// A pipeline breaker: drains its child completely over `val1` on the first
/// `next`, computing all four statistics in one pass, then emits a single
/// tuple (`id = 0`, `val2 = ""`, `val1` = the requested aggregate).
/// Subsequent `next` calls return `None` — including when the child
/// produced zero tuples (spec.md §4.5, §9 open question 3: COUNT over an
/// empty stream emits nothing, not zero).
///
/// Grounded on `original_source/aggregation_executor.{h,cpp}`.
pub struct AggregationExecutor<'a> {
    child: &'a mut dyn Executor,
    aggr_type: AggregationType,
    done: bool,
    initialized: bool,
}

impl<'a> AggregationExecutor<'a> {
    pub fn new(child: &'a mut dyn Executor, aggr_type: AggregationType) -> Self {
        AggregationExecutor {
            child,
            aggr_type,
            done: false,
            initialized: false,
        }
    }
}

impl Executor for AggregationExecutor<'_> {
    fn init(&mut self) {
        self.child.init();
        self.done = false;
        self.initialized = true;
    }

    fn next(&mut self) -> Option<Tuple> {
        debug_assert!(self.initialized, "next() called before init()");
        if self.done {
            return None;
        }
        self.done = true;

        let mut count: i64 = 0;
        let mut sum: i64 = 0;
        let mut min = i64::MAX;
        let mut max = i64::MIN;
        while let Some(tuple) = self.child.next() {
            count += 1;
            sum += tuple.val1;
            min = min.min(tuple.val1);
            max = max.max(tuple.val1);
        }
        if count == 0 {
            return None;
        }

        let val1 = match self.aggr_type {
            AggregationType::Count => count,
            AggregationType::Sum => sum,
            AggregationType::Min => min,
            AggregationType::Max => max,
        };
        Some(Tuple::new(0, val1, ""))
    }
}
