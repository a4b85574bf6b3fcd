use super::Executor;
use crate::storage::tuple::{Table, Tuple};

/// Comparison against `val1` — the only attribute predicates are evaluated
/// against (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Greater,
    Less,
    Equal,
}

/// Grounded on `original_source/filter_seq_scan_executor.h`'s
/// `FilterPredicate`, marked there as "DON'T modify this class" — kept as a
/// plain value type with the same three comparisons.
#[derive(Debug, Clone, Copy)]
pub struct FilterPredicate {
    pub value: i64,
    pub op: FilterOp,
}

impl FilterPredicate {
    pub fn new(value: i64, op: FilterOp) -> Self {
        FilterPredicate { value, op }
    }

    pub fn evaluate(&self, tuple: &Tuple) -> bool {
        match self.op {
            FilterOp::Greater => tuple.val1 > self.value,
            FilterOp::Less => tuple.val1 < self.value,
            FilterOp::Equal => tuple.val1 == self.value,
        }
    }
}

/// A sequential scan that skips tuples failing a `FilterPredicate`.
/// Grounded on `original_source/filter_seq_scan_executor.{h,cpp}`.
pub struct FilterSeqScanExecutor<'a> {
    table: &'a Table,
    predicate: &'a FilterPredicate,
    iter: std::slice::Iter<'a, Tuple>,
    initialized: bool,
}

impl<'a> FilterSeqScanExecutor<'a> {
    pub fn new(table: &'a Table, predicate: &'a FilterPredicate) -> Self {
        FilterSeqScanExecutor {
            table,
            predicate,
            iter: table.iter(),
            initialized: false,
        }
    }
}

impl Executor for FilterSeqScanExecutor<'_> {
    fn init(&mut self) {
        self.iter = self.table.iter();
        self.initialized = true;
    }

    fn next(&mut self) -> Option<Tuple> {
        debug_assert!(self.initialized, "next() called before init()");
        for tuple in self.iter.by_ref() {
            if self.predicate.evaluate(tuple) {
                return Some(tuple.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::drain;

    fn sample_table() -> Table {
        let mut table = Table::new();
        for (i, v) in (1..=5).enumerate() {
            table.insert_values(i as i64 + 1, v, format!("t{v}"));
        }
        table
    }

    #[test]
    fn scenario_filter_greater_than() {
        let table = sample_table();
        let predicate = FilterPredicate::new(3, FilterOp::Greater);
        let mut exec = FilterSeqScanExecutor::new(&table, &predicate);
        let vals: Vec<_> = drain(&mut exec).into_iter().map(|t| t.val1).collect();
        assert_eq!(vals, vec![4, 5]);
    }

    #[test]
    fn filter_less_than() {
        let table = sample_table();
        let predicate = FilterPredicate::new(3, FilterOp::Less);
        let mut exec = FilterSeqScanExecutor::new(&table, &predicate);
        let vals: Vec<_> = drain(&mut exec).into_iter().map(|t| t.val1).collect();
        assert_eq!(vals, vec![1, 2]);
    }

    #[test]
    fn filter_equal() {
        let table = sample_table();
        let predicate = FilterPredicate::new(3, FilterOp::Equal);
        let mut exec = FilterSeqScanExecutor::new(&table, &predicate);
        let vals: Vec<_> = drain(&mut exec).into_iter().map(|t| t.val1).collect();
        assert_eq!(vals, vec![3]);
    }

    #[test]
    fn no_matches_yields_empty() {
        let table = sample_table();
        let predicate = FilterPredicate::new(100, FilterOp::Greater);
        let mut exec = FilterSeqScanExecutor::new(&table, &predicate);
        assert_eq!(drain(&mut exec), Vec::new());
    }

    #[test]
    #[should_panic(expected = "next() called before init()")]
    fn next_before_init_is_a_logic_error() {
        let table = sample_table();
        let predicate = FilterPredicate::new(3, FilterOp::Greater);
        let mut exec = FilterSeqScanExecutor::new(&table, &predicate);
        exec.next();
    }
}
