use super::Executor;
use crate::storage::tuple::{Table, Tuple};

/// Executes a full, unfiltered scan of a `Table`.
///
/// Grounded on `original_source/seq_scan_executor.{h,cpp}`; `iter_`, a
/// `vector<Tuple>::iterator`, becomes a plain cursor index since `Table`
/// exposes a slice rather than a node-based container.
pub struct SeqScanExecutor<'a> {
    table: &'a Table,
    iter: std::slice::Iter<'a, Tuple>,
    initialized: bool,
}

impl<'a> SeqScanExecutor<'a> {
    pub fn new(table: &'a Table) -> Self {
        SeqScanExecutor {
            table,
            iter: table.iter(),
            initialized: false,
        }
    }
}

impl Executor for SeqScanExecutor<'_> {
    fn init(&mut self) {
        self.iter = self.table.iter();
        self.initialized = true;
    }

    fn next(&mut self) -> Option<Tuple> {
        debug_assert!(self.initialized, "next() called before init()");
        self.iter.next().cloned()
    }
}
