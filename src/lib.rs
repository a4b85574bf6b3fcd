//! A disk-agnostic B+ tree index and a Volcano-style tuple-at-a-time
//! execution engine, built for teaching: every structural mutation and
//! every iterator contract is spelled out rather than hidden behind a
//! storage engine or a query planner.
//!
//! See [`storage::btree::BPlusTree`] for the index and [`exec`] for the
//! executor tree. Both operate over the same minimal row shape,
//! [`storage::tuple::Tuple`], held in an in-memory [`storage::tuple::Table`].

pub mod error;
pub mod exec;
pub mod storage;

pub use error::{BTreeError, ExecError};
pub use exec::{
    AggregationExecutor, AggregationType, Executor, FilterOp, FilterPredicate,
    FilterSeqScanExecutor, HashJoinExecutor, JoinAttribute, NestedLoopJoinExecutor,
    SeqScanExecutor, SimpleHashFunction,
};
pub use storage::{BPlusTree, RecordPointer, Table, Tuple, DEFAULT_FANOUT};
