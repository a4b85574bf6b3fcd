//! Storage-adjacent primitives: the fixed-shape tuple/table pair executors
//! scan over, and the B+ tree index built on top of `RecordPointer`.

pub mod btree;
pub mod tuple;

pub use btree::{BPlusTree, DEFAULT_FANOUT};
pub use tuple::{RecordPointer, Table, Tuple};
