pub mod events;
pub mod storage;
pub mod tree;
