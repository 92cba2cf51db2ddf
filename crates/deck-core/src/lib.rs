pub mod access;
pub mod broker;
pub mod error;
pub mod events;
pub mod namespace;
pub mod paths;
pub mod storage;
pub mod store;
pub mod tree;
pub mod types;

pub use error::{DeckError, Result};
