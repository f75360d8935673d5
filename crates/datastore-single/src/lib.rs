#![doc = include_str!("../README.md")]

mod error;
mod single_store;

pub use error::SingleStoreError;
pub use single_store::{SingleDataStore, SingleStore, ValueStream};
