#![doc = include_str!("../README.md")]

mod faulty_storage;
mod legacy;

pub use faulty_storage::FaultyStorage;
pub use legacy::LegacyFolder;
