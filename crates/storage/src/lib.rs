//! `storage` crate — [`engine::StorageService`] adapters.

pub mod local;

pub use local::LocalStorageService;
