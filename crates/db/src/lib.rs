//! `db` crate — pure persistence layer, plus a [`PostgresDbService`] adapter
//! implementing `engine`'s `DbService` trait over it.
//!
//! The repository functions carry no business logic: they are pure SQL.
//! `postgres.rs` is the only place that bridges them to the engine's
//! domain-facing service trait.

pub mod error;
pub mod models;
pub mod pool;
pub mod postgres;
pub mod repository;

pub use error::DbError;
pub use pool::DbPool;
pub use postgres::PostgresDbService;
