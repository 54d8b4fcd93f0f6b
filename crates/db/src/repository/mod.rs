//! Repository functions — one function per database operation.
//!
//! Every function takes a `&DbPool` and returns a `Result<T, DbError>`.
//! No business logic, no domain types — pure SQL. Queries are built with
//! the runtime `sqlx::query`/`query_as` API rather than the `query!`
//! compile-time macros, since those require a live database reachable at
//! build time; see `DESIGN.md` for the tradeoff this makes.

pub mod executions;
pub mod nodes;
pub mod workflows;
