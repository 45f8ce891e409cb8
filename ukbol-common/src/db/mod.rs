//! Database models and store operations
//!
//! Each entity module implements the store contract for one table:
//! bulk delete, ordered batch insert, point lookup, filtered/ordered/paged
//! queries and distinct-value lookups.

pub mod init;
pub mod models;
pub mod pantheon;
pub mod specimens;
pub mod status;
pub mod synonyms;
pub mod taxa;

pub use init::*;
pub use models::*;

/// Upper bound on bind parameters in one statement (SQLite allows 32766)
pub(crate) const MAX_BIND_PARAMS: usize = 30_000;
