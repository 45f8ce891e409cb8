//! ukbol-sync - Reference taxonomy and specimen synchronization
//!
//! Rebuilds the stored taxonomy from a record source (NBN feed, TSV file or
//! archive) and replaces the specimen and species traits tables from their
//! snapshots. Every rebuild is a full replace.

pub mod error;
pub mod pantheon;
pub mod rebuild;
pub mod retry;
pub mod sources;
pub mod specimens;
pub mod taxonomy;

pub use error::{Result, SyncError};
pub use pantheon::{rebuild_pantheon, PantheonReport};
pub use rebuild::{rebuild_taxonomy, RebuildContext, RebuildReport};
pub use specimens::{rebuild_specimens, SpecimenReport};
