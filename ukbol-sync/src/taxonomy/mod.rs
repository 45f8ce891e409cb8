//! Taxonomy graph pipeline: build, filter, resolve synonyms, order for writing

pub mod emitter;
pub mod filter;
pub mod graph;
pub mod synonyms;

pub use emitter::EmissionPlan;
pub use filter::{apply_filter, FilterStats, Forest};
pub use graph::{BuildStats, Classified, GraphBuilder, TaxonGraph};
pub use synonyms::{resolve_synonyms, ResolvedSynonyms};
