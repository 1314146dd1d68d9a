//! Resource Registry Module
//!
//! Static metadata about the corpora exposed through the gateway.
//!
//! ## Overview
//! Every searchable corpus is described by a [`Resource`]: the registry path
//! handed to workers, its positional attributes, the default search attribute
//! used by the query generator, and the structural units available for KWIC
//! context. The [`ResourceRegistry`] is populated once at startup from
//! configuration and is read-only afterwards.
//!
//! ## Determinism
//! The registry iterates resources sorted by id. Multi-corpus fan-out walks
//! this order, which keeps result merging and position numbering reproducible
//! across identical requests.

pub mod registry;
pub mod types;

pub use registry::ResourceRegistry;
pub use types::{Resource, StructureMapping};

#[cfg(test)]
mod tests;
