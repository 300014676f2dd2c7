//! Reference resolution for parsed STEP records.
//!
//! Turns the raw record arena produced by the parser into a graph of shared
//! entities:
//! - Forward references are resolved on demand, each record built once
//! - Typed inline parameters become unregistered entities
//! - Values headed for SELECT slots are wrapped along the registry's chains
//! - Missing references are recovered as `$` and reported as issues

mod coerce;
mod graph;

pub use coerce::coerce;
pub use graph::{construct_all, GraphBuilder};

/// Default limit on nested construction.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Options controlling graph construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadOptions {
    /// Maximum nesting of records built while resolving one record.
    pub max_depth: usize,
    /// Fail the load on the first missing reference instead of recording it.
    pub strict_references: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict_references: false,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn strict_references(mut self, strict: bool) -> Self {
        self.strict_references = strict;
        self
    }
}
