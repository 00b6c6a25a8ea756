//! Relationship inference over column statistics.
//!
//! Inference runs in two phases:
//!
//! 1. **Key identification** - pick the most likely primary key per table,
//!    from statistics first and from an exact oracle check for composites.
//! 2. **Link resolution** - for each table pair, test candidate foreign key
//!    columns against the other table's key by value containment.
//!
//! # Example
//!
//! ```ignore
//! use joinwise::semantic::inference::{resolve_all, InferenceConfig};
//!
//! let links = resolve_all(&store, &oracle, &InferenceConfig::default(), None)?;
//! for link in &links.links {
//!     println!("{} ({:.2})", link.name(), link.confidence);
//! }
//! ```

mod keys;
mod link;
mod resolver;

pub use keys::{KeyCandidate, KeyIdentifier};
pub use link::{Cardinality, LinkKey, LinkSet, PredictedLink};
pub use resolver::{resolve_all, Resolver};

use serde::{Deserialize, Serialize};

/// Default thresholds, grouped by phase.
pub mod thresholds {
    /// Key identification.
    pub mod key {
        /// Minimum distinct / non-null ratio for a single-column key.
        pub const UNIQUENESS_MIN: f64 = 0.99;
        /// Minimum non-null ratio for any key.
        pub const COMPLETENESS_MIN: f64 = 0.95;
        /// Largest composite key tried.
        pub const MAX_COMPOSITE_ARITY: usize = 3;
        /// Columns considered for composite keys, best uniqueness first.
        pub const MAX_COMPOSITE_COLUMNS: usize = 12;
    }

    /// Link resolution.
    pub mod link {
        /// Minimum containment for a pair to become a link.
        pub const MIN_CONTAINMENT: f64 = 0.9;
        /// Confidence lost per extra qualifying pair between two tables.
        pub const AMBIGUITY_PENALTY: f64 = 0.05;
        /// Confidence multiplier for many-to-many links.
        pub const MANY_TO_MANY_FACTOR: f64 = 0.5;
        /// Lowest confidence a qualifying link can carry, so penalties never
        /// remove it from the graph.
        pub const MIN_CONFIDENCE: f64 = 1e-3;
    }
}

/// Tunable inference thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub key_uniqueness_min: f64,
    pub key_completeness_min: f64,
    pub max_composite_arity: usize,
    pub max_composite_columns: usize,
    pub min_containment: f64,
    pub ambiguity_penalty: f64,
    pub many_to_many_factor: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            key_uniqueness_min: thresholds::key::UNIQUENESS_MIN,
            key_completeness_min: thresholds::key::COMPLETENESS_MIN,
            max_composite_arity: thresholds::key::MAX_COMPOSITE_ARITY,
            max_composite_columns: thresholds::key::MAX_COMPOSITE_COLUMNS,
            min_containment: thresholds::link::MIN_CONTAINMENT,
            ambiguity_penalty: thresholds::link::AMBIGUITY_PENALTY,
            many_to_many_factor: thresholds::link::MANY_TO_MANY_FACTOR,
        }
    }
}

impl InferenceConfig {
    /// Builder: set key thresholds.
    pub fn with_key_thresholds(mut self, uniqueness: f64, completeness: f64) -> Self {
        self.key_uniqueness_min = uniqueness.clamp(0.0, 1.0);
        self.key_completeness_min = completeness.clamp(0.0, 1.0);
        self
    }

    /// Builder: set the largest composite key arity (1 disables composites).
    pub fn with_max_composite_arity(mut self, arity: usize) -> Self {
        self.max_composite_arity = arity.max(1);
        self
    }

    /// Builder: set minimum containment.
    pub fn with_min_containment(mut self, threshold: f64) -> Self {
        self.min_containment = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder: set the per-extra-pair ambiguity penalty.
    pub fn with_ambiguity_penalty(mut self, penalty: f64) -> Self {
        self.ambiguity_penalty = penalty.clamp(0.0, 1.0);
        self
    }

    /// Builder: set the many-to-many confidence multiplier.
    pub fn with_many_to_many_factor(mut self, factor: f64) -> Self {
        self.many_to_many_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Multiplier applied when `n` pairs qualify between the same two tables.
    ///
    /// Floored at [`thresholds::link::MIN_CONFIDENCE`].
    pub fn ambiguity_factor(&self, n: usize) -> f64 {
        if n <= 1 {
            return 1.0;
        }
        (1.0 - self.ambiguity_penalty * (n - 1) as f64).max(thresholds::link::MIN_CONFIDENCE)
    }

    /// Final confidence of a qualifying pair: containment times the
    /// ambiguity and cardinality multipliers, kept within
    /// `[MIN_CONFIDENCE, 1]`.
    pub fn link_confidence(&self, containment: f64, pairs: usize, many_to_many: bool) -> f64 {
        let mut confidence = containment * self.ambiguity_factor(pairs);
        if many_to_many {
            confidence *= self.many_to_many_factor;
        }
        confidence.clamp(thresholds::link::MIN_CONFIDENCE, 1.0)
    }
}
