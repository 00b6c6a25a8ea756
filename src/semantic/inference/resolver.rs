//! Link resolution between table pairs.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use super::keys::{KeyCandidate, KeyIdentifier};
use super::link::{Cardinality, LinkSet, PredictedLink};
use super::InferenceConfig;
use crate::cache::{compute_hash, short_hash};
use crate::metadata::{ColumnSet, ColumnStats, MetadataStore, TableStats, ValueOracle};
use crate::semantic::error::{ResolveError, ResolveResult};

/// A qualifying pair before penalties.
#[derive(Debug, Clone)]
struct Candidate {
    from_table: String,
    from_columns: Vec<String>,
    to_table: String,
    to_columns: Vec<String>,
    containment: f64,
    intersect_count: u64,
    cardinality: Cardinality,
}

impl Candidate {
    /// Both endpoints, ordered so that A->B and its mirror B->A compare equal.
    fn unordered_pair(&self) -> (Vec<String>, Vec<String>) {
        let a = self.from_columns.clone();
        let b = self.to_columns.clone();
        if self.from_table <= self.to_table {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Estimates links between two tables using the value oracle.
pub struct Resolver<'a, O: ValueOracle + ?Sized> {
    oracle: &'a O,
    config: &'a InferenceConfig,
}

impl<'a, O: ValueOracle + ?Sized> Resolver<'a, O> {
    pub fn new(oracle: &'a O, config: &'a InferenceConfig) -> Self {
        Self { oracle, config }
    }

    /// Links in both directions between `a` and `b`, sorted by link key.
    ///
    /// An empty result is normal: it means no pair reached the containment
    /// threshold.
    ///
    /// # Errors
    /// Returns [`ResolveError::Oracle`] if a containment call fails.
    pub fn resolve(
        &self,
        a: &TableStats,
        b: &TableStats,
        key_a: Option<&KeyCandidate>,
        key_b: Option<&KeyCandidate>,
    ) -> ResolveResult<Vec<PredictedLink>> {
        if a.name == b.name {
            return Ok(Vec::new());
        }

        let mut candidates = self.directed(a, b, key_a, key_b)?;
        candidates.extend(self.directed(b, a, key_b, key_a)?);

        let pairs: BTreeSet<_> = candidates.iter().map(Candidate::unordered_pair).collect();
        let factor = self.config.ambiguity_factor(pairs.len());
        if pairs.len() > 1 {
            warn!(
                a = %a.name,
                b = %b.name,
                pairs = pairs.len(),
                factor,
                "multiple column pairs link the same tables"
            );
        }

        let mut links: Vec<PredictedLink> = candidates
            .into_iter()
            .map(|c| PredictedLink {
                confidence: self.config.link_confidence(
                    c.containment,
                    pairs.len(),
                    c.cardinality == Cardinality::ManyToMany,
                ),
                from_table: c.from_table,
                from_columns: c.from_columns,
                to_table: c.to_table,
                to_columns: c.to_columns,
                cardinality: c.cardinality,
                containment: c.containment,
                intersect_count: c.intersect_count,
            })
            .collect();
        links.sort_by_key(PredictedLink::key);
        Ok(links)
    }

    /// Pairs where `from` columns reference the key of `to`.
    fn directed(
        &self,
        from: &TableStats,
        to: &TableStats,
        key_from: Option<&KeyCandidate>,
        key_to: Option<&KeyCandidate>,
    ) -> ResolveResult<Vec<Candidate>> {
        let Some(key_to) = key_to else {
            return Ok(Vec::new());
        };

        let sources = if key_to.is_composite() {
            self.composite_sources(from, to, key_from, key_to)
        } else {
            self.single_sources(from, to, key_from, key_to)
        };

        let target = key_to.column_set();
        let mut out = Vec::new();
        for from_columns in sources {
            let source = ColumnSet::new(from.name.clone(), from_columns);
            let containment = self
                .oracle
                .containment(&source, &target)
                .map_err(|err| ResolveError::Oracle {
                    from: from.name.clone(),
                    to: to.name.clone(),
                    source: err,
                })?;
            let score = containment.score();
            trace!(from = %source, to = %target, score, "containment");
            if score < self.config.min_containment {
                continue;
            }

            let from_unique = self.is_unique(from, &source.columns, key_from);
            let to_unique = self.is_unique(to, &target.columns, Some(key_to));
            out.push(Candidate {
                from_table: from.name.clone(),
                from_columns: source.columns,
                to_table: to.name.clone(),
                to_columns: target.columns.clone(),
                containment: score,
                intersect_count: containment.intersect_count,
                cardinality: Cardinality::from_uniqueness(from_unique, to_unique),
            });
        }
        Ok(out)
    }

    /// Identifier-like or key columns of `from` that could reference a
    /// single-column key of `to`.
    fn single_sources(
        &self,
        from: &TableStats,
        to: &TableStats,
        key_from: Option<&KeyCandidate>,
        key_to: &KeyCandidate,
    ) -> Vec<Vec<String>> {
        let Some(target) = key_to
            .columns
            .first()
            .and_then(|c| to.column(c))
            .filter(|s| s.is_known())
        else {
            return Vec::new();
        };

        from.columns
            .iter()
            .filter(|s| s.is_known())
            .filter(|s| {
                s.logical_type.is_identifier() || key_from.is_some_and(|k| k.contains(&s.column))
            })
            .filter(|s| s.logical_type.compatible_with(target.logical_type))
            .filter(|s| {
                let reachable = self.could_be_contained(s, target);
                if !reachable {
                    trace!(from = %s.column, to = %target.column, "pruned by distinct counts");
                }
                reachable
            })
            .map(|s| vec![s.column.clone()])
            .collect()
    }

    /// Column lists of `from` that could reference a composite key of `to`:
    /// `from`'s own key of the same arity, and same-named columns.
    fn composite_sources(
        &self,
        from: &TableStats,
        to: &TableStats,
        key_from: Option<&KeyCandidate>,
        key_to: &KeyCandidate,
    ) -> Vec<Vec<String>> {
        let mut sources = Vec::new();

        if let Some(own) = key_from.filter(|k| k.columns.len() == key_to.columns.len()) {
            if self.columns_compatible(from, &own.columns, to, &key_to.columns) {
                sources.push(own.columns.clone());
            }
        }

        let same_named = &key_to.columns;
        if self.columns_compatible(from, same_named, to, same_named)
            && !sources.contains(same_named)
        {
            sources.push(same_named.clone());
        }
        sources
    }

    fn columns_compatible(
        &self,
        from: &TableStats,
        from_columns: &[String],
        to: &TableStats,
        to_columns: &[String],
    ) -> bool {
        from_columns.iter().zip(to_columns).all(|(f, t)| {
            match (from.column(f), to.column(t)) {
                (Some(fs), Some(ts)) => {
                    fs.is_known() && ts.is_known() && fs.logical_type.compatible_with(ts.logical_type)
                }
                _ => false,
            }
        })
    }

    /// A source with more distinct values than the target can hold at the
    /// threshold can never qualify.
    fn could_be_contained(&self, from: &ColumnStats, to: &ColumnStats) -> bool {
        match (from.distinct_count, to.distinct_count) {
            (Some(f), Some(t)) => (f as f64) * self.config.min_containment <= t as f64,
            _ => false,
        }
    }

    fn is_unique(&self, table: &TableStats, columns: &[String], key: Option<&KeyCandidate>) -> bool {
        if key.is_some_and(|k| k.columns == columns) {
            return true;
        }
        match columns {
            [single] => table
                .column(single)
                .and_then(ColumnStats::uniqueness)
                .is_some_and(|u| u >= self.config.key_uniqueness_min),
            _ => false,
        }
    }
}

/// Identify keys and resolve links across every table pair in parallel.
///
/// When `previous` was computed from identical metadata and thresholds it is
/// returned unchanged.
///
/// # Errors
/// Propagates the first oracle failure, or a fingerprinting failure.
pub fn resolve_all<O: ValueOracle + ?Sized>(
    store: &MetadataStore,
    oracle: &O,
    config: &InferenceConfig,
    previous: Option<&LinkSet>,
) -> ResolveResult<LinkSet> {
    let fingerprint = compute_hash(&(store, config))?;
    if let Some(previous) = previous.filter(|p| p.fingerprint == fingerprint) {
        debug!(fingerprint = short_hash(&fingerprint), "metadata unchanged, reusing links");
        return Ok(previous.clone());
    }

    let tables: Vec<&TableStats> = store.tables().collect();
    let identifier = KeyIdentifier::new(oracle, config);
    let keys: BTreeMap<String, KeyCandidate> = tables
        .par_iter()
        .map(|t| identifier.identify(t).map(|k| k.map(|k| (t.name.clone(), k))))
        .collect::<ResolveResult<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    let resolver = Resolver::new(oracle, config);
    let pairs: Vec<(usize, usize)> = (0..tables.len()).tuple_combinations().collect();
    let links = pairs
        .par_iter()
        .map(|&(i, j)| {
            let (a, b) = (tables[i], tables[j]);
            resolver.resolve(a, b, keys.get(&a.name), keys.get(&b.name))
        })
        .collect::<ResolveResult<Vec<_>>>()?;

    let set = LinkSet::new(fingerprint, keys, links.into_iter().flatten());
    debug!(
        tables = tables.len(),
        keys = set.keys.len(),
        links = set.len(),
        fingerprint = short_hash(&set.fingerprint),
        "resolved links"
    );
    Ok(set)
}
