//! Primary key identification.
//!
//! Single columns are judged from statistics alone. Composite keys need an
//! exact uniqueness answer, which only the value oracle can give, so the
//! search space is pruned with statistics before the oracle is asked.

use std::cmp::Ordering;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::InferenceConfig;
use crate::metadata::{ColumnSet, ColumnStats, TableStats, ValueOracle};
use crate::semantic::error::{ResolveError, ResolveResult};

/// The chosen key of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyCandidate {
    pub table: String,
    /// Key columns; composite keys are in alphabetical order.
    pub columns: Vec<String>,
    pub uniqueness: f64,
    pub completeness: f64,
}

impl KeyCandidate {
    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn column_set(&self) -> ColumnSet {
        ColumnSet::new(self.table.clone(), self.columns.clone())
    }
}

/// A single column with known statistics.
struct Ranked<'a> {
    stats: &'a ColumnStats,
    uniqueness: f64,
    completeness: f64,
}

/// uniqueness desc, completeness desc, identifier-like first, name asc.
fn rank_order(a: &Ranked<'_>, b: &Ranked<'_>) -> Ordering {
    b.uniqueness
        .total_cmp(&a.uniqueness)
        .then_with(|| b.completeness.total_cmp(&a.completeness))
        .then_with(|| {
            b.stats
                .logical_type
                .is_identifier()
                .cmp(&a.stats.logical_type.is_identifier())
        })
        .then_with(|| a.stats.column.cmp(&b.stats.column))
}

fn ranked_columns(table: &TableStats) -> Vec<Ranked<'_>> {
    let mut ranked: Vec<Ranked<'_>> = table
        .columns
        .iter()
        .filter_map(|stats| {
            Some(Ranked {
                stats,
                uniqueness: stats.uniqueness()?,
                completeness: stats.completeness()?,
            })
        })
        .collect();
    ranked.sort_by(rank_order);
    ranked
}

/// Proposes the most likely key for each table.
pub struct KeyIdentifier<'a, O: ValueOracle + ?Sized> {
    oracle: &'a O,
    config: &'a InferenceConfig,
}

impl<'a, O: ValueOracle + ?Sized> KeyIdentifier<'a, O> {
    pub fn new(oracle: &'a O, config: &'a InferenceConfig) -> Self {
        Self { oracle, config }
    }

    /// Identify the key of a table. `None` means no key qualifies.
    ///
    /// # Errors
    /// Returns [`ResolveError::KeyIdentification`] if the oracle fails during
    /// composite search.
    pub fn identify(&self, table: &TableStats) -> ResolveResult<Option<KeyCandidate>> {
        if let Some(key) = self.identify_single(table) {
            debug!(table = %table.name, column = %key.columns[0], "single-column key");
            return Ok(Some(key));
        }
        let composite = self.identify_composite(table)?;
        match &composite {
            Some(key) => debug!(table = %table.name, columns = ?key.columns, "composite key"),
            None => debug!(table = %table.name, "no key found"),
        }
        Ok(composite)
    }

    /// Best single column meeting both thresholds, from statistics only.
    pub fn identify_single(&self, table: &TableStats) -> Option<KeyCandidate> {
        ranked_columns(table)
            .into_iter()
            .find(|r| {
                r.uniqueness >= self.config.key_uniqueness_min
                    && r.completeness >= self.config.key_completeness_min
            })
            .map(|r| KeyCandidate {
                table: table.name.clone(),
                columns: vec![r.stats.column.clone()],
                uniqueness: r.uniqueness,
                completeness: r.completeness,
            })
    }

    fn identify_composite(&self, table: &TableStats) -> ResolveResult<Option<KeyCandidate>> {
        let Some(row_count) = table.row_count() else {
            return Ok(None);
        };

        let mut pool: Vec<Ranked<'_>> = ranked_columns(table)
            .into_iter()
            .filter(|r| {
                r.completeness >= self.config.key_completeness_min
                    && r.stats.distinct_count.unwrap_or(0) > 1
            })
            .take(self.config.max_composite_columns)
            .collect();
        pool.sort_by(|a, b| a.stats.column.cmp(&b.stats.column));

        for arity in 2..=self.config.max_composite_arity.min(pool.len()) {
            let mut best: Option<KeyCandidate> = None;

            for combo in pool.iter().combinations(arity) {
                if !could_be_unique(&combo, row_count) {
                    trace!(table = %table.name, arity, "combination pruned by distinct counts");
                    continue;
                }
                let columns: Vec<String> = combo.iter().map(|r| r.stats.column.clone()).collect();
                let set = ColumnSet::new(table.name.clone(), columns);
                let stats = self.oracle.combination_stats(&set).map_err(|source| {
                    ResolveError::KeyIdentification {
                        table: table.name.clone(),
                        source,
                    }
                })?;
                if !stats.is_unique() || stats.completeness() < self.config.key_completeness_min {
                    continue;
                }

                let candidate = KeyCandidate {
                    table: table.name.clone(),
                    columns: set.columns,
                    uniqueness: 1.0,
                    completeness: stats.completeness(),
                };
                let better = match &best {
                    None => true,
                    Some(current) => candidate
                        .completeness
                        .total_cmp(&current.completeness)
                        .then_with(|| current.columns.cmp(&candidate.columns))
                        .is_gt(),
                };
                if better {
                    best = Some(candidate);
                }
            }

            if best.is_some() {
                return Ok(best);
            }
        }
        Ok(None)
    }
}

/// The combination can only be unique if its distinct tuples can cover every
/// row that is guaranteed complete.
fn could_be_unique(combo: &[&Ranked<'_>], row_count: u64) -> bool {
    let product = combo.iter().fold(1u128, |acc, r| {
        acc.saturating_mul(u128::from(r.stats.distinct_count.unwrap_or(0)))
    });
    let nulls: u64 = combo
        .iter()
        .map(|r| r.stats.null_count.unwrap_or(0))
        .sum();
    product >= u128::from(row_count.saturating_sub(nulls))
}
