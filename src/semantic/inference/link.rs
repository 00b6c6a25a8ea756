//! Predicted links and link sets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::keys::KeyCandidate;

/// Cardinality of a link, read from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// Reverse the cardinality (swap sides).
    pub fn reverse(self) -> Self {
        match self {
            Cardinality::OneToMany => Cardinality::ManyToOne,
            Cardinality::ManyToOne => Cardinality::OneToMany,
            other => other,
        }
    }

    /// Determine cardinality from uniqueness of both sides.
    pub fn from_uniqueness(from_unique: bool, to_unique: bool) -> Self {
        match (from_unique, to_unique) {
            (true, true) => Cardinality::OneToOne,
            (true, false) => Cardinality::OneToMany,
            (false, true) => Cardinality::ManyToOne,
            (false, false) => Cardinality::ManyToMany,
        }
    }

    /// Whether joining along this link can multiply `from` rows.
    pub fn causes_fanout(&self) -> bool {
        matches!(self, Cardinality::OneToMany | Cardinality::ManyToMany)
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cardinality::OneToOne => write!(f, "1:1"),
            Cardinality::OneToMany => write!(f, "1:N"),
            Cardinality::ManyToOne => write!(f, "N:1"),
            Cardinality::ManyToMany => write!(f, "N:N"),
        }
    }
}

/// Identity of a link: both endpoints and their column lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkKey {
    pub from_table: String,
    pub to_table: String,
    pub from_columns: Vec<String>,
    pub to_columns: Vec<String>,
}

/// A directed link: `from` columns hold values drawn from `to` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedLink {
    pub from_table: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
    pub confidence: f64,
    pub cardinality: Cardinality,
    /// Raw containment before penalties.
    #[serde(default)]
    pub containment: f64,
    #[serde(default)]
    pub intersect_count: u64,
}

impl PredictedLink {
    pub fn key(&self) -> LinkKey {
        LinkKey {
            from_table: self.from_table.clone(),
            to_table: self.to_table.clone(),
            from_columns: self.from_columns.clone(),
            to_columns: self.to_columns.clone(),
        }
    }

    /// Stable name: `{from}_{from_cols}_{to}_{to_cols}`.
    pub fn name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.from_table,
            self.from_columns.join("_"),
            self.to_table,
            self.to_columns.join("_")
        )
    }

    /// Traversal cost; lower is better. Infinite when confidence is zero.
    pub fn cost(&self) -> f64 {
        if self.confidence <= 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.confidence
        }
    }

    /// Whether this link touches `table` on either end.
    pub fn touches(&self, table: &str) -> bool {
        self.from_table == table || self.to_table == table
    }

    /// Join columns as seen from `table`: (own columns, other table, other columns).
    pub fn columns_from(&self, table: &str) -> Option<(&[String], &str, &[String])> {
        if self.from_table == table {
            Some((&self.from_columns, &self.to_table, &self.to_columns))
        } else if self.to_table == table {
            Some((&self.to_columns, &self.from_table, &self.from_columns))
        } else {
            None
        }
    }
}

/// All links resolved from one metadata snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkSet {
    /// Fingerprint of the metadata and thresholds the links came from.
    pub fingerprint: String,
    /// Chosen key per table; tables without a key are absent.
    #[serde(default)]
    pub keys: BTreeMap<String, KeyCandidate>,
    /// Sorted by [`LinkKey`], one entry per key.
    pub links: Vec<PredictedLink>,
}

impl LinkSet {
    /// Build a set, deduplicating by key and keeping the higher confidence.
    pub fn new(
        fingerprint: impl Into<String>,
        keys: BTreeMap<String, KeyCandidate>,
        links: impl IntoIterator<Item = PredictedLink>,
    ) -> Self {
        let mut merged: BTreeMap<LinkKey, PredictedLink> = BTreeMap::new();
        for link in links {
            let key = link.key();
            match merged.get(&key) {
                Some(existing) if existing.confidence >= link.confidence => {}
                _ => {
                    merged.insert(key, link);
                }
            }
        }
        Self {
            fingerprint: fingerprint.into(),
            keys,
            links: merged.into_values().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PredictedLink> {
        self.links.iter()
    }
}
