//! Relationship graph over tables.
//!
//! Nodes are table names and edges are predicted links. Links are directed
//! (`from` references `to`) but traversal ignores direction: a join can be
//! written either way round. Parallel links between the same two tables
//! through different columns are separate edges.

mod path;
mod steiner;

pub use path::JoinPath;
pub use steiner::{JoinTree, TreeEdge};

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::metadata::MetadataStore;
use crate::semantic::inference::{LinkKey, LinkSet, PredictedLink};

/// Aggregate of all resolved links, queried by the planner.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    /// The underlying directed graph
    graph: DiGraph<String, PredictedLink>,

    /// Index: table name → NodeIndex
    node_index: BTreeMap<String, NodeIndex>,

    /// Fingerprint of the link set this graph was built from
    fingerprint: String,
}

impl RelationshipGraph {
    /// Build a graph from table names and links.
    ///
    /// Tables mentioned only by a link are added too. Links are keyed by
    /// `(from, to, from_cols, to_cols)`; a repeated key keeps the higher
    /// confidence. Links with zero confidence are not traversable and are
    /// dropped.
    pub fn build<T: AsRef<str>>(
        tables: impl IntoIterator<Item = T>,
        links: impl IntoIterator<Item = PredictedLink>,
    ) -> Self {
        let mut names: BTreeSet<String> = tables.into_iter().map(|t| t.as_ref().to_string()).collect();

        let mut keyed: BTreeMap<LinkKey, PredictedLink> = BTreeMap::new();
        for link in links.into_iter().filter(|l| l.confidence > 0.0) {
            names.insert(link.from_table.clone());
            names.insert(link.to_table.clone());
            let key = link.key();
            match keyed.get(&key) {
                Some(existing) if existing.confidence >= link.confidence => {}
                _ => {
                    keyed.insert(key, link);
                }
            }
        }

        let mut graph = DiGraph::new();
        let mut node_index = BTreeMap::new();
        for name in names {
            let idx = graph.add_node(name.clone());
            node_index.insert(name, idx);
        }
        for link in keyed.into_values() {
            let from = node_index[&link.from_table];
            let to = node_index[&link.to_table];
            graph.add_edge(from, to, link);
        }

        Self {
            graph,
            node_index,
            fingerprint: String::new(),
        }
    }

    /// Build from every table in the store plus a resolved link set.
    pub fn from_link_set(store: &MetadataStore, links: &LinkSet) -> Self {
        let mut graph = Self::build(store.table_names(), links.links.iter().cloned());
        graph.fingerprint = links.fingerprint.clone();
        graph
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.node_index.contains_key(table)
    }

    /// Table names in alphabetical order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.node_index.keys().map(String::as_str)
    }

    /// All links in key order.
    pub fn links(&self) -> impl Iterator<Item = &PredictedLink> {
        self.graph.edge_weights()
    }

    /// Tables sharing at least one link with `table`, alphabetically.
    pub fn neighbors(&self, table: &str) -> Vec<&str> {
        let Some(&idx) = self.node_index.get(table) else {
            return Vec::new();
        };
        let names: BTreeSet<&str> = self
            .graph
            .neighbors_undirected(idx)
            .map(|n| self.graph[n].as_str())
            .collect();
        names.into_iter().collect()
    }

    /// Links between two tables in either direction, in key order.
    pub fn links_between(&self, a: &str, b: &str) -> Vec<&PredictedLink> {
        let Some(&idx) = self.node_index.get(a) else {
            return Vec::new();
        };
        let mut links: Vec<&PredictedLink> = self
            .incident_edges(idx)
            .into_iter()
            .map(|(e, _)| &self.graph[e])
            .filter(|l| l.touches(b) && (a != b || l.from_table == l.to_table))
            .collect();
        links.sort_by_key(|l| l.key());
        links
    }

    /// Every table reachable from `table`, including itself.
    pub fn reachable(&self, table: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let Some(&start) = self.node_index.get(table) else {
            return seen;
        };
        let mut queue = VecDeque::from([start]);
        seen.insert(self.graph[start].clone());
        while let Some(node) = queue.pop_front() {
            for next in self.graph.neighbors_undirected(node) {
                if seen.insert(self.graph[next].clone()) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    pub(crate) fn index_of(&self, table: &str) -> Option<NodeIndex> {
        self.node_index.get(table).copied()
    }

    pub(crate) fn name_of(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub(crate) fn link(&self, edge: EdgeIndex) -> &PredictedLink {
        &self.graph[edge]
    }

    /// Edges touching `node` in either direction, with the node at the other
    /// end, ordered by link key.
    pub(crate) fn incident_edges(&self, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .chain(
                self.graph
                    .edges_directed(node, Direction::Incoming)
                    .map(|e| (e.id(), e.source())),
            )
            .collect();
        edges.sort_by(|a, b| self.graph[a.0].key().cmp(&self.graph[b.0].key()));
        edges.dedup_by_key(|e| e.0);
        edges
    }
}
