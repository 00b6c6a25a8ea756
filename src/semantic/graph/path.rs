//! Shortest paths with deterministic tie-breaking.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::Serialize;

use super::RelationshipGraph;
use crate::semantic::inference::PredictedLink;

/// Costs closer than this are equal.
const COST_EPSILON: f64 = 1e-9;

/// A single shortest path between two tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinPath {
    /// Tables from start to end.
    pub tables: Vec<String>,
    /// Links traversed, one per hop.
    pub links: Vec<PredictedLink>,
    /// Sum of `1 / confidence` over the links.
    pub cost: f64,
}

impl JoinPath {
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn total_confidence(&self) -> f64 {
        self.links.iter().map(|l| l.confidence).sum()
    }
}

/// Best known way to reach a node.
#[derive(Debug, Clone)]
pub(crate) struct Label {
    pub cost: f64,
    pub confidence: f64,
    pub tables: Vec<String>,
    pub nodes: Vec<NodeIndex>,
    pub edges: Vec<EdgeIndex>,
}

impl Label {
    fn start(graph: &RelationshipGraph, node: NodeIndex) -> Self {
        Self {
            cost: 0.0,
            confidence: 0.0,
            tables: vec![graph.name_of(node).to_string()],
            nodes: vec![node],
            edges: Vec::new(),
        }
    }

    fn extend(&self, graph: &RelationshipGraph, edge: EdgeIndex, next: NodeIndex) -> Self {
        let link = graph.link(edge);
        let mut label = self.clone();
        label.cost += link.cost();
        label.confidence += link.confidence;
        label.tables.push(graph.name_of(next).to_string());
        label.nodes.push(next);
        label.edges.push(edge);
        label
    }

    /// Lower cost, then higher total confidence.
    pub fn cmp_weight(&self, other: &Self) -> Ordering {
        if (self.cost - other.cost).abs() > COST_EPSILON {
            return self.cost.total_cmp(&other.cost);
        }
        if (self.confidence - other.confidence).abs() > COST_EPSILON {
            return other.confidence.total_cmp(&self.confidence);
        }
        Ordering::Equal
    }

    /// Weight, then the table names along the path.
    fn cmp_path(&self, other: &Self) -> Ordering {
        self.cmp_weight(other).then_with(|| self.tables.cmp(&other.tables))
    }

    pub fn into_path(self, graph: &RelationshipGraph) -> JoinPath {
        JoinPath {
            links: self.edges.iter().map(|&e| graph.link(e).clone()).collect(),
            tables: self.tables,
            cost: self.cost,
        }
    }
}

/// Dijkstra from every source at once; traversal ignores link direction.
///
/// Returns the settled label of every reachable node. Ties are broken by
/// total confidence and then by the table names along the path, so the
/// result does not depend on edge insertion order.
pub(crate) fn shortest_paths(
    graph: &RelationshipGraph,
    sources: &BTreeSet<NodeIndex>,
) -> BTreeMap<NodeIndex, Label> {
    let mut tentative: BTreeMap<NodeIndex, Label> = sources
        .iter()
        .map(|&s| (s, Label::start(graph, s)))
        .collect();
    let mut settled: BTreeMap<NodeIndex, Label> = BTreeMap::new();

    loop {
        let next = tentative
            .iter()
            .min_by(|a, b| a.1.cmp_path(b.1))
            .map(|(&node, _)| node);
        let Some(node) = next else {
            break;
        };
        let Some(label) = tentative.remove(&node) else {
            break;
        };

        for (edge, other) in graph.incident_edges(node) {
            if settled.contains_key(&other) || other == node {
                continue;
            }
            if !graph.link(edge).cost().is_finite() {
                continue;
            }
            let candidate = label.extend(graph, edge, other);
            let better = tentative
                .get(&other)
                .map_or(true, |current| candidate.cmp_path(current).is_lt());
            if better {
                tentative.insert(other, candidate);
            }
        }
        settled.insert(node, label);
    }
    settled
}

impl RelationshipGraph {
    /// Cheapest path between two tables, or `None` if they are not connected.
    ///
    /// A path from a table to itself is empty.
    pub fn find_path(&self, from: &str, to: &str) -> Option<JoinPath> {
        let start = self.index_of(from)?;
        let end = self.index_of(to)?;
        let mut labels = shortest_paths(self, &BTreeSet::from([start]));
        labels.remove(&end).map(|l| l.into_path(self))
    }
}
