//! Join trees connecting a set of required tables.
//!
//! This is the usual shortest-path heuristic for Steiner trees: start from a
//! root and keep attaching the cheapest still-missing required table by its
//! shortest path from anywhere in the tree. Intermediate tables that end up
//! as leaves are pruned afterwards.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::Serialize;
use tracing::{debug, trace};

use super::path::shortest_paths;
use super::RelationshipGraph;
use crate::semantic::error::{PlanningError, PlanningResult};
use crate::semantic::inference::PredictedLink;

/// One edge of a join tree, oriented away from the root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeEdge {
    pub parent: String,
    pub child: String,
    pub link: PredictedLink,
}

impl TreeEdge {
    /// Join columns on the parent side.
    pub fn parent_columns(&self) -> &[String] {
        self.link
            .columns_from(&self.parent)
            .map_or(&[][..], |(own, _, _)| own)
    }

    /// Join columns on the child side.
    pub fn child_columns(&self) -> &[String] {
        self.link
            .columns_from(&self.child)
            .map_or(&[][..], |(own, _, _)| own)
    }
}

/// A tree of links connecting the required tables.
///
/// Edges are in breadth-first order from the root, so each edge's parent is
/// already joined when the edge is reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinTree {
    pub root: String,
    pub edges: Vec<TreeEdge>,
}

impl JoinTree {
    /// All tables in the tree, root first, then in join order.
    pub fn tables(&self) -> Vec<&str> {
        std::iter::once(self.root.as_str())
            .chain(self.edges.iter().map(|e| e.child.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.edges.iter().map(|e| e.link.cost()).sum()
    }
}

impl RelationshipGraph {
    /// Connect `required` with a tree rooted at its alphabetically first table.
    ///
    /// An empty `required` set gives an empty tree.
    ///
    /// # Errors
    /// Returns [`PlanningError::DisconnectedGraph`] as [`Self::connect_from`]
    /// does.
    pub fn shortest_connecting_subgraph<S: AsRef<str>>(
        &self,
        required: &[S],
    ) -> PlanningResult<JoinTree> {
        let required: BTreeSet<&str> = required.iter().map(AsRef::as_ref).collect();
        match required.first() {
            Some(&root) => self.connect_from(root, required.iter().copied()),
            None => Ok(JoinTree::default()),
        }
    }

    /// Connect `required` with a tree rooted at `root`.
    ///
    /// # Errors
    /// Returns [`PlanningError::DisconnectedGraph`] naming a required table
    /// outside the largest connected group of required tables.
    pub fn connect_from<'r>(
        &self,
        root: &str,
        required: impl IntoIterator<Item = &'r str>,
    ) -> PlanningResult<JoinTree> {
        let mut required: BTreeSet<&str> = required.into_iter().collect();
        required.insert(root);

        let root_idx = self
            .index_of(root)
            .ok_or_else(|| PlanningError::DisconnectedGraph(root.to_string()))?;
        let mut wanted: BTreeMap<&str, NodeIndex> = BTreeMap::new();
        for &table in &required {
            let idx = self
                .index_of(table)
                .ok_or_else(|| PlanningError::DisconnectedGraph(table.to_string()))?;
            wanted.insert(table, idx);
        }

        let mut tree_nodes = BTreeSet::from([root_idx]);
        let mut tree_edges: BTreeSet<EdgeIndex> = BTreeSet::new();
        wanted.remove(root);

        while !wanted.is_empty() {
            let labels = shortest_paths(self, &tree_nodes);
            let best = wanted
                .iter()
                .filter_map(|(&table, idx)| labels.get(idx).map(|l| (table, l)))
                .min_by(|a, b| a.1.cmp_weight(b.1).then_with(|| a.0.cmp(b.0)));

            let Some((table, label)) = best else {
                let missing = self.disconnected_table(root, &required);
                debug!(root, missing, "required table unreachable");
                return Err(PlanningError::DisconnectedGraph(missing.to_string()));
            };

            trace!(table, path = ?label.tables, cost = label.cost, "attaching table");
            tree_nodes.extend(label.nodes.iter().copied());
            tree_edges.extend(label.edges.iter().copied());
            wanted.retain(|_, idx| !tree_nodes.contains(idx));
        }

        let keep: BTreeSet<NodeIndex> = required
            .iter()
            .filter_map(|t| self.index_of(t))
            .collect();
        let tree_edges = self.prune_leaves(tree_edges, &keep);
        Ok(self.orient(root_idx, &tree_edges))
    }

    /// The required table to blame when `required` spans several components.
    ///
    /// The component holding the most required tables is taken as the
    /// intended one, the root's component winning ties. The first required
    /// table outside it, alphabetically, is the disconnected one.
    fn disconnected_table<'r>(&self, root: &'r str, required: &BTreeSet<&'r str>) -> &'r str {
        let mut components: Vec<BTreeSet<&'r str>> = Vec::new();
        for &table in required {
            if components.iter().any(|c| c.contains(table)) {
                continue;
            }
            let reachable = self.reachable(table);
            components.push(
                required
                    .iter()
                    .copied()
                    .filter(|t| reachable.contains(*t))
                    .collect(),
            );
        }

        let main = components.iter().max_by(|a, b| {
            a.len()
                .cmp(&b.len())
                .then_with(|| a.contains(root).cmp(&b.contains(root)))
                .then_with(|| b.first().cmp(&a.first()))
        });
        required
            .iter()
            .copied()
            .find(|t| main.is_some_and(|c| !c.contains(t)))
            .unwrap_or(root)
    }

    /// Drop leaves that are not required until none remain.
    fn prune_leaves(
        &self,
        mut edges: BTreeSet<EdgeIndex>,
        keep: &BTreeSet<NodeIndex>,
    ) -> BTreeSet<EdgeIndex> {
        loop {
            let mut degree: BTreeMap<NodeIndex, Vec<EdgeIndex>> = BTreeMap::new();
            for &e in &edges {
                let link = self.link(e);
                for table in [&link.from_table, &link.to_table] {
                    if let Some(idx) = self.index_of(table) {
                        degree.entry(idx).or_default().push(e);
                    }
                }
            }
            let prunable: Vec<EdgeIndex> = degree
                .iter()
                .filter(|(node, es)| es.len() == 1 && !keep.contains(*node))
                .map(|(_, es)| es[0])
                .collect();
            if prunable.is_empty() {
                return edges;
            }
            for e in prunable {
                edges.remove(&e);
            }
        }
    }

    /// Breadth-first orientation of tree edges away from the root.
    fn orient(&self, root: NodeIndex, edges: &BTreeSet<EdgeIndex>) -> JoinTree {
        let mut out = Vec::with_capacity(edges.len());
        let mut visited = BTreeSet::from([root]);
        let mut queue = VecDeque::from([root]);

        while let Some(node) = queue.pop_front() {
            let mut children: Vec<(EdgeIndex, NodeIndex)> = self
                .incident_edges(node)
                .into_iter()
                .filter(|(e, other)| edges.contains(e) && !visited.contains(other))
                .collect();
            children.sort_by(|a, b| self.name_of(a.1).cmp(self.name_of(b.1)));

            for (edge, child) in children {
                if !visited.insert(child) {
                    continue;
                }
                out.push(TreeEdge {
                    parent: self.name_of(node).to_string(),
                    child: self.name_of(child).to_string(),
                    link: self.link(edge).clone(),
                });
                queue.push_back(child);
            }
        }

        JoinTree {
            root: self.name_of(root).to_string(),
            edges: out,
        }
    }
}
