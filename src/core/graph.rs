//! Dependency graph construction and deterministic ordering
//!
//! The graph is plain data: each formula cell maps to the in-region cells its
//! formula reads. Ordering builds a petgraph view over the formula-to-formula
//! edges and runs Kahn's algorithm with a row-major min-heap, so the same
//! sheet always yields the same order.

use super::parser::Expr;
use super::references::references;
use crate::error::{ForgeError, ForgeResult};
use crate::types::{CellAddress, SheetContext};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, VecDeque};
use tracing::debug;

/// Formula cell → cells it requires. Edge `u → v` reads "u needs v".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    edges: BTreeMap<CellAddress, BTreeSet<CellAddress>>,
}

impl DependencyGraph {
    /// Build the graph for every parsed formula cell of the region.
    ///
    /// References that fall outside the region are dropped here; the caller
    /// surfaces them as inputs instead.
    pub fn build(formulas: &BTreeMap<CellAddress, Expr>, ctx: &SheetContext) -> Self {
        let edges = formulas
            .iter()
            .map(|(cell, expr)| {
                let deps = references(expr)
                    .into_iter()
                    .filter(|dep| ctx.in_region(dep))
                    .collect();
                (*cell, deps)
            })
            .collect();

        Self { edges }
    }

    /// Build directly from an adjacency list
    pub fn from_edges<I, D>(edges: I) -> Self
    where
        I: IntoIterator<Item = (CellAddress, D)>,
        D: IntoIterator<Item = CellAddress>,
    {
        Self {
            edges: edges
                .into_iter()
                .map(|(cell, deps)| (cell, deps.into_iter().collect()))
                .collect(),
        }
    }

    /// Whether the cell is a formula node of this graph
    pub fn contains(&self, cell: &CellAddress) -> bool {
        self.edges.contains_key(cell)
    }

    pub fn dependencies(&self, cell: &CellAddress) -> Option<&BTreeSet<CellAddress>> {
        self.edges.get(cell)
    }

    /// All `(u, v)` edges, `u` requiring `v`
    pub fn edges(&self) -> impl Iterator<Item = (CellAddress, CellAddress)> + '_ {
        self.edges
            .iter()
            .flat_map(|(cell, deps)| deps.iter().map(move |dep| (*cell, *dep)))
    }

    /// Linearize the formula cells so every cell follows the formula cells it
    /// reads. Ties are broken in row-major order.
    pub fn computation_order(&self, ctx: &SheetContext) -> ForgeResult<Vec<CellAddress>> {
        let (graph, nodes) = self.formula_graph();

        let mut in_degree: HashMap<NodeIndex, usize> = graph
            .node_indices()
            .map(|idx| (idx, graph.neighbors_directed(idx, Direction::Incoming).count()))
            .collect();

        let mut ready: BinaryHeap<Reverse<CellAddress>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| Reverse(graph[*idx]))
            .collect();

        let mut order = Vec::with_capacity(graph.node_count());
        while let Some(Reverse(cell)) = ready.pop() {
            order.push(cell);
            for dependent in graph.neighbors_directed(nodes[&cell], Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(graph[dependent]));
                    }
                }
            }
        }

        if order.len() < graph.node_count() {
            let cycle = self.find_cycle(&graph);
            debug!(
                sheet = ctx.sheet,
                placed = order.len(),
                total = graph.node_count(),
                "ordering stalled on a cycle"
            );
            return Err(ForgeError::CircularDependency {
                sheet: ctx.sheet.to_string(),
                cycle,
            });
        }

        debug!(sheet = ctx.sheet, cells = order.len(), "computation order resolved");
        Ok(order)
    }

    /// Petgraph view over formula-to-formula edges, dependency → dependent
    fn formula_graph(&self) -> (DiGraph<CellAddress, ()>, HashMap<CellAddress, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();

        for cell in self.edges.keys() {
            nodes.insert(*cell, graph.add_node(*cell));
        }

        for (cell, deps) in &self.edges {
            for dep in deps {
                if let Some(&dep_idx) = nodes.get(dep) {
                    graph.add_edge(dep_idx, nodes[cell], ());
                }
            }
        }

        (graph, nodes)
    }

    /// Ordered cycle `[a, b, ..., a]`, each cell requiring the next.
    ///
    /// Picks the strongly connected component holding the row-major smallest
    /// cell on any cycle and walks the shortest path from it back to itself.
    fn find_cycle(&self, graph: &DiGraph<CellAddress, ()>) -> Vec<CellAddress> {
        let component = tarjan_scc(graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                scc.into_iter()
                    .map(|idx| graph[idx])
                    .collect::<BTreeSet<_>>()
            })
            .min_by_key(|cells| cells.first().copied());

        let Some(component) = component else {
            return Vec::new();
        };
        let Some(&start) = component.first() else {
            return Vec::new();
        };

        let mut parent: HashMap<CellAddress, CellAddress> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(cell) = queue.pop_front() {
            let deps = self.edges.get(&cell).into_iter().flatten();
            for dep in deps.filter(|dep| component.contains(*dep)) {
                if *dep == start {
                    let mut path = vec![start];
                    let mut current = cell;
                    while current != start {
                        path.push(current);
                        current = parent[&current];
                    }
                    path[1..].reverse();
                    path.push(start);
                    return path;
                }
                if !parent.contains_key(dep) {
                    parent.insert(*dep, cell);
                    queue.push_back(*dep);
                }
            }
        }

        component.into_iter().collect()
    }
}
