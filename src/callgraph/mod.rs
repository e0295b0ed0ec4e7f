//! # callgraph
//!
//! Call graph discovered on the fly by the pointer analysis.
//! Node is a reachable method (MethodId).
//! Edge (A, B, [e1, e2, ..]) means method A calls method B at the call sites of e1, e2, ...
//! The list of `CallEdge` is the weight of an edge, one entry per (call site, callee).
//! Reachable methods and edges are only ever added.

use petgraph::dot::Dot;
use petgraph::graph::NodeIndex;
use petgraph::visit::Bfs;
use petgraph::{Directed, Graph};
use std::collections::{HashMap, HashSet};

use crate::ir::{CallKind, Location, MethodId, Program};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallEdge {
    pub kind: CallKind,
    pub call_site: Location,
    pub callee: MethodId,
}

impl CallEdge {
    pub fn new(kind: CallKind, call_site: Location, callee: MethodId) -> Self {
        Self {
            kind,
            call_site,
            callee,
        }
    }

    pub fn caller(&self) -> MethodId {
        self.call_site.method
    }
}

#[derive(Debug, Default)]
pub struct CallGraph {
    pub graph: Graph<MethodId, Vec<CallEdge>, Directed>,
    method_index: HashMap<MethodId, NodeIndex>,
    entry_methods: Vec<MethodId>,
    reachable_methods: Vec<MethodId>,
    edges: Vec<CallEdge>,
    edge_set: HashSet<(Location, MethodId)>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method_index(&self, method: MethodId) -> Option<NodeIndex> {
        self.method_index.get(&method).copied()
    }

    pub fn add_entry_method(&mut self, method: MethodId) {
        if !self.entry_methods.contains(&method) {
            self.entry_methods.push(method);
        }
    }

    /// Returns true iff `method` was not reachable before.
    pub fn add_reachable_method(&mut self, method: MethodId) -> bool {
        if self.method_index.contains_key(&method) {
            return false;
        }
        let idx = self.graph.add_node(method);
        self.method_index.insert(method, idx);
        self.reachable_methods.push(method);
        true
    }

    pub fn contains(&self, method: MethodId) -> bool {
        self.method_index.contains_key(&method)
    }

    /// Returns true iff no edge from the same call site to the same callee existed.
    /// Both ends are made reachable.
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        if !self.edge_set.insert((edge.call_site, edge.callee)) {
            return false;
        }
        self.add_reachable_method(edge.caller());
        self.add_reachable_method(edge.callee);
        let caller_idx = self.method_index[&edge.caller()];
        let callee_idx = self.method_index[&edge.callee];
        if let Some(edge_idx) = self.graph.find_edge(caller_idx, callee_idx) {
            self.graph[edge_idx].push(edge);
        } else {
            self.graph.add_edge(caller_idx, callee_idx, vec![edge]);
        }
        self.edges.push(edge);
        true
    }

    pub fn entry_methods(&self) -> &[MethodId] {
        &self.entry_methods
    }

    /// Reachable methods in discovery order.
    pub fn reachable_methods(&self) -> &[MethodId] {
        &self.reachable_methods
    }

    /// All edges in discovery order.
    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edges_out_of(&self, call_site: Location) -> impl Iterator<Item = &CallEdge> {
        self.edges.iter().filter(move |e| e.call_site == call_site)
    }

    pub fn edges_into(&self, method: MethodId) -> impl Iterator<Item = &CallEdge> {
        self.edges.iter().filter(move |e| e.callee == method)
    }

    pub fn callees_of(&self, call_site: Location) -> Vec<MethodId> {
        let mut callees: Vec<MethodId> = self.edges_out_of(call_site).map(|e| e.callee).collect();
        callees.sort();
        callees
    }

    /// Methods with at least one call site that calls `method`.
    pub fn callers_of(&self, method: MethodId) -> Vec<MethodId> {
        let mut callers: Vec<MethodId> = self.edges_into(method).map(|e| e.caller()).collect();
        callers.sort();
        callers.dedup();
        callers
    }

    /// Methods reachable from the entry methods along call edges, in BFS order.
    pub fn reachable_in_bfs_order(&self) -> Vec<MethodId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        for entry in &self.entry_methods {
            let root = match self.method_index(*entry) {
                Some(root) => root,
                None => continue,
            };
            let mut bfs = Bfs::new(&self.graph, root);
            while let Some(node_id) = bfs.next(&self.graph) {
                let method = self.graph[node_id];
                if visited.insert(method) {
                    order.push(method);
                }
            }
        }
        order
    }

    /// The callgraph in dot format, nodes labelled with method signatures
    /// and edges with their dispatch kinds.
    pub fn dot(&self, program: &Program) -> String {
        let labelled = self.graph.map(
            |_, method| program.method_name(*method),
            |_, edges| {
                let kinds: Vec<String> = edges
                    .iter()
                    .map(|e| format!("{}@{}", e.kind, e.call_site.index))
                    .collect();
                kinds.join(",")
            },
        );
        format!("{}", Dot::new(&labelled))
    }
}
