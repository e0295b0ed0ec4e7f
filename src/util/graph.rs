use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// Adjacency-set digraph that only grows. Adding an existing edge is a
/// no-op, so insertion is idempotent. Nodes exist implicitly through edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph<N: Hash + Eq + Copy + Debug> {
    pub edges: HashMap<N, HashSet<N>>,
    num_edges: usize,
}

impl<N: Hash + Eq + Copy + Debug> Default for Graph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Hash + Eq + Copy + Debug> Graph<N> {
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
            num_edges: 0,
        }
    }

    /// Returns true iff the edge was not in the graph before.
    pub fn add_edge(&mut self, from: N, to: N) -> bool {
        let added = self.edges.entry(from).or_default().insert(to);
        if added {
            self.num_edges += 1;
        }
        added
    }

    pub fn contains_edge(&self, from: N, to: N) -> bool {
        self.edges.get(&from).map_or(false, |tos| tos.contains(&to))
    }

    pub fn neighbors(&self, node: N) -> Option<&HashSet<N>> {
        self.edges.get(&node)
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = (N, N)> + '_ {
        self.edges
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (*from, *to)))
    }
}
