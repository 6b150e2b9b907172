//! Elementary cycle enumeration (Johnson's algorithm) within one SCC.
//!
//! A cycle is elementary if no node repeats; rotations of the same cycle
//! are one cycle and are reported once. Enumeration is restricted to a
//! single strongly connected component: a cycle can never leave its SCC,
//! so cross-component edges are irrelevant.
//!
//! Origins are processed one at a time in member order and excluded from
//! all later searches, so no cycle is rediscovered from a different
//! starting node. The blocked set with caused-block back-references is
//! what keeps the search polynomial per emitted cycle.
//!
//! # References
//! - Johnson, D. B. "Finding All the Elementary Circuits of a Directed
//!   Graph" (1975)

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::graph::{Graph, NodeIx};

/// An ordered, non-repeating node sequence whose last node has an edge
/// back to its first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    nodes: Vec<NodeIx>,
}

impl Cycle {
    pub(crate) fn new(nodes: Vec<NodeIx>) -> Self {
        Cycle { nodes }
    }

    /// The cycle's node sequence, at whatever rotation it was found at.
    pub fn nodes(&self) -> &[NodeIx] {
        &self.nodes
    }

    /// Rotate the sequence in place so it begins at `start`.
    ///
    /// No-op if `start` is not a member.
    pub fn rotate_to_start_at(&mut self, start: NodeIx) {
        if let Some(at) = self.nodes.iter().position(|&n| n == start) {
            self.nodes.rotate_left(at);
        }
    }

    pub(crate) fn contains(&self, node: NodeIx) -> bool {
        self.nodes.contains(&node)
    }
}

/// Enumerate every elementary cycle among `members`, which must be the
/// node set of one strongly connected component.
pub(crate) fn elementary_cycles(graph: &Graph, members: &[NodeIx]) -> Vec<Cycle> {
    // Work in local ranks so origin exclusion is a simple `< origin` test.
    let mut rank = FxHashMap::default();
    for (local, &node) in members.iter().enumerate() {
        rank.insert(node, local);
    }
    let adjacency: Vec<Vec<usize>> = members
        .iter()
        .map(|&node| {
            graph
                .outgoing(node)
                .iter()
                .filter_map(|next| rank.get(next).copied())
                .collect()
        })
        .collect();

    let mut search = CycleSearch {
        members,
        adjacency: &adjacency,
        blocked: vec![false; members.len()],
        blocked_on: vec![Vec::new(); members.len()],
        path: Vec::new(),
        cycles: Vec::new(),
    };

    for origin in 0..members.len() {
        // Fresh blocked state for every node still eligible as a member.
        for local in origin..members.len() {
            search.blocked[local] = false;
            search.blocked_on[local].clear();
        }
        search.circuit(origin, origin);
    }

    trace!(
        members = members.len(),
        cycles = search.cycles.len(),
        "enumerated elementary cycles"
    );
    search.cycles
}

struct CycleSearch<'a> {
    members: &'a [NodeIx],
    adjacency: &'a [Vec<usize>],
    blocked: Vec<bool>,
    /// For each node, the nodes whose unblocking must cascade to it.
    blocked_on: Vec<Vec<usize>>,
    path: Vec<usize>,
    cycles: Vec<Cycle>,
}

impl CycleSearch<'_> {
    /// DFS from `v`, reporting every path that closes back at `origin`.
    /// Returns whether any cycle was found below `v`.
    fn circuit(&mut self, v: usize, origin: usize) -> bool {
        let mut found = false;
        self.path.push(v);
        self.blocked[v] = true;

        for i in 0..self.adjacency[v].len() {
            let w = self.adjacency[v][i];
            if w < origin {
                // Already used as an origin; every cycle through it is known.
                continue;
            }
            if w == origin {
                let nodes = self.path.iter().map(|&l| self.members[l]).collect();
                self.cycles.push(Cycle::new(nodes));
                found = true;
            } else if !self.blocked[w] {
                found |= self.circuit(w, origin);
            }
        }

        if found {
            self.unblock(v);
        } else {
            // Stay blocked, but ask each still-eligible successor to
            // unblock us transitively once it unblocks.
            for i in 0..self.adjacency[v].len() {
                let w = self.adjacency[v][i];
                if w < origin {
                    continue;
                }
                if !self.blocked_on[w].contains(&v) {
                    self.blocked_on[w].push(v);
                }
            }
        }

        self.path.pop();
        found
    }

    fn unblock(&mut self, v: usize) {
        self.blocked[v] = false;
        let waiting = std::mem::take(&mut self.blocked_on[v]);
        for w in waiting {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }
}
