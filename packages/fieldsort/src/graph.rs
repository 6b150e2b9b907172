//! Precedence graph over record fields: arena storage plus mutable builder.
//!
//! Nodes live in a single dense arena indexed by [`NodeIx`]; adjacency is
//! kept as index lists in both directions, so components and cycles can
//! refer to nodes without owning them. A [`GraphBuilder`] accumulates
//! nodes and idempotent edges, then freezes into a [`Graph`]. Each graph
//! supports exactly one sort: sorting consumes it, and callers rebuild one
//! per record being rendered (cheap, proportional to its field count).

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::label::FieldLabel;

/// Dense index of a node within one [`Graph`] arena.
///
/// Indices are only meaningful for the graph that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIx(u32);

impl NodeIx {
    pub(crate) fn new(index: usize) -> Self {
        NodeIx(index as u32)
    }

    /// Position of this node in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One field node: its label and adjacency in both directions.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) label: FieldLabel,
    pub(crate) outgoing: Vec<NodeIx>,
    pub(crate) incoming: Vec<NodeIx>,
}

/// Accumulates field nodes and precedence edges before freezing a graph.
///
/// An edge `(from, to)` means "`from` should be emitted no later than
/// `to`, when feasible". No semantic validation is performed: self-loops,
/// repeated edges, and isolated nodes are all legal inputs.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    by_label: FxHashMap<FieldLabel, NodeIx>,
    edges_seen: FxHashSet<(NodeIx, NodeIx)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the node for `label`. Never fails.
    ///
    /// Needed for fields that are not connected to any other field but
    /// must still appear in the output.
    pub fn ensure_node(&mut self, label: FieldLabel) -> NodeIx {
        if let Some(&ix) = self.by_label.get(&label) {
            return ix;
        }
        let ix = NodeIx::new(self.nodes.len());
        self.nodes.push(Node {
            label,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        });
        self.by_label.insert(label, ix);
        ix
    }

    /// Add a precedence edge between two labels, creating nodes as needed.
    ///
    /// Idempotent: repeating the same ordered pair adds nothing. No edge
    /// multiplicity is tracked.
    pub fn add_edge(&mut self, from: FieldLabel, to: FieldLabel) {
        let from_ix = self.ensure_node(from);
        let to_ix = self.ensure_node(to);
        if !self.edges_seen.insert((from_ix, to_ix)) {
            return;
        }
        self.nodes[from_ix.index()].outgoing.push(to_ix);
        self.nodes[to_ix.index()].incoming.push(from_ix);
    }

    /// Insert one precedence chain: every label gets a node, and each
    /// consecutive pair gets an edge.
    ///
    /// This is the shape in which declaration order and resolved field
    /// references arrive from the caller.
    pub fn add_chain(&mut self, labels: &[FieldLabel]) {
        let Some((&first, rest)) = labels.split_first() else {
            return;
        };
        let mut prev = first;
        self.ensure_node(prev);
        for &label in rest {
            self.add_edge(prev, label);
            prev = label;
        }
    }

    /// Freeze the accumulated nodes into an immutable [`Graph`].
    pub fn build(self) -> Graph {
        Graph { nodes: self.nodes }
    }
}

/// The frozen precedence graph. Single-use: [`Graph::sort`] consumes it.
#[derive(Debug)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
}

impl Graph {
    /// Number of distinct field labels in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The label of a node.
    pub fn label(&self, ix: NodeIx) -> FieldLabel {
        self.nodes[ix.index()].label
    }

    /// Map a node sequence back to its labels.
    pub fn labels(&self, ixs: &[NodeIx]) -> Vec<FieldLabel> {
        ixs.iter().map(|&ix| self.label(ix)).collect()
    }

    pub(crate) fn outgoing(&self, ix: NodeIx) -> &[NodeIx] {
        &self.nodes[ix.index()].outgoing
    }

    pub(crate) fn incoming(&self, ix: NodeIx) -> &[NodeIx] {
        &self.nodes[ix.index()].incoming
    }
}
