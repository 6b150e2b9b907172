//! Strongly connected component decomposition (Tarjan's algorithm).
//!
//! Partitions the graph into maximal mutually-reachable node groups and
//! derives the condensation graph (one node per component). Tarjan emits
//! components in reverse topological order of the condensation, so the
//! reversed emission order is returned directly. The condensation is
//! acyclic by construction, since a cycle of components would have been a
//! single larger component.
//!
//! # References
//! - Tarjan, R. "Depth-First Search and Linear Graph Algorithms" (1972)

use rustc_hash::FxHashSet;

use crate::cycles::{self, Cycle};
use crate::graph::{Graph, NodeIx};

const UNVISITED: u32 = u32::MAX;

/// One strongly connected component, with its condensation adjacency.
///
/// `outgoing`/`incoming` are indices into the component sequence returned
/// by [`Graph::strongly_connected_components`].
#[derive(Debug)]
pub struct Scc {
    pub(crate) nodes: Vec<NodeIx>,
    pub(crate) outgoing: Vec<usize>,
    pub(crate) incoming: Vec<usize>,
}

impl Scc {
    /// Member nodes of this component.
    pub fn nodes(&self) -> &[NodeIx] {
        &self.nodes
    }

    /// Components this one has edges into.
    pub fn outgoing(&self) -> &[usize] {
        &self.outgoing
    }

    /// Components with edges into this one.
    pub fn incoming(&self) -> &[usize] {
        &self.incoming
    }

    /// Every elementary cycle within this component.
    ///
    /// A single node yields nothing unless it carries a self-loop. Each
    /// distinct cycle is reported once; the rotation it is reported at is
    /// an artifact of the search order, so canonicalize before comparing.
    ///
    /// Cost grows with the number of cycles in the component (factorial
    /// in size for a complete digraph), so call this lazily and at most
    /// once per component.
    pub fn elementary_cycles(&self, graph: &Graph) -> Vec<Cycle> {
        cycles::elementary_cycles(graph, &self.nodes)
    }
}

impl Graph {
    /// Decompose the graph into strongly connected components, returned in
    /// a topological order of the condensation graph: if component X has
    /// an edge to component Y, X occurs before Y.
    pub fn strongly_connected_components(&self) -> Vec<Scc> {
        let mut state = TarjanState {
            graph: self,
            index: vec![UNVISITED; self.node_count()],
            lowlink: vec![0; self.node_count()],
            on_stack: vec![false; self.node_count()],
            stack: Vec::new(),
            next_index: 0,
            components: Vec::new(),
        };

        for raw in 0..self.node_count() {
            let node = NodeIx::new(raw);
            if state.index[node.index()] == UNVISITED {
                state.connect(node);
            }
        }

        // Tarjan emits sinks first; reverse for condensation order.
        state.components.reverse();
        let components = state.components;

        let mut comp_of = vec![0usize; self.node_count()];
        for (comp_ix, members) in components.iter().enumerate() {
            for &node in members {
                comp_of[node.index()] = comp_ix;
            }
        }

        let mut sccs: Vec<Scc> = components
            .into_iter()
            .map(|nodes| Scc {
                nodes,
                outgoing: Vec::new(),
                incoming: Vec::new(),
            })
            .collect();

        // Condensation edges, deduplicated across member edges.
        let mut seen = FxHashSet::default();
        for raw in 0..self.node_count() {
            let from = NodeIx::new(raw);
            for &to in self.outgoing(from) {
                let (from_comp, to_comp) = (comp_of[from.index()], comp_of[to.index()]);
                if from_comp == to_comp || !seen.insert((from_comp, to_comp)) {
                    continue;
                }
                sccs[from_comp].outgoing.push(to_comp);
                sccs[to_comp].incoming.push(from_comp);
            }
        }

        sccs
    }
}

struct TarjanState<'g> {
    graph: &'g Graph,
    index: Vec<u32>,
    lowlink: Vec<u32>,
    on_stack: Vec<bool>,
    stack: Vec<NodeIx>,
    next_index: u32,
    components: Vec<Vec<NodeIx>>,
}

impl TarjanState<'_> {
    fn connect(&mut self, v: NodeIx) {
        self.index[v.index()] = self.next_index;
        self.lowlink[v.index()] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v.index()] = true;

        for &w in self.graph.outgoing(v) {
            if self.index[w.index()] == UNVISITED {
                self.connect(w);
                self.lowlink[v.index()] = self.lowlink[v.index()].min(self.lowlink[w.index()]);
            } else if self.on_stack[w.index()] {
                self.lowlink[v.index()] = self.lowlink[v.index()].min(self.index[w.index()]);
            }
        }

        // v is the root of a component: pop the stack down to it.
        if self.lowlink[v.index()] == self.index[v.index()] {
            let mut component = Vec::new();
            loop {
                let w = self.stack.pop().expect("tarjan stack underflow");
                self.on_stack[w.index()] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::label::{FieldLabel, StringInterner};

    fn labels(interner: &mut StringInterner, names: &[&str]) -> Vec<FieldLabel> {
        names.iter().map(|n| interner.label(n)).collect()
    }

    fn component_names(interner: &StringInterner, graph: &Graph, scc: &Scc) -> Vec<String> {
        let mut names: Vec<String> = scc
            .nodes()
            .iter()
            .map(|&ix| match graph.label(ix) {
                FieldLabel::Name(token) => interner.resolve(token).to_owned(),
                FieldLabel::Index(i) => i.to_string(),
            })
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_chain_yields_singleton_components() {
        let mut interner = StringInterner::new();
        let chain = labels(&mut interner, &["a", "b", "c"]);

        let mut builder = GraphBuilder::new();
        builder.add_chain(&chain);
        let graph = builder.build();

        let sccs = graph.strongly_connected_components();
        assert_eq!(sccs.len(), 3);
        // Condensation order must follow the chain.
        assert_eq!(component_names(&interner, &graph, &sccs[0]), vec!["a"]);
        assert_eq!(component_names(&interner, &graph, &sccs[1]), vec!["b"]);
        assert_eq!(component_names(&interner, &graph, &sccs[2]), vec!["c"]);
    }

    #[test]
    fn test_two_cycle_collapses_to_one_component() {
        let mut interner = StringInterner::new();
        let f = interner.label("f");
        let g = interner.label("g");

        let mut builder = GraphBuilder::new();
        builder.add_edge(g, f);
        builder.add_edge(f, g);
        let graph = builder.build();

        let sccs = graph.strongly_connected_components();
        assert_eq!(sccs.len(), 1);
        assert_eq!(component_names(&interner, &graph, &sccs[0]), vec!["f", "g"]);
        assert!(sccs[0].outgoing().is_empty());
        assert!(sccs[0].incoming().is_empty());
    }

    #[test]
    fn test_self_loop_is_a_singleton_component() {
        let mut interner = StringInterner::new();
        let a = interner.label("a");

        let mut builder = GraphBuilder::new();
        builder.add_edge(a, a);
        let graph = builder.build();

        let sccs = graph.strongly_connected_components();
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].nodes().len(), 1);
    }

    #[test]
    fn test_condensation_is_topologically_ordered() {
        let mut interner = StringInterner::new();
        // a -> {f,g} cycle -> d, built deliberately out of order.
        let a = interner.label("a");
        let d = interner.label("d");
        let f = interner.label("f");
        let g = interner.label("g");

        let mut builder = GraphBuilder::new();
        builder.add_edge(g, d);
        builder.add_edge(f, g);
        builder.add_edge(g, f);
        builder.add_edge(a, f);
        let graph = builder.build();

        let sccs = graph.strongly_connected_components();
        assert_eq!(sccs.len(), 3);

        // Every outgoing edge must point at a later component.
        for (ix, scc) in sccs.iter().enumerate() {
            for &next in scc.outgoing() {
                assert!(next > ix, "component {ix} points backwards at {next}");
            }
        }

        let all: Vec<Vec<String>> = sccs
            .iter()
            .map(|scc| component_names(&interner, &graph, scc))
            .collect();
        assert_eq!(all[0], vec!["a"]);
        assert_eq!(all[1], vec!["f", "g"]);
        assert_eq!(all[2], vec!["d"]);
    }

    #[test]
    fn test_components_partition_all_nodes() {
        let mut interner = StringInterner::new();
        let chains = [
            labels(&mut interner, &["a", "b", "c"]),
            labels(&mut interner, &["a", "d", "e"]),
            labels(&mut interner, &["c", "b"]),
            labels(&mut interner, &["e", "d"]),
        ];

        let mut builder = GraphBuilder::new();
        for chain in &chains {
            builder.add_chain(chain);
        }
        let graph = builder.build();

        let sccs = graph.strongly_connected_components();
        let mut seen: Vec<NodeIx> = sccs.iter().flat_map(|s| s.nodes().to_vec()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), graph.node_count());

        let mut all: Vec<Vec<String>> = sccs
            .iter()
            .map(|scc| component_names(&interner, &graph, scc))
            .collect();
        all.sort();
        assert_eq!(
            all,
            vec![vec!["a"], vec!["b", "c"], vec!["d", "e"]]
                .into_iter()
                .map(|v: Vec<&str>| v.into_iter().map(String::from).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        );
    }
}
