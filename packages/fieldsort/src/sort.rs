//! Cycle-aware topological scheduling of field nodes.
//!
//! Components are walked in condensation order through a ready queue kept
//! sorted by label comparison; within a component, ready nodes are emitted
//! greedily in label order. When a component gets stuck on a true cycle,
//! the configured [`CycleBreaking`] strategy decides how to proceed:
//! either the remaining nodes are emitted as one label-sorted block, or
//! the component's elementary cycles are enumerated once and the best
//! cycle/entry pair is chosen by the broken-edge heuristic.
//!
//! The output is total (every node exactly once), a valid topological
//! order whenever one exists, and identical for every insertion order of
//! the same logical edge set.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cycles::Cycle;
use crate::graph::{Graph, NodeIx};
use crate::label::{FieldLabel, LabelCmp, LabelResolver};
use crate::scc::Scc;

/// How to proceed when a component cannot be scheduled by precedence alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleBreaking {
    /// Emit the stuck component's remaining nodes as one block, in label
    /// order, with no attempt at partial ordering inside the cycle. The
    /// default: cost stays linear however tangled the component is.
    #[default]
    SortedBlock,
    /// Enumerate the component's elementary cycles and enter the one that
    /// breaks the fewest incoming edges, preserving the maximum partial
    /// order. Combinatorial worst case; intended for small components.
    ElementaryCycles,
}

/// Scheduling state of one node. Written exactly once per node when it is
/// assigned its final position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Unsorted,
    /// Member of the component currently being scheduled.
    InCurrentScc,
    Sorted(usize),
}

impl Slot {
    fn is_sorted(self) -> bool {
        matches!(self, Slot::Sorted(_))
    }
}

impl Graph {
    /// Sort the graph's labels into a single deterministic sequence using
    /// the default [`CycleBreaking`] strategy.
    ///
    /// Consumes the graph: scheduling state is single-use, so a fresh
    /// graph must be built per sort.
    pub fn sort<R: LabelResolver>(self, resolver: &R) -> Vec<FieldLabel> {
        self.sort_with(resolver, CycleBreaking::default())
    }

    /// Sort with an explicit cycle-breaking strategy.
    ///
    /// As far as possible this is a topological sort. Whenever there is a
    /// choice of which label comes next, the smallest label is taken.
    /// With [`CycleBreaking::ElementaryCycles`], entry into a cycle picks,
    /// in order: fewest violated incoming edges, earliest reachable entry
    /// position, smallest entry label, smallest cycle sequence.
    ///
    /// # Panics
    /// Panics if a non-trivial component is stuck yet contains no
    /// elementary cycle. That contradicts the component decomposition and
    /// is an internal bug, not an input condition.
    pub fn sort_with<R: LabelResolver>(
        self,
        resolver: &R,
        strategy: CycleBreaking,
    ) -> Vec<FieldLabel> {
        let mut components = self.strongly_connected_components();
        let mut scheduler = Scheduler {
            graph: &self,
            cmp: LabelCmp::new(resolver),
            strategy,
            slots: vec![Slot::Unsorted; self.node_count()],
            sorted: Vec::with_capacity(self.node_count()),
        };

        for component in &mut components {
            component.nodes.sort_by(|&a, &b| scheduler.node_cmp(a, b));
        }

        let mut visited = vec![false; components.len()];
        let mut visited_count = 0;
        let mut ready: Vec<usize> = (0..components.len())
            .filter(|&c| components[c].incoming().is_empty())
            .collect();
        ready.sort_by(|&a, &b| scheduler.comp_cmp(&components[a], &components[b]));

        while visited_count != components.len() {
            assert!(
                !ready.is_empty(),
                "ready queue drained with {} of {} components unscheduled; \
                 condensation graph is inconsistent",
                components.len() - visited_count,
                components.len()
            );
            let current = ready.remove(0);
            // A component may have been enqueued more than once.
            if visited[current] {
                continue;
            }
            visited[current] = true;
            visited_count += 1;
            trace!(
                component = current,
                size = components[current].nodes().len(),
                "scheduling component"
            );
            scheduler.schedule_component(&components[current]);

            let mut added = false;
            'outgoing: for &next in components[current].outgoing() {
                for &required in components[next].incoming() {
                    if !visited[required] {
                        continue 'outgoing;
                    }
                }
                ready.push(next);
                added = true;
            }
            if added {
                ready.sort_by(|&a, &b| scheduler.comp_cmp(&components[a], &components[b]));
            }
        }

        let order = scheduler.sorted;
        order.into_iter().map(|ix| self.label(ix)).collect()
    }
}

struct Scheduler<'g, 'r, R: LabelResolver> {
    graph: &'g Graph,
    cmp: LabelCmp<'r, R>,
    strategy: CycleBreaking,
    slots: Vec<Slot>,
    sorted: Vec<NodeIx>,
}

/// Scores of one candidate cycle while choosing where to enter.
struct Candidate {
    at: usize,
    broken: usize,
    enabled_since: usize,
    entry: NodeIx,
}

impl<R: LabelResolver> Scheduler<'_, '_, R> {
    fn node_cmp(&self, a: NodeIx, b: NodeIx) -> Ordering {
        self.cmp.labels(self.graph.label(a), self.graph.label(b))
    }

    /// Pairwise label comparison, then by length.
    fn node_seq_cmp(&self, a: &[NodeIx], b: &[NodeIx]) -> Ordering {
        for (&x, &y) in a.iter().zip(b.iter()) {
            match self.node_cmp(x, y) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        a.len().cmp(&b.len())
    }

    fn comp_cmp(&self, a: &Scc, b: &Scc) -> Ordering {
        self.node_seq_cmp(a.nodes(), b.nodes())
    }

    /// Assign positions to every node of one component.
    fn schedule_component(&mut self, component: &Scc) {
        // Cycles are computed at most once, on first getting stuck.
        let mut unused_cycles: Option<Vec<Option<Cycle>>> = None;

        // Members are label-sorted already, so this list is too.
        let mut ready_nodes: Vec<NodeIx> = Vec::new();
        'next: for &node in component.nodes() {
            self.slots[node.index()] = Slot::InCurrentScc;
            for &required in self.graph.incoming(node) {
                if !self.slots[required.index()].is_sorted() {
                    continue 'next;
                }
            }
            ready_nodes.push(node);
        }

        let target = self.sorted.len() + component.nodes().len();
        while self.sorted.len() != target {
            if ready_nodes.is_empty() {
                self.enter_cycle(component, &mut unused_cycles, &mut ready_nodes);
            } else {
                let node = ready_nodes.remove(0);
                self.place(&[node], &mut ready_nodes);
            }
        }
    }

    /// Unblock a stuck component according to the configured strategy.
    fn enter_cycle(
        &mut self,
        component: &Scc,
        unused_cycles: &mut Option<Vec<Option<Cycle>>>,
        ready_nodes: &mut Vec<NodeIx>,
    ) {
        match self.strategy {
            CycleBreaking::SortedBlock => {
                let block: Vec<NodeIx> = component
                    .nodes()
                    .iter()
                    .copied()
                    .filter(|&node| !self.slots[node.index()].is_sorted())
                    .collect();
                trace!(size = block.len(), "stuck component: emitting sorted block");
                self.place(&block, ready_nodes);
            }
            CycleBreaking::ElementaryCycles => {
                let unused = unused_cycles.get_or_insert_with(|| {
                    component
                        .elementary_cycles(self.graph)
                        .into_iter()
                        .map(Some)
                        .collect()
                });
                let Some(cycle) = self.choose_cycle(unused) else {
                    panic!(
                        "component of {} nodes is stuck but has no elementary cycle; \
                         SCC and cycle computations disagree",
                        component.nodes().len()
                    );
                };
                self.place(cycle.nodes(), ready_nodes);
            }
        }
    }

    /// Pick the best unused cycle and rotate it to its entry node.
    fn choose_cycle(&self, unused: &mut [Option<Cycle>]) -> Option<Cycle> {
        let mut best: Option<Candidate> = None;

        for (at, slot) in unused.iter().enumerate() {
            let Some(cycle) = slot else { continue };
            let (entry, enabled_since, broken) = self.cycle_entry(cycle);
            // No scheduled predecessor anywhere: default to the smallest
            // node of the cycle.
            let entry = entry.unwrap_or_else(|| {
                cycle
                    .nodes()
                    .iter()
                    .copied()
                    .min_by(|&a, &b| self.node_cmp(a, b))
                    .expect("cycle with no nodes")
            });

            let better = match &best {
                None => true,
                Some(chosen) => match broken.cmp(&chosen.broken) {
                    Ordering::Less => true,
                    Ordering::Greater => false,
                    Ordering::Equal => match enabled_since.cmp(&chosen.enabled_since) {
                        Ordering::Less => true,
                        Ordering::Greater => false,
                        Ordering::Equal => match self.node_cmp(entry, chosen.entry) {
                            Ordering::Less => true,
                            Ordering::Greater => false,
                            // Same entry node: fall back to comparing the
                            // full cycle sequences.
                            Ordering::Equal => {
                                let chosen_cycle = unused[chosen.at]
                                    .as_ref()
                                    .expect("chosen cycle already taken");
                                self.node_seq_cmp(cycle.nodes(), chosen_cycle.nodes())
                                    == Ordering::Less
                            }
                        },
                    },
                },
            };
            if better {
                best = Some(Candidate {
                    at,
                    broken,
                    enabled_since,
                    entry,
                });
            }
        }

        let best = best?;
        let mut cycle = unused[best.at].take().expect("best cycle already taken");
        trace!(
            entry = ?self.graph.label(best.entry),
            broken = best.broken,
            "entering cycle"
        );
        cycle.rotate_to_start_at(best.entry);
        Some(cycle)
    }

    /// Score one cycle: how many incoming edges from outside the cycle
    /// would be violated by entering it now, and the earliest position of
    /// an already-scheduled predecessor (with the node it enables).
    fn cycle_entry(&self, cycle: &Cycle) -> (Option<NodeIx>, usize, usize) {
        let mut entry = None;
        let mut enabled_since = usize::MAX;
        let mut broken = 0usize;

        for &node in cycle.nodes() {
            if self.slots[node.index()].is_sorted() {
                continue;
            }
            for &incoming in self.graph.incoming(node) {
                match self.slots[incoming.index()] {
                    Slot::Sorted(position) => {
                        if position < enabled_since {
                            enabled_since = position;
                            entry = Some(node);
                        }
                    }
                    // An unscheduled predecessor inside the cycle itself
                    // is not broken by entering the cycle.
                    _ if cycle.contains(incoming) => {}
                    _ => broken += 1,
                }
            }
        }

        (entry, enabled_since, broken)
    }

    /// Place a batch of nodes, then pull any members of the current
    /// component that just became ready into the ready list.
    fn place(&mut self, batch: &[NodeIx], ready_nodes: &mut Vec<NodeIx>) {
        let mut needs_sort = false;
        for &node in batch {
            if self.slots[node.index()].is_sorted() {
                continue;
            }
            self.slots[node.index()] = Slot::Sorted(self.sorted.len());
            self.sorted.push(node);

            'outgoing: for &next in self.graph.outgoing(node) {
                if self.slots[next.index()] != Slot::InCurrentScc {
                    continue;
                }
                for &required in self.graph.incoming(next) {
                    if !self.slots[required.index()].is_sorted() {
                        continue 'outgoing;
                    }
                }
                ready_nodes.push(next);
                needs_sort = true;
            }
        }
        if needs_sort {
            ready_nodes.sort_by(|&a, &b| self.node_cmp(a, b));
        }
    }
}
