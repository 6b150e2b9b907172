//! Property-based tests for the field ordering engine.
//!
//! Invariants that must hold for all possible inputs:
//! - Totality: every label appears in the output exactly once
//! - Determinism: output is invariant under edge insertion order
//! - Validity: on acyclic graphs the output is a topological order
//! - Agreement: both cycle-breaking strategies coincide on acyclic graphs

use fieldsort::{CycleBreaking, FieldLabel, GraphBuilder, StringInterner};
use proptest::prelude::*;

const MAX_NODES: usize = 8;

fn interner_with(n: usize) -> (StringInterner, Vec<FieldLabel>) {
    let mut interner = StringInterner::new();
    let labels = (0..n).map(|i| interner.label(&format!("f{i:02}"))).collect();
    (interner, labels)
}

/// A node count and an arbitrary edge list over those nodes.
fn arb_edges() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1..=MAX_NODES).prop_flat_map(|n| {
        (
            Just(n),
            proptest::collection::vec((0..n, 0..n), 0..=2 * MAX_NODES),
        )
    })
}

/// Edges constrained to point from a smaller to a larger node id, which
/// rules out cycles by construction.
fn arb_dag_edges() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2..=MAX_NODES).prop_flat_map(|n| {
        (
            Just(n),
            proptest::collection::vec(
                (0..n - 1).prop_flat_map(move |from| (Just(from), from + 1..n)),
                0..=2 * MAX_NODES,
            ),
        )
    })
}

fn sort_edges(
    n: usize,
    edges: &[(usize, usize)],
    strategy: CycleBreaking,
) -> (Vec<FieldLabel>, Vec<FieldLabel>) {
    let (interner, labels) = interner_with(n);
    let mut builder = GraphBuilder::new();
    for &label in &labels {
        builder.ensure_node(label);
    }
    for &(from, to) in edges {
        builder.add_edge(labels[from], labels[to]);
    }
    (builder.build().sort_with(&interner, strategy), labels)
}

proptest! {
    #[test]
    fn prop_sort_is_a_permutation_of_the_labels(
        (n, edges) in arb_edges(),
        strategy in prop_oneof![
            Just(CycleBreaking::SortedBlock),
            Just(CycleBreaking::ElementaryCycles),
        ],
    ) {
        let (order, labels) = sort_edges(n, &edges, strategy);
        prop_assert_eq!(order.len(), n);

        let mut seen = order.clone();
        let mut expected = labels;
        // FieldLabel has no context-free Ord, so compare as debug keys.
        seen.sort_by_key(|l| format!("{l:?}"));
        expected.sort_by_key(|l| format!("{l:?}"));
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn prop_sort_is_invariant_under_insertion_order(
        (n, edges, shuffled) in arb_edges().prop_flat_map(|(n, edges)| {
            (Just(n), Just(edges.clone()), Just(edges).prop_shuffle())
        }),
    ) {
        for strategy in [CycleBreaking::SortedBlock, CycleBreaking::ElementaryCycles] {
            let (a, _) = sort_edges(n, &edges, strategy);
            let (b, _) = sort_edges(n, &shuffled, strategy);
            prop_assert_eq!(a, b, "strategy {:?}", strategy);
        }
    }

    #[test]
    fn prop_acyclic_sort_respects_every_edge(
        (n, edges) in arb_dag_edges(),
    ) {
        let (order, labels) = sort_edges(n, &edges, CycleBreaking::ElementaryCycles);
        let position = |label: FieldLabel| {
            order.iter().position(|&l| l == label).expect("label missing")
        };
        for &(from, to) in &edges {
            if from == to {
                continue;
            }
            prop_assert!(
                position(labels[from]) < position(labels[to]),
                "edge ({from}, {to}) violated in {order:?}"
            );
        }
    }

    #[test]
    fn prop_strategies_agree_on_acyclic_graphs(
        (n, edges) in arb_dag_edges(),
    ) {
        let (sorted_block, _) = sort_edges(n, &edges, CycleBreaking::SortedBlock);
        let (elementary, _) = sort_edges(n, &edges, CycleBreaking::ElementaryCycles);
        prop_assert_eq!(sorted_block, elementary);
    }
}
