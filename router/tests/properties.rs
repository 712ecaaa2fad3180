use eda_common::db::graph::SteinerGraph;
use eda_common::util::check;
use eda_common::util::config::{GridConfig, SteinerConfig};
use eda_common::util::generator::generate_random_instance;
use eda_router::{reverse_delete, route_instance, steiner_forest, SteinerError};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Instance = (usize, Vec<(usize, usize, u32)>, Vec<(usize, usize)>);

/// Random spanning tree plus extra edges (self-loops and parallels allowed).
fn connected_instance() -> impl Strategy<Value = Instance> {
    (2usize..12)
        .prop_flat_map(|n| {
            let tree = prop::collection::vec((any::<prop::sample::Index>(), 0u32..10), n - 1);
            let extra = prop::collection::vec((0..n, 0..n, 0u32..10), 0..2 * n);
            let pairs = prop::collection::vec((0..n, 0..n), 1..5);
            (Just(n), tree, extra, pairs)
        })
        .prop_map(|(n, tree, extra, pairs)| {
            let mut edges: Vec<(usize, usize, u32)> = tree
                .into_iter()
                .enumerate()
                .map(|(i, (parent, cost))| (i + 1, parent.index(i + 1), cost))
                .collect();
            edges.extend(extra);
            (n, edges, pairs)
        })
}

fn build(instance: &Instance) -> SteinerGraph<u32> {
    let (n, edges, pairs) = instance;
    SteinerGraph::new(*n, edges.iter().copied(), pairs.iter().copied()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn forest_is_connected_and_minimal(instance in connected_instance()) {
        let g = build(&instance);
        let forest = steiner_forest(&g, &SteinerConfig::default()).unwrap();

        prop_assert!(forest.all_satisfied());
        prop_assert!(check::check_connectivity(&g, &forest.edge_ids()).is_ok());
        prop_assert!(check::check_minimality(&g, &forest.edge_ids()).is_ok());
        prop_assert!(check::run(&g, &forest.edge_ids(), forest.total_cost()).is_ok());
    }

    #[test]
    fn cost_within_twice_the_dual(instance in connected_instance()) {
        let g = build(&instance);
        let forest = steiner_forest(&g, &SteinerConfig::default()).unwrap();
        prop_assert!(forest.total_cost() as f64 <= 2.0 * forest.lower_bound() + 1e-9);
    }

    #[test]
    fn runs_are_deterministic(instance in connected_instance()) {
        let g = build(&instance);
        let seq = SteinerConfig {
            parallel_scan_threshold: usize::MAX,
            ..SteinerConfig::default()
        };
        let par = SteinerConfig {
            parallel_scan_threshold: 1,
            ..SteinerConfig::default()
        };
        let a = steiner_forest(&g, &seq).unwrap();
        let b = steiner_forest(&g, &seq).unwrap();
        let c = steiner_forest(&g, &par).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
    }

    #[test]
    fn re_pruning_is_a_no_op(instance in connected_instance()) {
        let g = build(&instance);
        let forest = steiner_forest(&g, &SteinerConfig::default()).unwrap();
        let ids = forest.edge_ids();
        prop_assert_eq!(reverse_delete(&g, &ids), ids);
    }

    #[test]
    fn float_costs_keep_the_bound(instance in connected_instance()) {
        let (n, edges, pairs) = instance;
        let g = SteinerGraph::new(
            n,
            edges.iter().map(|&(u, v, c)| (u, v, c as f64 * 0.75)),
            pairs.iter().copied(),
        )
        .unwrap();
        let forest = steiner_forest(&g, &SteinerConfig::default()).unwrap();
        prop_assert!(check::check_connectivity(&g, &forest.edge_ids()).is_ok());
        prop_assert!(check::check_minimality(&g, &forest.edge_ids()).is_ok());
        prop_assert!(forest.total_cost() <= 2.0 * forest.lower_bound() + 1e-6);
    }

    #[test]
    fn split_graph_reports_crossing_pairs(instance in connected_instance()) {
        // Two copies of the same graph side by side, plus one pair across.
        let (n, edges, pairs) = instance;
        let mirrored = edges.iter().map(|&(u, v, c)| (u + n, v + n, c));
        let g = SteinerGraph::new(
            2 * n,
            edges.iter().copied().chain(mirrored),
            pairs.iter().copied().chain([(0, n)]),
        )
        .unwrap();
        let crossing = eda_common::db::indices::PairId::new(pairs.len());
        match steiner_forest(&g, &SteinerConfig::default()) {
            Err(SteinerError::Disconnected { unsatisfied }) => {
                prop_assert!(unsatisfied.contains(&crossing));
            }
            other => prop_assert!(false, "expected Disconnected, got {:?}", other),
        }
    }
}

#[test]
fn large_random_graph_parallel_matches_sequential() {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 200;
    let mut edges: Vec<(usize, usize, u32)> = (1..n)
        .map(|i| (i, rng.gen_range(0..i), rng.gen_range(1..50)))
        .collect();
    for _ in 0..3 * n {
        edges.push((rng.gen_range(0..n), rng.gen_range(0..n), rng.gen_range(1..50)));
    }
    let pairs: Vec<(usize, usize)> = (0..30)
        .map(|_| (rng.gen_range(0..n), rng.gen_range(0..n)))
        .collect();
    let g = SteinerGraph::new(n, edges, pairs).unwrap();

    let seq = SteinerConfig {
        parallel_scan_threshold: usize::MAX,
        ..SteinerConfig::default()
    };
    let par = SteinerConfig {
        parallel_scan_threshold: 64,
        ..SteinerConfig::default()
    };
    let a = steiner_forest(&g, &seq).unwrap();
    let b = steiner_forest(&g, &par).unwrap();
    assert_eq!(a, b);
    check::run(&g, &a.edge_ids(), a.total_cost()).unwrap();
    assert!(a.total_cost() as f64 <= 2.0 * a.lower_bound() + 1e-9);
}

#[test]
fn generated_grid_instances_route_cleanly() {
    let grid = GridConfig {
        width: 12,
        height: 10,
        layers: 2,
        ..GridConfig::default()
    };
    for seed in 0..4 {
        let instance = generate_random_instance(&grid, 6, 0.0, Some(seed));
        let routed = route_instance(&instance, &SteinerConfig::default()).unwrap();
        let forest = &routed.forest;
        check::run(&routed.graph, &forest.edge_ids(), forest.total_cost()).unwrap();
        assert!(forest.total_cost() as f64 <= 2.0 * forest.lower_bound() + 1e-9);
        assert_eq!(routed.segments().len(), forest.edges().len());
    }
}
