use crate::algo::registry::DisjointSet;
use eda_common::db::cost::Cost;
use eda_common::db::graph::SteinerGraph;
use eda_common::db::indices::{EdgeId, NodeId};
use std::collections::HashMap;

/// Removes, from the last inserted edge back to the first, every edge whose
/// removal keeps all terminal pairs connected through the remaining forest.
/// The input order must be the insertion order of the forward phase.
pub fn reverse_delete<C: Cost>(graph: &SteinerGraph<C>, forest: &[EdgeId]) -> Vec<EdgeId> {
    // Compact the nodes the check can ever see so each test touches only
    // forest-sized arrays.
    let mut local: HashMap<NodeId, u32> = HashMap::new();
    let mut intern = |n: NodeId| -> u32 {
        let next = local.len() as u32;
        *local.entry(n).or_insert(next)
    };

    let ends: Vec<(u32, u32)> = forest
        .iter()
        .map(|&id| {
            let e = graph.edge(id);
            (intern(e.u), intern(e.v))
        })
        .collect();
    let pairs: Vec<(u32, u32)> = graph
        .pairs()
        .iter()
        .filter(|p| !p.is_trivial())
        .map(|p| (intern(p.s), intern(p.t)))
        .collect();
    let num_local = local.len();

    let mut kept = vec![true; forest.len()];
    let mut removed = 0;
    for i in (0..forest.len()).rev() {
        kept[i] = false;
        if all_connected(num_local, &ends, &kept, &pairs) {
            removed += 1;
        } else {
            kept[i] = true;
        }
    }

    log::debug!(
        "Reverse delete: {} of {} forest edges removed",
        removed,
        forest.len()
    );

    forest
        .iter()
        .zip(&kept)
        .filter(|(_, k)| **k)
        .map(|(&id, _)| id)
        .collect()
}

fn all_connected(num_nodes: usize, ends: &[(u32, u32)], kept: &[bool], pairs: &[(u32, u32)]) -> bool {
    let mut sets = DisjointSet::new(num_nodes);
    for (&(u, v), _) in ends.iter().zip(kept).filter(|(_, k)| **k) {
        sets.union(u, v);
    }
    pairs.iter().all(|&(s, t)| sets.find(s) == sets.find(t))
}
