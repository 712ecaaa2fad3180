use crate::algo::forest::ForestEvent;
use crate::algo::registry::DisjointSet;
use eda_common::db::cost::{Cost, Dual};
use eda_common::db::graph::SteinerGraph;
use eda_common::db::indices::{EdgeId, NodeId, PairId};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Whether a pair's endpoints are joined by the returned forest. Read off
/// the pruned edges; a completed run reports every pair `Satisfied`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PairStatus {
    Unsatisfied,
    Satisfied,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForestEdge<C> {
    /// Position in the forward-phase insertion order.
    pub seq: usize,
    pub edge: EdgeId,
    pub u: NodeId,
    pub v: NodeId,
    pub cost: C,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub rounds: usize,
    pub stale_events: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SteinerForest<C: Cost> {
    edges: Vec<ForestEdge<C>>,
    total_cost: C,
    pair_status: BTreeMap<PairId, PairStatus>,
    dual_objective: C::Dual,
    forward: Vec<EdgeId>,
    stats: RunStats,
    sources: BTreeSet<NodeId>,
    sinks: BTreeSet<NodeId>,
    steiner_nodes: BTreeSet<NodeId>,
}

impl<C: Cost> SteinerForest<C> {
    /// Pruned edges, ascending in insertion order.
    pub fn edges(&self) -> &[ForestEdge<C>] {
        &self.edges
    }

    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.iter().map(|e| e.edge).collect()
    }

    pub fn total_cost(&self) -> C {
        self.total_cost
    }

    pub fn pair_status(&self) -> &BTreeMap<PairId, PairStatus> {
        &self.pair_status
    }

    pub fn status(&self, pair: PairId) -> Option<PairStatus> {
        self.pair_status.get(&pair).copied()
    }

    pub fn all_satisfied(&self) -> bool {
        self.pair_status.values().all(|s| *s == PairStatus::Satisfied)
    }

    /// Sum of all component dual values; never exceeds the optimum.
    pub fn dual_objective(&self) -> C::Dual {
        self.dual_objective
    }

    pub fn lower_bound(&self) -> f64 {
        self.dual_objective.to_f64()
    }

    /// Forest edges in insertion order before pruning.
    pub fn forward_forest(&self) -> &[EdgeId] {
        &self.forward
    }

    pub fn pruned_count(&self) -> usize {
        self.forward.len() - self.edges.len()
    }

    pub fn rounds(&self) -> usize {
        self.stats.rounds
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn sources(&self) -> &BTreeSet<NodeId> {
        &self.sources
    }

    pub fn sinks(&self) -> &BTreeSet<NodeId> {
        &self.sinks
    }

    /// Forest nodes that are not terminals of any pair.
    pub fn steiner_nodes(&self) -> &BTreeSet<NodeId> {
        &self.steiner_nodes
    }
}

pub(crate) fn assemble<C: Cost>(
    graph: &SteinerGraph<C>,
    forward: &[ForestEvent],
    pruned: &[EdgeId],
    dual_objective: C::Dual,
    stats: RunStats,
) -> SteinerForest<C> {
    let keep: HashSet<EdgeId> = pruned.iter().copied().collect();

    let edges: Vec<ForestEdge<C>> = forward
        .iter()
        .filter(|ev| keep.contains(&ev.edge))
        .map(|ev| {
            let e = graph.edge(ev.edge);
            ForestEdge {
                seq: ev.seq,
                edge: ev.edge,
                u: e.u,
                v: e.v,
                cost: e.cost,
            }
        })
        .collect();

    let total_cost = edges.iter().map(|e| e.cost).fold(C::zero(), |acc, c| acc + c);

    let mut sets = DisjointSet::new(graph.num_nodes());
    for e in &edges {
        sets.union(e.u.0, e.v.0);
    }
    let pair_status: BTreeMap<PairId, PairStatus> = graph
        .pairs()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let status = if sets.find(p.s.0) == sets.find(p.t.0) {
                PairStatus::Satisfied
            } else {
                PairStatus::Unsatisfied
            };
            (PairId::new(i), status)
        })
        .collect();
    let open = pair_status
        .values()
        .filter(|s| **s == PairStatus::Unsatisfied)
        .count();
    if open > 0 {
        log::warn!("Assembled forest leaves {} pair(s) unconnected", open);
    }

    let sources: BTreeSet<NodeId> = graph.pairs().iter().map(|p| p.s).collect();
    let sinks: BTreeSet<NodeId> = graph.pairs().iter().map(|p| p.t).collect();
    let steiner_nodes = edges
        .iter()
        .flat_map(|e| [e.u, e.v])
        .filter(|n| !sources.contains(n) && !sinks.contains(n))
        .collect();

    SteinerForest {
        edges,
        total_cost,
        pair_status,
        dual_objective,
        forward: forward.iter().map(|ev| ev.edge).collect(),
        stats,
        sources,
        sinks,
        steiner_nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eda_common::db::cost::Dyadic;

    fn events(ids: &[u32]) -> Vec<ForestEvent> {
        ids.iter()
            .enumerate()
            .map(|(seq, &e)| ForestEvent {
                seq,
                edge: EdgeId(e),
            })
            .collect()
    }

    #[test]
    fn status_follows_pruned_edges() {
        let g = SteinerGraph::new(
            4,
            [(0, 1, 1u32), (1, 2, 1), (2, 3, 1)],
            [(0, 2), (2, 3), (3, 3)],
        )
        .unwrap();
        // Edge 2 never made it into the forest, so pair 1 stays open.
        let forward = events(&[0, 1]);
        let pruned = [EdgeId(0), EdgeId(1)];
        let forest = assemble(&g, &forward, &pruned, Dyadic::from_int(2), RunStats::default());

        assert_eq!(forest.status(PairId(0)), Some(PairStatus::Satisfied));
        assert_eq!(forest.status(PairId(1)), Some(PairStatus::Unsatisfied));
        assert_eq!(forest.status(PairId(2)), Some(PairStatus::Satisfied));
        assert!(!forest.all_satisfied());
        assert_eq!(forest.total_cost(), 2);
    }

    #[test]
    fn pruned_edges_keep_insertion_order() {
        let g = SteinerGraph::new(3, [(0, 1, 2u32), (0, 2, 1), (1, 2, 5)], [(0, 1)]).unwrap();
        let forward = events(&[1, 0]);
        let pruned = [EdgeId(0)];
        let forest = assemble(&g, &forward, &pruned, Dyadic::from_int(2), RunStats::default());

        assert_eq!(forest.edge_ids(), vec![EdgeId(0)]);
        assert_eq!(forest.edges()[0].seq, 1);
        assert_eq!(forest.forward_forest(), &[EdgeId(1), EdgeId(0)]);
        assert_eq!(forest.pruned_count(), 1);
        assert!(forest.all_satisfied());
    }
}
