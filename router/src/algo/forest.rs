use crate::algo::dual_growth::GrowthRound;
use crate::algo::registry::{ComponentRegistry, RegistryError};
use eda_common::db::cost::Cost;
use eda_common::db::graph::SteinerGraph;
use eda_common::db::indices::EdgeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ForestEvent {
    pub seq: usize,
    pub edge: EdgeId,
}

/// Turns tight-edge events into merges and keeps the forest in insertion
/// order. The only writer of the component registry.
#[derive(Debug, Default)]
pub struct ForestBuilder {
    events: Vec<ForestEvent>,
    stale: usize,
}

impl ForestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forest(&self) -> &[ForestEvent] {
        &self.events
    }

    /// Tight events discarded because an earlier tie had already joined
    /// their endpoints.
    pub fn stale_events(&self) -> usize {
        self.stale
    }

    pub fn into_events(self) -> Vec<ForestEvent> {
        self.events
    }

    pub fn apply_round<C: Cost>(
        &mut self,
        graph: &SteinerGraph<C>,
        registry: &mut ComponentRegistry<C::Dual>,
        round: &GrowthRound<C::Dual>,
    ) -> usize {
        registry.grow(round.delta);
        round
            .tight
            .iter()
            .filter(|&&edge| self.on_tight(graph, registry, edge))
            .count()
    }

    /// Returns whether the event produced a merge.
    pub fn on_tight<C: Cost>(
        &mut self,
        graph: &SteinerGraph<C>,
        registry: &mut ComponentRegistry<C::Dual>,
        edge: EdgeId,
    ) -> bool {
        let e = graph.edge(edge);
        if registry.same_component(e.u, e.v) {
            self.stale += 1;
            log::trace!("Discarding stale tight edge {:?}", edge);
            return false;
        }

        let spanning = registry.spanning_pairs(e.u, e.v);
        let seq = self.events.len();
        self.events.push(ForestEvent { seq, edge });

        let root = match registry.union(e.u, e.v) {
            Ok(root) => root,
            Err(RegistryError::RedundantUnion(..)) => {
                self.events.pop();
                return false;
            }
        };

        for &pair in &spanning {
            registry.mark_satisfied(pair);
        }

        log::trace!(
            "Edge {:?} ({:?} - {:?}) joined #{}, satisfied {:?}, component {:?} active: {}",
            edge,
            e.u,
            e.v,
            seq,
            spanning,
            root,
            registry.is_active(root)
        );
        true
    }
}
