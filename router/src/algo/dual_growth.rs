use crate::algo::registry::ComponentRegistry;
use eda_common::db::cost::{Cost, Dual};
use eda_common::db::graph::SteinerGraph;
use eda_common::db::indices::EdgeId;
use eda_common::util::config::SteinerConfig;
use rayon::prelude::*;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowthState {
    Growing,
    Done,
}

/// One synchronized growth step: every active component rises by `delta`,
/// after which `tight` edges (ascending edge id) have zero slack.
#[derive(Clone, Debug)]
pub struct GrowthRound<D> {
    pub delta: D,
    pub tight: Vec<EdgeId>,
    pub active_components: usize,
}

#[derive(Clone, Debug)]
pub enum Step<D> {
    Round(GrowthRound<D>),
    Done,
    /// Active components remain but no edge leaves any of them.
    Stalled,
}

#[derive(Clone, Copy, Debug)]
struct Candidate<D> {
    edge: EdgeId,
    paid: D,
}

#[derive(Clone, Copy, Debug)]
struct Boundary<D> {
    edge: EdgeId,
    step: D,
}

pub struct DualGrowth<'g, C: Cost> {
    graph: &'g SteinerGraph<C>,
    // Edges still crossing two components, in ascending edge id.
    candidates: Vec<Candidate<C::Dual>>,
    state: GrowthState,
    tolerance: f64,
    parallel_threshold: usize,
    dual_objective: C::Dual,
    rounds: usize,
}

impl<'g, C: Cost> DualGrowth<'g, C> {
    pub fn new(graph: &'g SteinerGraph<C>, config: &SteinerConfig) -> Self {
        let candidates = graph
            .edges()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.u != e.v)
            .map(|(i, _)| Candidate {
                edge: EdgeId::new(i),
                paid: C::Dual::zero(),
            })
            .collect();

        Self {
            graph,
            candidates,
            state: GrowthState::Growing,
            tolerance: config.float_tolerance,
            parallel_threshold: config.parallel_scan_threshold.max(1),
            dual_objective: C::Dual::zero(),
            rounds: 0,
        }
    }

    pub fn state(&self) -> GrowthState {
        self.state
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Sum over rounds of delta times the number of active components: the
    /// dual objective that lower-bounds the optimal forest cost.
    pub fn dual_objective(&self) -> C::Dual {
        self.dual_objective
    }

    #[inline(always)]
    fn crossing(&self, registry: &ComponentRegistry<C::Dual>, edge: EdgeId) -> Option<u32> {
        let e = self.graph.edge(edge);
        let ru = registry.root(e.u);
        let rv = registry.root(e.v);
        if ru == rv {
            return None;
        }
        Some(registry.is_active(ru) as u32 + registry.is_active(rv) as u32)
    }

    fn boundary_step(&self, registry: &ComponentRegistry<C::Dual>, c: &Candidate<C::Dual>) -> Option<Boundary<C::Dual>> {
        let crossing = self.crossing(registry, c.edge)?;
        if crossing == 0 {
            return None;
        }
        let slack = self.graph.edge(c.edge).cost.to_dual() - c.paid;
        let slack = if slack < C::Dual::zero() { C::Dual::zero() } else { slack };
        let step = if crossing == 2 { slack.half() } else { slack };
        Some(Boundary {
            edge: c.edge,
            step,
        })
    }

    fn min_boundary(&self, registry: &ComponentRegistry<C::Dual>) -> Option<Boundary<C::Dual>> {
        let order = |a: &Boundary<C::Dual>, b: &Boundary<C::Dual>| {
            a.step
                .partial_cmp(&b.step)
                .unwrap_or(Ordering::Equal)
                .then(a.edge.cmp(&b.edge))
        };

        if self.candidates.len() >= self.parallel_threshold {
            self.candidates
                .par_iter()
                .filter_map(|c| self.boundary_step(registry, c))
                .min_by(order)
        } else {
            self.candidates
                .iter()
                .filter_map(|c| self.boundary_step(registry, c))
                .min_by(order)
        }
    }

    /// Advances one round. Reads the registry only; the caller applies the
    /// returned growth and merges before asking for the next round.
    pub fn next_round(&mut self, registry: &ComponentRegistry<C::Dual>) -> Step<C::Dual> {
        if self.state == GrowthState::Done {
            return Step::Done;
        }
        if registry.active_count() == 0 {
            self.state = GrowthState::Done;
            log::debug!(
                "Dual growth done after {} rounds (dual objective {:.3})",
                self.rounds,
                self.dual_objective.to_f64()
            );
            return Step::Done;
        }

        // Edges inside one component never become candidates again.
        let graph = self.graph;
        self.candidates.retain(|c| {
            let e = graph.edge(c.edge);
            registry.root(e.u) != registry.root(e.v)
        });

        let Some(best) = self.min_boundary(registry) else {
            log::warn!(
                "Dual growth stalled: {} active components have no boundary edges",
                registry.active_count()
            );
            return Step::Stalled;
        };
        let delta = best.step;
        let tolerance = self.tolerance;

        let paid_update = |c: &mut Candidate<C::Dual>| -> Option<EdgeId> {
            let e = graph.edge(c.edge);
            let ru = registry.root(e.u);
            let rv = registry.root(e.v);
            let crossing = registry.is_active(ru) as u32 + registry.is_active(rv) as u32;
            if crossing == 0 {
                return None;
            }
            let cost = e.cost.to_dual();
            c.paid = c.paid + delta.scale(crossing);
            if c.edge == best.edge || (cost - c.paid).is_tight(tolerance) {
                c.paid = cost;
                Some(c.edge)
            } else {
                None
            }
        };

        let tight: Vec<EdgeId> = if self.candidates.len() >= self.parallel_threshold {
            self.candidates.par_iter_mut().filter_map(paid_update).collect()
        } else {
            self.candidates.iter_mut().filter_map(paid_update).collect()
        };

        let active = registry.active_count();
        self.dual_objective = self.dual_objective + delta.scale(active as u32);
        self.rounds += 1;

        log::trace!(
            "Round {}: delta {:.4}, active {}, tight {:?}",
            self.rounds,
            delta.to_f64(),
            active,
            tight
        );

        Step::Round(GrowthRound {
            delta,
            tight,
            active_components: active,
        })
    }
}
