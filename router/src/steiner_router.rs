//! Primal-dual Steiner forest routing.
//!
//! Terminal components grow their moats in lock step until an edge goes
//! tight, the edge joins the forest and the two components merge. Growth
//! stops once no component separates an unsatisfied pair; a reverse-delete
//! pass then trims the forest. The result costs at most twice the dual
//! objective, which itself never exceeds the optimum.

use crate::algo::dual_growth::{DualGrowth, Step};
use crate::algo::forest::ForestBuilder;
use crate::algo::registry::ComponentRegistry;
use crate::algo::reverse_delete::reverse_delete;
use crate::result::{self, RunStats, SteinerForest};
use eda_common::db::cost::{Cost, Dual};
use eda_common::db::graph::{GraphError, SteinerGraph};
use eda_common::db::indices::{EdgeId, PairId};
use eda_common::util::config::SteinerConfig;
use eda_common::util::profiler::ScopedTimer;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SteinerError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] GraphError),
    #[error("{} terminal pair(s) cannot be connected: {unsatisfied:?}", .unsatisfied.len())]
    Disconnected { unsatisfied: Vec<PairId> },
    #[error("routing cancelled after {rounds} rounds")]
    Cancelled { rounds: usize },
}

pub struct SteinerForestSolver<'g, C: Cost> {
    graph: &'g SteinerGraph<C>,
    config: SteinerConfig,
}

impl<'g, C: Cost> SteinerForestSolver<'g, C> {
    pub fn new(graph: &'g SteinerGraph<C>, config: &SteinerConfig) -> Self {
        Self {
            graph,
            config: config.clone(),
        }
    }

    pub fn solve(&self) -> Result<SteinerForest<C>, SteinerError> {
        self.solve_with_cancel(&AtomicBool::new(false))
    }

    /// Like [`solve`](Self::solve), checking `cancel` between growth rounds.
    pub fn solve_with_cancel(&self, cancel: &AtomicBool) -> Result<SteinerForest<C>, SteinerError> {
        let graph = self.graph;
        log::info!(
            "Steiner forest: {} nodes, {} edges, {} pairs",
            graph.num_nodes(),
            graph.num_edges(),
            graph.pairs().len()
        );

        let mut registry: ComponentRegistry<C::Dual> =
            ComponentRegistry::new(graph.num_nodes(), graph.pairs());
        let mut growth = DualGrowth::new(graph, &self.config);
        let mut builder = ForestBuilder::new();

        {
            let _timer = ScopedTimer::new("Steiner forward phase");
            loop {
                if cancel.load(Ordering::Relaxed) {
                    log::warn!("Steiner forest cancelled after {} rounds", growth.rounds());
                    return Err(SteinerError::Cancelled {
                        rounds: growth.rounds(),
                    });
                }
                match growth.next_round(&registry) {
                    Step::Round(round) => {
                        builder.apply_round(graph, &mut registry, &round);
                    }
                    Step::Done => break,
                    Step::Stalled => {
                        let unsatisfied = registry.unsatisfied_pairs();
                        log::error!(
                            "Steiner forest disconnected: {} pair(s) unreachable",
                            unsatisfied.len()
                        );
                        for &pid in &unsatisfied {
                            let p = graph.pair(pid);
                            log::debug!("  pair {}: {:?} -/- {:?}", pid, p.s, p.t);
                        }
                        return Err(SteinerError::Disconnected { unsatisfied });
                    }
                }
            }
        }

        let stats = RunStats {
            rounds: growth.rounds(),
            stale_events: builder.stale_events(),
        };
        let dual_objective = growth.dual_objective();
        let forward = builder.into_events();
        let forward_ids: Vec<EdgeId> = forward.iter().map(|ev| ev.edge).collect();

        let pruned = {
            let _timer = ScopedTimer::new("Steiner reverse delete");
            reverse_delete(graph, &forward_ids)
        };

        let forest = result::assemble(graph, &forward, &pruned, dual_objective, stats);

        log::info!(
            "Steiner forest: {} edges (pruned {}), cost {:?}, lower bound {:.3}, {} rounds",
            forest.edges().len(),
            forest.pruned_count(),
            forest.total_cost(),
            forest.dual_objective().to_f64(),
            stats.rounds
        );

        Ok(forest)
    }
}

pub fn run<C: Cost>(
    graph: &SteinerGraph<C>,
    config: &SteinerConfig,
) -> Result<SteinerForest<C>, SteinerError> {
    SteinerForestSolver::new(graph, config).solve()
}
