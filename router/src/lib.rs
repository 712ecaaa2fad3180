pub mod algo;
pub mod grid;
pub mod result;
pub mod steiner_router;

pub use algo::reverse_delete::reverse_delete;
pub use result::{ForestEdge, PairStatus, RunStats, SteinerForest};
pub use steiner_router::{run as steiner_forest, SteinerError, SteinerForestSolver};

use eda_common::db::graph::SteinerGraph;
use eda_common::db::instance::GridInstance;
use eda_common::geom::coord::GridCoord;
use eda_common::util::config::SteinerConfig;
use grid::{DenseGrid, RoutingGrid};

/// A routed grid instance: the grid, the graph built from it and the forest.
pub struct GridRoute {
    pub grid: DenseGrid,
    pub graph: SteinerGraph<u32>,
    pub forest: SteinerForest<u32>,
}

impl GridRoute {
    /// Forest edges as coordinate segments, in forest order.
    pub fn segments(&self) -> Vec<(GridCoord, GridCoord)> {
        self.forest
            .edges()
            .iter()
            .map(|e| (self.grid.coord(e.u), self.grid.coord(e.v)))
            .collect()
    }
}

pub fn route_instance(instance: &GridInstance, config: &SteinerConfig) -> Result<GridRoute, SteinerError> {
    let grid = DenseGrid::from_instance(instance)?;
    let graph = grid.build_graph(&instance.pairs)?;
    let forest = steiner_forest(&graph, config)?;
    Ok(GridRoute { grid, graph, forest })
}
