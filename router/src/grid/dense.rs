use super::RoutingGrid;
use eda_common::db::graph::{GraphBuilder, GraphError, SteinerGraph};
use eda_common::db::indices::NodeId;
use eda_common::db::instance::{GridInstance, PinPair};
use eda_common::geom::coord::GridCoord;

/// Regular multi-layer routing lattice. Every cell is a node; blocked cells
/// stay in the node space but lose all their edges.
#[derive(Clone, Debug)]
pub struct DenseGrid {
    width: u32,
    height: u32,
    layers: u8,
    obstacles: Vec<bool>,
    wire_cost: u32,
    via_cost: u32,
    diagonal_cost: Option<u32>,
}

/// Node ids are 32-bit, so a grid may hold at most this many cells.
pub const MAX_CELLS: usize = u32::MAX as usize;

fn check_cells(cells: usize) -> Result<(), GraphError> {
    if cells > MAX_CELLS {
        log::error!("Grid of {} cells exceeds the 32-bit node space", cells);
        return Err(GraphError::GridTooLarge { cells });
    }
    Ok(())
}

impl DenseGrid {
    /// Allocates one flag per cell. Callers with untrusted dimensions go
    /// through `from_instance`, which rejects grids beyond `MAX_CELLS` first.
    pub fn new(width: u32, height: u32, layers: u8) -> Self {
        let size = (width as usize) * (height as usize) * (layers as usize);

        Self {
            width,
            height,
            layers,
            obstacles: vec![false; size],
            wire_cost: 1,
            via_cost: 4,
            diagonal_cost: None,
        }
    }

    pub fn with_costs(mut self, wire_cost: u32, via_cost: u32) -> Self {
        self.wire_cost = wire_cost;
        self.via_cost = via_cost;
        self
    }

    pub fn with_diagonals(mut self, diagonal_cost: u32) -> Self {
        self.diagonal_cost = Some(diagonal_cost);
        self
    }

    pub fn from_instance(instance: &GridInstance) -> Result<Self, GraphError> {
        check_cells(instance.num_cells())?;
        let mut grid = Self::new(instance.width, instance.height, instance.layers)
            .with_costs(instance.wire_cost, instance.via_cost);
        if instance.diagonals {
            grid = grid.with_diagonals(instance.diagonal_cost);
        }
        for &c in &instance.obstacles {
            if !grid.contains(c) {
                return Err(GraphError::CoordOutOfRange(c.to_string()));
            }
            grid.set_obstacle(c);
        }
        Ok(grid)
    }

    pub fn num_cells(&self) -> usize {
        self.obstacles.len()
    }

    #[inline(always)]
    fn index(&self, coord: GridCoord) -> usize {
        (coord.z as usize) * (self.width as usize) * (self.height as usize)
            + (coord.y as usize) * (self.width as usize)
            + (coord.x as usize)
    }

    fn terminal(&self, coord: GridCoord) -> Result<usize, GraphError> {
        if !self.contains(coord) {
            return Err(GraphError::CoordOutOfRange(coord.to_string()));
        }
        if self.is_obstacle(coord) {
            return Err(GraphError::TerminalOnObstacle(coord.to_string()));
        }
        Ok(self.index(coord))
    }

    fn planar_steps(&self) -> Vec<(i64, i64, u32)> {
        let mut steps = vec![(1, 0, self.wire_cost), (0, 1, self.wire_cost)];
        if let Some(diag) = self.diagonal_cost {
            steps.push((1, 1, diag));
            steps.push((-1, 1, diag));
        }
        steps
    }

    /// Builds the routing graph. Edges are emitted cell by cell in index
    /// order, so edge ids (and with them tie-breaks) are stable.
    pub fn build_graph(&self, pairs: &[PinPair]) -> Result<SteinerGraph<u32>, GraphError> {
        check_cells(self.num_cells())?;
        let mut builder = GraphBuilder::new(self.num_cells());
        let steps = self.planar_steps();

        for z in 0..self.layers {
            for y in 0..self.height {
                for x in 0..self.width {
                    let here = GridCoord::new(x, y, z);
                    if self.is_obstacle(here) {
                        continue;
                    }
                    let from = self.index(here);

                    for &(dx, dy, cost) in &steps {
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.height as i64 {
                            continue;
                        }
                        let there = GridCoord::new(nx as u32, ny as u32, z);
                        if !self.is_obstacle(there) {
                            builder.add_edge(from, self.index(there), cost);
                        }
                    }

                    if z + 1 < self.layers {
                        let above = GridCoord::new(x, y, z + 1);
                        if !self.is_obstacle(above) {
                            builder.add_edge(from, self.index(above), self.via_cost);
                        }
                    }
                }
            }
        }

        for p in pairs {
            let s = self.terminal(p.source)?;
            let t = self.terminal(p.sink)?;
            builder.add_pair(s, t);
        }

        log::debug!(
            "DenseGrid {}x{}x{}: {} routing edges, {} pairs",
            self.width,
            self.height,
            self.layers,
            builder.num_edges(),
            pairs.len()
        );

        builder.build()
    }
}

impl RoutingGrid for DenseGrid {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn layers(&self) -> u8 {
        self.layers
    }

    fn set_obstacle(&mut self, coord: GridCoord) {
        let idx = self.index(coord);
        self.obstacles[idx] = true;
    }

    fn clear_obstacle(&mut self, coord: GridCoord) {
        let idx = self.index(coord);
        self.obstacles[idx] = false;
    }

    fn is_obstacle(&self, coord: GridCoord) -> bool {
        if !self.contains(coord) {
            return true;
        }
        self.obstacles[self.index(coord)]
    }

    fn node(&self, coord: GridCoord) -> Option<NodeId> {
        if self.contains(coord) {
            Some(NodeId::new(self.index(coord)))
        } else {
            None
        }
    }

    fn coord(&self, node: NodeId) -> GridCoord {
        let plane = (self.width as usize) * (self.height as usize);
        let idx = node.index();
        let z = (idx / plane) as u8;
        let rem = idx % plane;
        GridCoord::new(
            (rem % self.width as usize) as u32,
            (rem / self.width as usize) as u32,
            z,
        )
    }
}
