pub mod dense;

pub use dense::DenseGrid;

use eda_common::db::indices::NodeId;
use eda_common::geom::coord::GridCoord;

pub trait RoutingGrid: Sync + Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn layers(&self) -> u8;

    fn set_obstacle(&mut self, coord: GridCoord);
    fn clear_obstacle(&mut self, coord: GridCoord);
    fn is_obstacle(&self, coord: GridCoord) -> bool;

    fn contains(&self, coord: GridCoord) -> bool {
        coord.x < self.width() && coord.y < self.height() && coord.z < self.layers()
    }

    fn node(&self, coord: GridCoord) -> Option<NodeId>;
    fn coord(&self, node: NodeId) -> GridCoord;
}
