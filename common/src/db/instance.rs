use crate::geom::coord::GridCoord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinPair {
    pub source: GridCoord,
    pub sink: GridCoord,
}

/// A routing-grid problem: lattice dimensions, blocked cells and the pin
/// pairs that must end up connected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridInstance {
    #[serde(default = "default_name")]
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_layers")]
    pub layers: u8,
    #[serde(default = "default_wire_cost")]
    pub wire_cost: u32,
    #[serde(default = "default_via_cost")]
    pub via_cost: u32,
    #[serde(default)]
    pub diagonals: bool,
    #[serde(default = "default_diagonal_cost")]
    pub diagonal_cost: u32,
    #[serde(default)]
    pub obstacles: Vec<GridCoord>,
    #[serde(default)]
    pub pairs: Vec<PinPair>,
}

impl GridInstance {
    pub fn new(width: u32, height: u32, layers: u8) -> Self {
        Self {
            name: default_name(),
            width,
            height,
            layers,
            wire_cost: default_wire_cost(),
            via_cost: default_via_cost(),
            diagonals: false,
            diagonal_cost: default_diagonal_cost(),
            obstacles: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// Saturates instead of wrapping on absurd dimensions.
    pub fn num_cells(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(self.layers as usize)
    }
}

fn default_name() -> String {
    "design".to_string()
}

fn default_layers() -> u8 {
    1
}

fn default_wire_cost() -> u32 {
    1
}

fn default_via_cost() -> u32 {
    4
}

fn default_diagonal_cost() -> u32 {
    1
}
