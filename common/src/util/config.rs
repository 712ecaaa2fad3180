use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub steiner: SteinerConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SteinerConfig {
    /// Absolute slack below which a floating-point edge counts as tight.
    #[serde(default = "default_float_tolerance")]
    pub float_tolerance: f64,
    /// Boundary scans with at least this many candidate edges run on rayon.
    #[serde(default = "default_parallel_scan_threshold")]
    pub parallel_scan_threshold: usize,
    #[serde(default = "default_verify")]
    pub verify: bool,
}

impl Default for SteinerConfig {
    fn default() -> Self {
        Self {
            float_tolerance: default_float_tolerance(),
            parallel_scan_threshold: default_parallel_scan_threshold(),
            verify: default_verify(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GridConfig {
    #[serde(default = "default_grid_width")]
    pub width: u32,
    #[serde(default = "default_grid_height")]
    pub height: u32,
    #[serde(default = "default_grid_layers")]
    pub layers: u8,
    #[serde(default = "default_wire_cost")]
    pub wire_cost: u32,
    #[serde(default = "default_via_cost")]
    pub via_cost: u32,
    #[serde(default)]
    pub diagonals: bool,
    #[serde(default = "default_diagonal_cost")]
    pub diagonal_cost: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_grid_width(),
            height: default_grid_height(),
            layers: default_grid_layers(),
            wire_cost: default_wire_cost(),
            via_cost: default_via_cost(),
            diagonals: false,
            diagonal_cost: default_diagonal_cost(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_instance_file")]
    pub instance_file: String,
    #[serde(default)]
    pub output_file: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            instance_file: default_instance_file(),
            output_file: None,
        }
    }
}

fn default_float_tolerance() -> f64 {
    1e-9
}

fn default_parallel_scan_threshold() -> usize {
    4096
}

fn default_verify() -> bool {
    true
}

fn default_grid_width() -> u32 {
    32
}

fn default_grid_height() -> u32 {
    32
}

fn default_grid_layers() -> u8 {
    2
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

fn default_instance_file() -> String {
    "inputs/instance.toml".to_string()
}
