pub mod cost;
pub mod graph;
pub mod indices;
pub mod instance;
