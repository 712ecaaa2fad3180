pub mod dual_growth;
pub mod forest;
pub mod registry;
pub mod reverse_delete;
