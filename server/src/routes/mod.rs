pub mod api;
pub mod heatmap;
