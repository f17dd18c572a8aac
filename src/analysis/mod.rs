pub mod bucketing;
pub mod heatmap;
pub mod svg;
