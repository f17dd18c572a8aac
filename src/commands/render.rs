use crate::analysis::heatmap::{render, HeatmapConfig};
use crate::analysis::svg::render_svg;
use crate::models::grid::ContributionGrid;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_FILE: &str = "contributions.svg";

/// Renders `grid` at the configured bitmap size and returns the SVG markup.
pub fn render_heatmap_svg(grid: &ContributionGrid, config: &HeatmapConfig) -> String {
    let commands = render(
        grid,
        config.bitmap_width as f32,
        config.bitmap_height as f32,
        config,
    );
    render_svg(&commands, config.bitmap_width, config.bitmap_height)
}

/// Renders and writes the heat-map, replacing any previous file at `out`.
pub fn write_heatmap(grid: &ContributionGrid, config: &HeatmapConfig, out: &Path) -> Result<(), String> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create output directory: {e}"))?;
    }

    // Write beside the target and rename so readers never see a half-written image.
    let tmp = out.with_extension("svg.tmp");
    fs::write(&tmp, render_heatmap_svg(grid, config))
        .map_err(|e| format!("Failed to write {}: {e}", tmp.display()))?;
    fs::rename(&tmp, out).map_err(|e| format!("Failed to replace {}: {e}", out.display()))
}

pub fn default_output_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DEFAULT_OUTPUT_FILE)
}
