//! Count-to-color bucketing and the draw-command layout of the heat-map.

use crate::models::grid::{ContributionGrid, DAYS, WEEKS};
use serde::{Deserialize, Serialize};

pub const GAP: f32 = 4.0;
pub const OUTLINE_WIDTH: f32 = 2.0;
pub const OUTLINE_COLOR: Rgb = Rgb(0x00, 0x00, 0x00);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Visual intensity of a cell. The coarse table only uses `Empty` through `Level3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Intensity {
    Empty,
    Level1,
    Level2,
    Level3,
    Level4,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTable {
    /// `0, 1, 2, 3+` → empty, light, medium, dark.
    #[default]
    Coarse,
    /// `0, 1, 2, 3-4, 5+` → empty, level 1..4.
    Fine,
}

impl ColorTable {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "coarse" => Some(Self::Coarse),
            "fine" => Some(Self::Fine),
            _ => None,
        }
    }

    pub fn intensity(self, count: u32) -> Intensity {
        match self {
            Self::Coarse => match count {
                c if c >= 3 => Intensity::Level3,
                2 => Intensity::Level2,
                1 => Intensity::Level1,
                _ => Intensity::Empty,
            },
            Self::Fine => match count {
                c if c >= 5 => Intensity::Level4,
                3 | 4 => Intensity::Level3,
                2 => Intensity::Level2,
                1 => Intensity::Level1,
                _ => Intensity::Empty,
            },
        }
    }

    pub fn color(self, intensity: Intensity) -> Rgb {
        match self {
            Self::Coarse => match intensity {
                Intensity::Empty => Rgb(0x44, 0x44, 0x44),
                Intensity::Level1 => Rgb(0x90, 0xEE, 0x90),
                Intensity::Level2 => Rgb(0x00, 0xFF, 0x00),
                Intensity::Level3 | Intensity::Level4 => Rgb(0x00, 0x80, 0x00),
            },
            Self::Fine => match intensity {
                Intensity::Empty => Rgb(0xEB, 0xED, 0xF0),
                Intensity::Level1 => Rgb(0x9B, 0xE9, 0xA8),
                Intensity::Level2 => Rgb(0x40, 0xC4, 0x63),
                Intensity::Level3 => Rgb(0x30, 0xA1, 0x4E),
                Intensity::Level4 => Rgb(0x21, 0x6E, 0x39),
            },
        }
    }
}

/// Per-deployment knobs for the widget and app variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapConfig {
    pub color_table: ColorTable,
    pub corner_radius: f32,
    pub cache_enabled: bool,
    pub bitmap_width: u32,
    pub bitmap_height: u32,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            color_table: ColorTable::Coarse,
            corner_radius: 10.0,
            cache_enabled: true,
            bitmap_width: 693,
            bitmap_height: 198,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    FillRoundRect {
        rect: Rect,
        radius: f32,
        color: Rgb,
    },
    StrokeRoundRect {
        rect: Rect,
        radius: f32,
        color: Rgb,
        stroke_width: f32,
    },
}

/// Side of a square cell so that 25x7 cells plus gaps fit inside the surface.
pub fn cell_size(width: f32, height: f32) -> f32 {
    let by_width = (width - (WEEKS as f32 + 1.0) * GAP) / WEEKS as f32;
    let by_height = (height - (DAYS as f32 + 1.0) * GAP) / DAYS as f32;
    by_width.min(by_height)
}

/// Lays out the grid as fill-then-outline pairs, row by row. A surface too small to hold a
/// positive cell produces no commands.
pub fn render(grid: &ContributionGrid, width: f32, height: f32, config: &HeatmapConfig) -> Vec<DrawCommand> {
    let size = cell_size(width, height);
    if !size.is_finite() || size <= 0.0 {
        return Vec::new();
    }

    let mut commands = Vec::with_capacity(DAYS * WEEKS * 2);
    for row in 0..DAYS {
        for col in 0..WEEKS {
            let left = col as f32 * (size + GAP) + GAP;
            let top = row as f32 * (size + GAP) + GAP;
            let rect = Rect {
                left,
                top,
                right: left + size,
                bottom: top + size,
            };

            let intensity = config.color_table.intensity(grid.get(row, col));
            commands.push(DrawCommand::FillRoundRect {
                rect,
                radius: config.corner_radius,
                color: config.color_table.color(intensity),
            });
            commands.push(DrawCommand::StrokeRoundRect {
                rect,
                radius: config.corner_radius,
                color: OUTLINE_COLOR,
                stroke_width: OUTLINE_WIDTH,
            });
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coarse_table_matches_reference_counts() {
        let table = ColorTable::Coarse;
        let levels: Vec<_> = [0, 1, 2, 3, 7].iter().map(|&c| table.intensity(c)).collect();
        assert_eq!(
            levels,
            vec![
                Intensity::Empty,
                Intensity::Level1,
                Intensity::Level2,
                Intensity::Level3,
                Intensity::Level3
            ]
        );
    }

    #[test]
    fn fine_table_groups_three_and_four() {
        let table = ColorTable::Fine;
        assert_eq!(table.intensity(0), Intensity::Empty);
        assert_eq!(table.intensity(1), Intensity::Level1);
        assert_eq!(table.intensity(2), Intensity::Level2);
        assert_eq!(table.intensity(3), Intensity::Level3);
        assert_eq!(table.intensity(4), Intensity::Level3);
        assert_eq!(table.intensity(5), Intensity::Level4);
        assert_eq!(table.intensity(u32::MAX), Intensity::Level4);
    }

    #[test]
    fn cells_are_square_and_sized_by_the_tighter_axis() {
        // Widget bitmap: height is the limiting axis.
        let size = cell_size(693.0, 198.0);
        assert!((size - (198.0 - 8.0 * GAP) / 7.0).abs() < 1e-4);

        let commands = render(&ContributionGrid::empty(), 693.0, 198.0, &HeatmapConfig::default());
        assert_eq!(commands.len(), DAYS * WEEKS * 2);
        let DrawCommand::FillRoundRect { rect, .. } = &commands[0] else {
            panic!("first command should be a fill");
        };
        assert_eq!(rect.left, GAP);
        assert_eq!(rect.top, GAP);
        assert!((rect.width() - rect.height()).abs() < 1e-4);
    }

    #[test]
    fn outline_follows_each_fill() {
        let mut grid = ContributionGrid::empty();
        grid.increment(0, 0);
        grid.increment(0, 0);

        let commands = render(&grid, 693.0, 198.0, &HeatmapConfig::default());
        match (&commands[0], &commands[1]) {
            (
                DrawCommand::FillRoundRect { rect: fill, color, radius },
                DrawCommand::StrokeRoundRect { rect: stroke, color: outline, stroke_width, .. },
            ) => {
                assert_eq!(fill, stroke);
                assert_eq!(*color, Rgb(0x00, 0xFF, 0x00));
                assert_eq!(*radius, 10.0);
                assert_eq!(*outline, OUTLINE_COLOR);
                assert_eq!(*stroke_width, OUTLINE_WIDTH);
            }
            other => panic!("unexpected command pair: {other:?}"),
        }
    }

    #[test]
    fn last_cell_lands_in_the_bottom_right() {
        let commands = render(&ContributionGrid::empty(), 693.0, 198.0, &HeatmapConfig::default());
        let size = cell_size(693.0, 198.0);
        let Some(DrawCommand::StrokeRoundRect { rect, .. }) = commands.last() else {
            panic!("last command should be an outline");
        };
        assert!((rect.left - (24.0 * (size + GAP) + GAP)).abs() < 1e-3);
        assert!((rect.top - (6.0 * (size + GAP) + GAP)).abs() < 1e-3);
    }

    #[test]
    fn tiny_surface_renders_nothing() {
        assert!(render(&ContributionGrid::empty(), 50.0, 20.0, &HeatmapConfig::default()).is_empty());
    }

    #[test]
    fn undersized_data_renders_as_empty_cells() {
        let grid = ContributionGrid::from_rows(&[vec![3]]).unwrap();
        let config = HeatmapConfig::default();
        let commands = render(&grid, 693.0, 198.0, &config);

        let empty = config.color_table.color(Intensity::Empty);
        let fills: Vec<Rgb> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRoundRect { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), DAYS * WEEKS);
        assert_eq!(fills[0], Rgb(0x00, 0x80, 0x00));
        assert!(fills[1..].iter().all(|&c| c == empty));
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(Rgb(0x90, 0xEE, 0x90).hex(), "#90EE90");
    }
}
