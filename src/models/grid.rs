use serde::{Deserialize, Serialize};

pub const DAYS: usize = 7;
pub const WEEKS: usize = 25;

/// Accepted submissions per day: 7 rows (day index, Sunday first) by 25 columns (week index,
/// oldest first). The newest column holds "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionGrid {
    cells: [[u32; WEEKS]; DAYS],
}

impl Default for ContributionGrid {
    fn default() -> Self {
        Self::empty()
    }
}

impl ContributionGrid {
    pub fn empty() -> Self {
        Self {
            cells: [[0; WEEKS]; DAYS],
        }
    }

    /// Count at `(day, week)`, or 0 when the index is outside the grid.
    pub fn get(&self, day: usize, week: usize) -> u32 {
        self.cells
            .get(day)
            .and_then(|row| row.get(week))
            .copied()
            .unwrap_or(0)
    }

    /// Adds one to `(day, week)`. Out-of-range indices are ignored and reported as `false`.
    pub fn increment(&mut self, day: usize, week: usize) -> bool {
        match self.cells.get_mut(day).and_then(|row| row.get_mut(week)) {
            Some(cell) => {
                *cell = cell.saturating_add(1);
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &[[u32; WEEKS]; DAYS] {
        &self.cells
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().map(|&c| u64::from(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|&c| c == 0)
    }

    /// Builds a grid from possibly short rows, zero-filling whatever is missing.
    /// Fails if the input is larger than 7x25.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, String> {
        if rows.len() > DAYS {
            return Err(format!("expected at most {DAYS} rows, got {}", rows.len()));
        }

        let mut grid = Self::empty();
        for (day, row) in rows.iter().enumerate() {
            if row.len() > WEEKS {
                return Err(format!(
                    "row {day} has {} columns, expected at most {WEEKS}",
                    row.len()
                ));
            }
            grid.cells[day][..row.len()].copy_from_slice(row);
        }
        Ok(grid)
    }
}
