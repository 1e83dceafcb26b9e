/// Art grid: a pre-colored, possibly ragged picture plus the derived
/// "body row" index the build scene walks.
///
/// Derived data is computed once in `ArtGrid::new` and never patched; a new
/// picture means a new `ArtGrid`.

use crossterm::style::Color;

use crate::domain::cell::{fg, Cell};
use crate::domain::grid::{max_width, Grid};
use crate::error::{ForgeError, ForgeResult};

#[derive(Clone, Debug)]
pub struct ArtGrid {
    grid: Grid,
    /// Rows with at least one non-blank cell, top to bottom.
    body_rows: Vec<usize>,
    /// Per body row: non-blank column indices, left to right.
    row_cells: Vec<Vec<usize>>,
}

impl ArtGrid {
    /// Validate and index a grid. A grid without any non-blank cell is a
    /// configuration error.
    pub fn new(name: &str, grid: Grid) -> ForgeResult<Self> {
        let mut body_rows = Vec::new();
        let mut row_cells = Vec::new();

        for (y, row) in grid.iter().enumerate() {
            let cols: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_blank())
                .map(|(x, _)| x)
                .collect();
            if !cols.is_empty() {
                body_rows.push(y);
                row_cells.push(cols);
            }
        }

        if body_rows.is_empty() {
            return Err(ForgeError::art(name, "art has no visible content"));
        }

        Ok(ArtGrid { grid, body_rows, row_cells })
    }

    /// Build from plain text: each char gets the color from `palette`, or
    /// `default` when it has no entry. Spaces stay unstyled blanks.
    pub fn from_text(
        name: &str,
        text: &str,
        palette: &[(char, Color)],
        default: Color,
    ) -> ForgeResult<Self> {
        let grid = text
            .lines()
            .map(|line| {
                line.chars()
                    .map(|ch| {
                        if ch == ' ' {
                            return Cell::BLANK;
                        }
                        let color = palette
                            .iter()
                            .find(|(c, _)| *c == ch)
                            .map(|(_, color)| *color)
                            .unwrap_or(default);
                        Cell::new(ch, fg(color))
                    })
                    .collect()
            })
            .collect();
        Self::new(name, grid)
    }

    pub fn width(&self) -> usize {
        max_width(&self.grid)
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }

    pub fn body_rows(&self) -> &[usize] {
        &self.body_rows
    }

    pub fn body_row_count(&self) -> usize {
        self.body_rows.len()
    }

    /// Non-blank columns of the `body_idx`-th body row.
    pub fn row_cells(&self, body_idx: usize) -> &[usize] {
        &self.row_cells[body_idx]
    }

    pub fn first_col(&self, body_idx: usize) -> usize {
        self.row_cells[body_idx][0]
    }

    /// Cell at art coordinates (blank when out of range).
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.grid.get(row).and_then(|r| r.get(col)).copied().unwrap_or(Cell::BLANK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_rows_skip_blank_lines() {
        let art = ArtGrid::from_text("t", " ab\n\n   \n c d", &[], Color::Red).unwrap();
        assert_eq!(art.body_rows(), &[0, 3]);
        assert_eq!(art.row_cells(0), &[1, 2]);
        assert_eq!(art.row_cells(1), &[1, 3]);
        assert_eq!(art.first_col(1), 1);
        assert_eq!(art.width(), 4);
        assert_eq!(art.height(), 4);
    }

    #[test]
    fn palette_with_default() {
        let art = ArtGrid::from_text("t", "|x", &[('|', Color::Green)], Color::Red).unwrap();
        assert_eq!(art.cell(0, 0), Cell::fg('|', Color::Green));
        assert_eq!(art.cell(0, 1), Cell::fg('x', Color::Red));
        assert_eq!(art.cell(5, 5), Cell::BLANK);
    }

    #[test]
    fn empty_art_is_rejected() {
        assert!(matches!(
            ArtGrid::from_text("void", "   \n\n", &[], Color::Red),
            Err(ForgeError::Art { .. })
        ));
        assert!(ArtGrid::new("nothing", Vec::new()).is_err());
    }
}
