/// Grids, the shared canvas, and aliased regions into it.
///
/// ## Aliasing model
///
/// `Canvas` owns every cell of the frame. `Canvas::regions_mut` carves a set
/// of non-overlapping rectangles out of it and returns one `Region` per
/// rectangle. A region holds `&mut` slices pointing straight into the canvas
/// rows, so writes land in the final frame without an intermediate copy.
/// Because the rectangles are disjoint, the borrow checker lets all regions
/// live at once; a region can only ever reach its own cells.

use crate::domain::cell::Cell;
use crate::error::{ForgeError, ForgeResult};

/// Ragged 2D grid of cells (row-major). Art grids and panel frames use this.
pub type Grid = Vec<Vec<Cell>>;

/// Widest row of a (possibly ragged) grid.
pub fn max_width(grid: &[Vec<Cell>]) -> usize {
    grid.iter().map(|row| row.len()).max().unwrap_or(0)
}

// ── Rect ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub row: usize,
    pub col: usize,
    pub height: usize,
    pub width: usize,
}

impl Rect {
    pub fn new(row: usize, col: usize, height: usize, width: usize) -> Self {
        Rect { row, col, height, width }
    }

    pub fn bottom(&self) -> usize {
        self.row + self.height
    }

    pub fn right(&self) -> usize {
        self.col + self.width
    }

    #[cfg(test)]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.row && row < self.bottom() && col >= self.col && col < self.right()
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.row < other.bottom()
            && other.row < self.bottom()
            && self.col < other.right()
            && other.col < self.right()
    }
}

// ── Canvas ──

pub struct Canvas {
    width: usize,
    height: usize,
    rows: Vec<Vec<Cell>>,
}

impl Canvas {
    /// Blank canvas with a one-cell ring of `border` around the edge.
    pub fn with_border(width: usize, height: usize, border: Cell) -> Self {
        let mut rows = vec![vec![Cell::BLANK; width]; height];
        for (y, row) in rows.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                if y == 0 || y + 1 == height || x == 0 || x + 1 == width {
                    *cell = border;
                }
            }
        }
        Canvas { width, height, rows }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[cfg(test)]
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Plain-text rows (symbols only).
    #[cfg(test)]
    pub fn text_rows(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.iter().map(|c| c.symbol).collect()).collect()
    }

    /// Split the canvas into one aliased region per rect.
    ///
    /// Fails if a rect leaves the canvas or two rects overlap.
    pub fn regions_mut(&mut self, rects: &[Rect]) -> ForgeResult<Vec<Region<'_>>> {
        for (i, r) in rects.iter().enumerate() {
            if r.bottom() > self.height || r.right() > self.width {
                return Err(ForgeError::layout(format!(
                    "rect #{i} {r:?} exceeds canvas {}x{}",
                    self.width, self.height
                )));
            }
            for (j, other) in rects.iter().enumerate().skip(i + 1) {
                if r.overlaps(other) {
                    return Err(ForgeError::layout(format!(
                        "rect #{i} {r:?} overlaps rect #{j} {other:?}"
                    )));
                }
            }
        }

        let mut regions: Vec<Region<'_>> = rects
            .iter()
            .map(|r| Region { width: r.width, rows: Vec::with_capacity(r.height) })
            .collect();

        for (y, row) in self.rows.iter_mut().enumerate() {
            let mut covering: Vec<usize> = (0..rects.len())
                .filter(|&i| y >= rects[i].row && y < rects[i].bottom())
                .collect();
            if covering.is_empty() {
                continue;
            }
            covering.sort_by_key(|&i| rects[i].col);

            let mut rest: &mut [Cell] = row.as_mut_slice();
            let mut consumed = 0;
            for i in covering {
                let r = rects[i];
                let (_, tail) = std::mem::take(&mut rest).split_at_mut(r.col - consumed);
                let (piece, tail) = tail.split_at_mut(r.width);
                regions[i].rows.push(piece);
                rest = tail;
                consumed = r.right();
            }
        }

        Ok(regions)
    }
}

// ── Region ──

/// A mutable rectangle of the canvas. Writes outside it are dropped.
pub struct Region<'a> {
    width: usize,
    rows: Vec<&'a mut [Cell]>,
}

impl<'a> Region<'a> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = cell;
        }
    }

    pub fn fill(&mut self, cell: Cell) {
        for row in self.rows.iter_mut() {
            row.fill(cell);
        }
    }

    /// Write a run of cells starting at (row, col), clipped to the region.
    pub fn put_cells(&mut self, row: usize, col: usize, cells: &[Cell]) {
        for (i, cell) in cells.iter().enumerate() {
            self.set(row, col + i, *cell);
        }
    }
}

/// Copy `src` into the whole of `dst`, blanking every destination cell the
/// source doesn't cover. The source must fit inside the destination.
pub fn copy_into(src: &[Vec<Cell>], dst: &mut Region<'_>) -> ForgeResult<()> {
    if src.len() > dst.height() {
        return Err(ForgeError::region(format!(
            "source height {} exceeds destination height {}",
            src.len(),
            dst.height()
        )));
    }
    let src_w = max_width(src);
    if src_w > dst.width() {
        return Err(ForgeError::region(format!(
            "source width {src_w} exceeds destination width {}",
            dst.width()
        )));
    }

    for (y, dst_row) in dst.rows.iter_mut().enumerate() {
        let src_row = src.get(y).map(|r| r.as_slice()).unwrap_or(&[]);
        for (x, slot) in dst_row.iter_mut().enumerate() {
            *slot = src_row.get(x).copied().unwrap_or(Cell::BLANK);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::style::Color;

    fn border() -> Cell {
        Cell::fg('#', Color::Grey)
    }

    #[test]
    fn border_ring_only() {
        let c = Canvas::with_border(5, 4, border());
        assert_eq!(c.text_rows(), vec!["#####", "#   #", "#   #", "#####"]);
    }

    #[test]
    fn regions_alias_canvas() {
        let mut c = Canvas::with_border(10, 6, border());
        {
            let mut regions = c
                .regions_mut(&[Rect::new(1, 1, 2, 3), Rect::new(1, 5, 2, 4)])
                .unwrap();
            regions[0].fill(Cell::plain('a'));
            regions[1].fill(Cell::plain('b'));
        }
        assert_eq!(c.text_rows()[1], "#aaa bbbb#");
        assert_eq!(c.text_rows()[2], "#aaa bbbb#");
        assert_eq!(c.text_rows()[3], "#        #");
    }

    #[test]
    fn overlapping_rects_rejected() {
        let mut c = Canvas::with_border(10, 6, border());
        let err = c.regions_mut(&[Rect::new(1, 1, 3, 3), Rect::new(2, 2, 2, 2)]);
        assert!(matches!(err, Err(ForgeError::Layout(_))));
    }

    #[test]
    fn out_of_bounds_rect_rejected() {
        let mut c = Canvas::with_border(10, 6, border());
        assert!(c.regions_mut(&[Rect::new(4, 0, 3, 2)]).is_err());
        assert!(c.regions_mut(&[Rect::new(0, 8, 1, 3)]).is_err());
    }

    #[test]
    fn region_writes_are_clipped() {
        let mut c = Canvas::with_border(6, 5, border());
        {
            let mut regions = c.regions_mut(&[Rect::new(1, 1, 2, 2)]).unwrap();
            let r = &mut regions[0];
            r.put_cells(0, 0, &[Cell::plain('x'); 5]);
            r.set(7, 0, Cell::plain('z'));
        }
        assert_eq!(c.text_rows(), vec!["######", "#xx  #", "#    #", "#    #", "######"]);
    }

    #[test]
    fn copy_clears_uncovered_cells() {
        let mut c = Canvas::with_border(7, 5, border());
        let mut regions = c.regions_mut(&[Rect::new(1, 1, 3, 5)]).unwrap();
        regions[0].fill(Cell::plain('.'));
        let src = vec![vec![Cell::plain('a'), Cell::plain('b')], vec![Cell::plain('c')]];
        copy_into(&src, &mut regions[0]).unwrap();
        assert_eq!(regions[0].get(0, 0), Some(Cell::plain('a')));
        assert_eq!(regions[0].get(0, 1), Some(Cell::plain('b')));
        assert_eq!(regions[0].get(0, 2), Some(Cell::BLANK));
        assert_eq!(regions[0].get(1, 1), Some(Cell::BLANK));
        assert_eq!(regions[0].get(2, 4), Some(Cell::BLANK));
    }

    #[test]
    fn copy_rejects_oversized_source() {
        let mut c = Canvas::with_border(6, 5, border());
        let mut regions = c.regions_mut(&[Rect::new(1, 1, 2, 2)]).unwrap();
        let too_wide = vec![vec![Cell::plain('a'); 3]];
        let too_tall = vec![vec![Cell::plain('a')]; 3];
        assert!(matches!(copy_into(&too_wide, &mut regions[0]), Err(ForgeError::Region(_))));
        assert!(matches!(copy_into(&too_tall, &mut regions[0]), Err(ForgeError::Region(_))));
    }
}
