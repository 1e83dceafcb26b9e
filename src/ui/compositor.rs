/// Frame compositor: one bordered canvas, four panels, fixed margins.
///
/// Layout (M = margin):
///
/// ```text
///   ┌────────────────────────────────────────┐
///   │ M                                      │
///   │ M [ top-left ] M M [ top-right ]       │
///   │ M                                      │
///   │ M [ middle ..................... ]     │
///   │ M                                      │
///   │ M [ bottom ..................... ]     │
///   └────────────────────────────────────────┘
/// ```
///
/// Panel rectangles are computed once from the declared sizes. Every
/// `compose()` call splits the canvas into aliased regions (see
/// `domain::grid`) and lets each panel repaint its own region.

use crossterm::style::Color;

use crate::domain::cell::{bg, Cell};
use crate::domain::grid::{Canvas, Rect, Region};
use crate::error::{ForgeError, ForgeResult};

/// Anything that can paint itself into a fixed-size rectangle.
///
/// `render` must repaint every cell of the region; the previous frame's
/// content is not cleared for it.
pub trait Panel {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn render(&self, region: &mut Region<'_>) -> ForgeResult<()>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Margin {
    pub top: usize,
    pub left: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Margin {
    pub fn uniform(n: usize) -> Self {
        Margin { top: n, left: n, right: n, bottom: n }
    }
}

pub fn border_cell() -> Cell {
    Cell::new(' ', bg(Color::Rgb { r: 100, g: 100, b: 100 }))
}

pub struct Compositor {
    canvas: Canvas,
    rects: [Rect; 4],
}

impl Compositor {
    /// Lay out `[top_left, top_right, middle, bottom]` with `margin`.
    /// Fails if any panel would cover the border ring.
    pub fn new(panels: [&dyn Panel; 4], margin: Margin) -> ForgeResult<Self> {
        let sizes = panels.map(|p| (p.width(), p.height()));
        let (width, height, rects) = layout(sizes, margin);
        let canvas = Canvas::with_border(width, height, border_cell());
        for (i, r) in rects.iter().enumerate() {
            let touches_ring = r.height > 0
                && r.width > 0
                && (r.row == 0 || r.col == 0 || r.bottom() >= canvas.height() || r.right() >= canvas.width());
            if touches_ring {
                return Err(ForgeError::layout(format!(
                    "panel #{i} at ({}, {}) {}x{} overlaps the {}x{} border",
                    r.row, r.col, r.width, r.height, canvas.width(), canvas.height()
                )));
            }
        }
        Ok(Compositor { canvas, rects })
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[cfg(test)]
    pub fn rects(&self) -> &[Rect; 4] {
        &self.rects
    }

    /// Aliased regions for the four panel rectangles, in panel order.
    #[cfg(test)]
    pub fn regions_mut(&mut self) -> ForgeResult<Vec<Region<'_>>> {
        self.canvas.regions_mut(&self.rects)
    }

    /// Have every panel repaint its region. A panel that has grown beyond
    /// its rectangle is a layout bug and aborts the frame.
    pub fn compose(&mut self, panels: [&dyn Panel; 4]) -> ForgeResult<&Canvas> {
        for (i, (panel, rect)) in panels.iter().zip(self.rects.iter()).enumerate() {
            if panel.width() > rect.width || panel.height() > rect.height {
                return Err(ForgeError::layout(format!(
                    "panel #{i} is {}x{} but its region is {}x{}",
                    panel.width(),
                    panel.height(),
                    rect.width,
                    rect.height
                )));
            }
        }

        let mut regions = self.canvas.regions_mut(&self.rects)?;
        for (panel, region) in panels.iter().zip(regions.iter_mut()) {
            panel.render(region)?;
        }
        drop(regions);

        Ok(&self.canvas)
    }
}

/// Canvas size and panel rectangles for the given `(width, height)` sizes.
pub fn layout(sizes: [(usize, usize); 4], m: Margin) -> (usize, usize, [Rect; 4]) {
    let [(tl_w, tl_h), (tr_w, tr_h), (mid_w, mid_h), (bot_w, bot_h)] = sizes;

    let width = (tl_w + tr_w + 2 * (m.left + m.right))
        .max(mid_w + m.left + m.right)
        .max(bot_w + m.left + m.right);
    let top_h = tl_h.max(tr_h);
    let height = top_h + mid_h + bot_h + 3 * (m.top + m.bottom);

    let rects = [
        Rect::new(m.top, m.left, tl_h, tl_w),
        Rect::new(m.top, 2 * m.left + tl_w, tr_h, tr_w),
        Rect::new(2 * m.top + top_h, m.left, mid_h, mid_w),
        Rect::new(3 * m.top + top_h + mid_h, m.left, bot_h, bot_w),
    ];

    (width, height, rects)
}
