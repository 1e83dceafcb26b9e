/// Progressive-build scene: a crane stacks the product row by row.
///
/// ## Build order
///
/// Body rows are built bottom-up. Build index 0 is the lowest body row and
/// build index `n-1` the topmost. For a completion fraction `p`:
///
///   scaled  = p * n
///   active  = floor(scaled)            (clamped to n-1)
///   partial = scaled - active          -> floor(partial * cells) revealed
///
/// Rows below `active` are complete, the active row shows the crane arm,
/// rows above it show only the pillar.
///
/// ## Active row layout
///
/// ```text
///   ├───>**  .--'|'
///   ^ pillar  ^ sparks, gap, then revealed cells at natural columns
/// ```
///
/// The frame size is fixed at construction to the largest art so swapping
/// products never changes the panel's rectangle.

use crossterm::style::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::art::ArtGrid;
use crate::domain::cell::Cell;
use crate::domain::grid::{copy_into, Grid, Region};
use crate::domain::product::Product;
use crate::error::{ForgeError, ForgeResult};
use crate::ui::compositor::Panel;

const PILLAR_WIDTH: usize = 1;
/// Arm tip (1) + sparks (2) + gap (1).
const CRANE_OVERHEAD: usize = 4;
pub const CONTENT_OFFSET: usize = PILLAR_WIDTH + CRANE_OVERHEAD;

const PILLAR: char = '│';
const PILLAR_JUNCTION: char = '├';
const ARM: char = '─';
const ARM_TIP: char = '>';

const SPARK_CHARS: [char; 5] = ['*', '#', '@', '%', '&'];
const SPARK_COLOR: Color = Color::Yellow;
const CRANE_COLOR: Color = Color::White;
const CELEBRATION_COLORS: [Color; 5] =
    [Color::Yellow, Color::Green, Color::Magenta, Color::Cyan, Color::Red];
const CELEBRATION_DENSITY: f64 = 0.15;

pub struct BuildScene {
    art: ArtGrid,
    width: usize,
    height: usize,
    progress: f64,
    /// Bumped by every `set_progress`; seeds the sparks.
    tick: u64,
    frame: Grid,
}

impl BuildScene {
    /// Scene sized for the largest of `products`, showing the first one.
    pub fn new(products: &[Product]) -> ForgeResult<Self> {
        let first = products
            .first()
            .ok_or_else(|| ForgeError::art("<none>", "product list is empty"))?;
        let max_w = products.iter().map(|p| p.art.width()).max().unwrap_or(0);
        let max_h = products.iter().map(|p| p.art.height()).max().unwrap_or(0);

        let mut scene = BuildScene {
            art: first.art.clone(),
            width: CONTENT_OFFSET + max_w,
            height: max_h,
            progress: 0.0,
            tick: 0,
            frame: Vec::new(),
        };
        scene.rebuild_frame();
        Ok(scene)
    }

    /// Switch to a new art piece and restart the build.
    pub fn load_art(&mut self, art: &ArtGrid) -> ForgeResult<()> {
        if art.width() + CONTENT_OFFSET > self.width || art.height() > self.height {
            return Err(ForgeError::art(
                "scene",
                format!(
                    "art {}x{} does not fit scene {}x{}",
                    art.width(),
                    art.height(),
                    self.width - CONTENT_OFFSET,
                    self.height
                ),
            ));
        }
        self.art = art.clone();
        self.reset();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.tick = 0;
        self.rebuild_frame();
    }

    pub fn set_progress(&mut self, p: f64) {
        self.progress = p.clamp(0.0, 1.0);
        self.tick = self.tick.wrapping_add(1);
        self.rebuild_frame();
    }

    /// Fully built art with a sparse, tick-seeded confetti recolor.
    pub fn set_celebrating(&mut self, tick: u64) {
        self.progress = 1.0;
        self.rebuild_frame();

        let mut rng = StdRng::seed_from_u64(tick);
        for (body_idx, &row) in self.art.body_rows().iter().enumerate() {
            for &art_col in self.art.row_cells(body_idx) {
                if rng.gen::<f64>() < CELEBRATION_DENSITY {
                    let ch = SPARK_CHARS[rng.gen_range(0..SPARK_CHARS.len())];
                    let color = CELEBRATION_COLORS[rng.gen_range(0..CELEBRATION_COLORS.len())];
                    let col = CONTENT_OFFSET + art_col;
                    if col < self.width {
                        self.frame[row][col] = Cell::fg(ch, color);
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    #[cfg(test)]
    pub fn frame(&self) -> &Grid {
        &self.frame
    }

    #[cfg(test)]
    pub fn art(&self) -> &ArtGrid {
        &self.art
    }

    // ── Frame construction ──

    fn rebuild_frame(&mut self) {
        self.frame = vec![vec![Cell::BLANK; self.width]; self.height];
        for row in self.frame.iter_mut() {
            if let Some(first) = row.first_mut() {
                *first = Cell::fg(PILLAR, CRANE_COLOR);
            }
        }

        let n = self.art.body_row_count();
        if self.progress <= 0.0 {
            return;
        }
        if self.progress >= 1.0 {
            for body_idx in 0..n {
                self.copy_art_row(body_idx, usize::MAX);
            }
            return;
        }

        let scaled = self.progress * n as f64;
        let active = (scaled.floor() as usize).min(n - 1);
        let partial = scaled - active as f64;

        for body_idx in 0..n {
            let build_idx = n - 1 - body_idx;
            if build_idx < active {
                self.copy_art_row(body_idx, usize::MAX);
            } else if build_idx == active {
                let cells = self.art.row_cells(body_idx).len();
                let revealed = ((partial * cells as f64).floor() as usize).min(cells);
                self.draw_active_row(body_idx, revealed);
            }
        }
    }

    /// Copy the first `limit` non-blank cells of a body row at their natural
    /// columns.
    fn copy_art_row(&mut self, body_idx: usize, limit: usize) {
        let row = self.art.body_rows()[body_idx];
        for &art_col in self.art.row_cells(body_idx).iter().take(limit) {
            let col = CONTENT_OFFSET + art_col;
            if col < self.width {
                self.frame[row][col] = self.art.cell(row, art_col);
            }
        }
    }

    fn draw_active_row(&mut self, body_idx: usize, revealed: usize) {
        let row = self.art.body_rows()[body_idx];
        let cells = self.art.row_cells(body_idx).len();
        let content_start = CONTENT_OFFSET + self.art.first_col(body_idx);
        // 2 sparks + 1 gap before the content
        let spark_start = content_start.saturating_sub(3).max(1);
        let width = self.width;
        let line = &mut self.frame[row];

        line[0] = Cell::fg(PILLAR_JUNCTION, CRANE_COLOR);
        for slot in line.iter_mut().take(spark_start.min(width)).skip(1) {
            *slot = Cell::fg(ARM, CRANE_COLOR);
        }
        if spark_start - 1 >= 1 && spark_start - 1 < width {
            line[spark_start - 1] = Cell::fg(ARM_TIP, CRANE_COLOR);
        }

        if revealed < cells {
            let mut rng = StdRng::seed_from_u64(self.tick);
            for pos in spark_start..(spark_start + 2).min(width) {
                let ch = SPARK_CHARS[rng.gen_range(0..SPARK_CHARS.len())];
                line[pos] = Cell::fg(ch, SPARK_COLOR);
            }
        }

        self.copy_art_row(body_idx, revealed);
    }
}

impl Panel for BuildScene {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn render(&self, region: &mut Region<'_>) -> ForgeResult<()> {
        copy_into(&self.frame, region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::fg;

    /// 4 body rows (one blank spacer), 3-5 cells each.
    fn art() -> ArtGrid {
        ArtGrid::from_text("test", "  abc\n\n ddddd\n eee\n  ff f", &[], Color::Red).unwrap()
    }

    fn product(art: ArtGrid) -> Product {
        Product { name: "test".into(), art, badge: Cell::fg('x', Color::Red) }
    }

    fn scene() -> BuildScene {
        BuildScene::new(&[product(art())]).unwrap()
    }

    /// Body rows that are drawn complete (plain pillar + every art cell).
    fn complete_rows(s: &BuildScene) -> usize {
        let a = s.art();
        (0..a.body_row_count())
            .filter(|&b| {
                let row = a.body_rows()[b];
                s.frame()[row][0].symbol == PILLAR
                    && a.row_cells(b)
                        .iter()
                        .all(|&c| s.frame()[row][CONTENT_OFFSET + c] == a.cell(row, c))
            })
            .count()
    }

    fn spark_cols(s: &BuildScene, row: usize) -> Vec<usize> {
        (0..s.width)
            .filter(|&c| SPARK_CHARS.contains(&s.frame()[row][c].symbol) && c < CONTENT_OFFSET)
            .collect()
    }

    #[test]
    fn frame_size_is_fixed_by_largest_art() {
        let small = ArtGrid::from_text("s", "x", &[], Color::Red).unwrap();
        let s = BuildScene::new(&[product(small), product(art())]).unwrap();
        assert_eq!(s.width(), CONTENT_OFFSET + 6);
        assert_eq!(s.height(), 5);
        assert_eq!(s.frame().len(), 5);
        assert!(s.frame().iter().all(|r| r.len() == CONTENT_OFFSET + 6));
    }

    #[test]
    fn zero_progress_draws_only_pillar() {
        let mut s = scene();
        s.set_progress(0.0);
        for row in s.frame() {
            assert_eq!(row[0], Cell::fg(PILLAR, CRANE_COLOR));
            assert!(row[1..].iter().all(|c| *c == Cell::BLANK));
        }
    }

    #[test]
    fn full_progress_draws_every_row() {
        let mut s = scene();
        s.set_progress(1.0);
        assert_eq!(complete_rows(&s), 4);
        s.set_progress(7.5);
        assert_eq!(s.progress(), 1.0);
        assert_eq!(complete_rows(&s), 4);
    }

    #[test]
    fn complete_row_count_is_floor_of_scaled_progress() {
        let mut s = scene();
        let n = 4.0;
        for step in 0..=40 {
            let p = step as f64 / 40.0;
            s.set_progress(p);
            let expected = if p >= 1.0 { 4 } else { (p * n).floor() as usize };
            assert_eq!(complete_rows(&s), expected, "p = {p}");
        }
    }

    #[test]
    fn build_starts_from_bottom_row() {
        let mut s = scene();
        s.set_progress(0.3); // scaled 1.2 -> bottom row done, next row active
        let rows = s.art().body_rows().to_vec();
        // bottom body row (art row 4) complete
        assert_eq!(s.frame()[4][0].symbol, PILLAR);
        assert_eq!(s.frame()[4][CONTENT_OFFSET + 2], Cell::fg('f', Color::Red));
        // art row 3 is the active one
        assert_eq!(s.frame()[3][0].symbol, PILLAR_JUNCTION);
        // top rows are empty apart from the pillar
        for &r in &rows[..2] {
            assert_eq!(s.frame()[r][0].symbol, PILLAR);
            assert!(s.frame()[r][1..].iter().all(|c| c.is_blank()));
        }
    }

    #[test]
    fn active_row_layout() {
        let mut s = scene();
        // bottom row "  ff f": cells at 2,3,5; 0.125*4 = 0.5 -> floor(0.5*3) = 1 revealed
        s.set_progress(0.125);
        let row = &s.frame()[4];
        let content_start = CONTENT_OFFSET + 2;
        let spark_start = content_start - 3;
        assert_eq!(row[0].symbol, PILLAR_JUNCTION);
        for c in 1..spark_start - 1 {
            assert_eq!(row[c].symbol, ARM);
        }
        assert_eq!(row[spark_start - 1].symbol, ARM_TIP);
        assert!(SPARK_CHARS.contains(&row[spark_start].symbol));
        assert!(SPARK_CHARS.contains(&row[spark_start + 1].symbol));
        assert_eq!(row[spark_start].style, fg(SPARK_COLOR));
        assert!(row[content_start - 1].is_blank());
        assert_eq!(row[content_start].symbol, 'f');
        assert!(row[content_start + 1].is_blank());
        assert!(row[CONTENT_OFFSET + 5].is_blank());
    }

    #[test]
    fn same_progress_differs_only_in_sparks() {
        let mut s = scene();
        s.set_progress(0.4);
        let first = s.frame().clone();
        s.set_progress(0.4);
        let second = s.frame().clone();

        // active row: scaled 1.6 -> build index 1 -> art row 3
        let sparks = spark_cols(&s, 3);
        assert_eq!(sparks.len(), 2);
        for (y, (a, b)) in first.iter().zip(second.iter()).enumerate() {
            for (x, (ca, cb)) in a.iter().zip(b.iter()).enumerate() {
                if !(y == 3 && sparks.contains(&x)) {
                    assert_eq!(ca, cb, "cell ({y},{x}) changed");
                }
            }
        }
    }

    #[test]
    fn load_art_resets_and_rejects_oversized() {
        let mut s = scene();
        s.set_progress(0.9);
        let other = ArtGrid::from_text("o", "zz\nzz", &[], Color::Blue).unwrap();
        s.load_art(&other).unwrap();
        assert_eq!(s.progress(), 0.0);
        assert_eq!(s.art().body_row_count(), 2);

        let wide = ArtGrid::from_text("w", "wwwwwwwwwwww", &[], Color::Blue).unwrap();
        assert!(s.load_art(&wide).is_err());
        let tall = ArtGrid::from_text("t", "t\nt\nt\nt\nt\nt", &[], Color::Blue).unwrap();
        assert!(s.load_art(&tall).is_err());
    }

    #[test]
    fn celebration_is_reproducible_per_tick() {
        let mut s = scene();
        s.set_celebrating(7);
        let a = s.frame().clone();
        s.set_celebrating(7);
        assert_eq!(&a, s.frame());
        assert_eq!(s.progress(), 1.0);

        // blank cells are never touched by the confetti
        for (y, row) in a.iter().enumerate() {
            for (x, cell) in row.iter().enumerate().skip(CONTENT_OFFSET) {
                if s.art().cell(y, x - CONTENT_OFFSET).is_blank() {
                    assert!(cell.is_blank());
                }
            }
        }
    }

    #[test]
    fn celebration_changes_with_tick() {
        let mut s = scene();
        let frames: Vec<Grid> = (0..20)
            .map(|t| {
                s.set_celebrating(t);
                s.frame().clone()
            })
            .collect();
        assert!(frames.windows(2).any(|w| w[0] != w[1]));
    }
}
