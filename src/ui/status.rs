/// Status / announcer panel.
///
/// Four rows of word-wrapped text, a spacer, and an achievements line.
/// The text area is restyled wholesale by each setter: plain two-line
/// status, rainbow celebration text, or speech with a moving highlight.

use std::ops::Range;

use crossterm::style::{Attribute, Color};

use crate::domain::cell::{fg, with_attr, Cell};
use crate::domain::grid::Region;
use crate::error::ForgeResult;
use crate::ui::compositor::Panel;

pub const STATUS_WIDTH: usize = 40;
pub const STATUS_HEIGHT: usize = 6;
const TEXT_ROWS: usize = 4;
const ACHIEVEMENT_ROW: usize = STATUS_HEIGHT - 1;

const RAINBOW: [Color; 6] =
    [Color::Red, Color::DarkYellow, Color::Yellow, Color::Green, Color::Cyan, Color::Magenta];

pub struct StatusPanel {
    text: Vec<Vec<Cell>>,
    achievements: Vec<Cell>,
}

impl StatusPanel {
    pub fn new() -> Self {
        StatusPanel { text: Vec::new(), achievements: Vec::new() }
    }

    /// Headline in bold, detail below it.
    pub fn set_text(&mut self, line1: &str, line2: &str) {
        let bold = with_attr(fg(Color::White), Attribute::Bold);
        let plain = fg(Color::Grey);
        let mut rows = styled_lines(line1, |_| bold);
        rows.extend(styled_lines(line2, |_| plain));
        self.set_rows(rows);
    }

    pub fn set_achievements(&mut self, label: &str, badges: &[Cell]) {
        let mut row: Vec<Cell> =
            label.chars().map(|c| Cell::new(c, fg(Color::Grey))).collect();
        if !badges.is_empty() {
            row.push(Cell::BLANK);
        }
        row.extend_from_slice(badges);
        row.truncate(STATUS_WIDTH);
        self.achievements = row;
    }

    /// Each character cycles through the rainbow, shifted by `tick`.
    pub fn set_celebration_text(&mut self, text: &str, tick: u64) {
        let shift = (tick % RAINBOW.len() as u64) as usize;
        let rows = styled_lines(text, |i| {
            with_attr(fg(RAINBOW[(i + shift) % RAINBOW.len()]), Attribute::Bold)
        });
        self.set_rows(rows);
    }

    /// Spoken characters normal, the current one highlighted, the rest dim.
    pub fn set_speech_text(&mut self, text: &str, highlight: usize) {
        let rows = styled_lines(text, |i| match i.cmp(&highlight) {
            std::cmp::Ordering::Less => fg(Color::White),
            std::cmp::Ordering::Equal => {
                let mut s = with_attr(fg(Color::Black), Attribute::Bold);
                s.background_color = Some(Color::Yellow);
                s
            }
            std::cmp::Ordering::Greater => fg(Color::DarkGrey),
        });
        self.set_rows(rows);
    }

    fn set_rows(&mut self, mut rows: Vec<Vec<Cell>>) {
        rows.truncate(TEXT_ROWS);
        self.text = rows;
    }

    #[cfg(test)]
    fn row_text(&self, row: usize) -> String {
        self.text.get(row).map(|r| r.iter().map(|c| c.symbol).collect()).unwrap_or_default()
    }
}

impl Default for StatusPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel for StatusPanel {
    fn width(&self) -> usize {
        STATUS_WIDTH
    }

    fn height(&self) -> usize {
        STATUS_HEIGHT
    }

    fn render(&self, region: &mut Region<'_>) -> ForgeResult<()> {
        region.fill(Cell::BLANK);
        for (y, row) in self.text.iter().enumerate() {
            region.put_cells(y, 0, row);
        }
        region.put_cells(ACHIEVEMENT_ROW, 0, &self.achievements);
        Ok(())
    }
}

/// Wrap `text` and style every character by its index in `text`.
fn styled_lines(
    text: &str,
    style: impl Fn(usize) -> crossterm::style::ContentStyle,
) -> Vec<Vec<Cell>> {
    let chars: Vec<char> = text.chars().collect();
    wrap(&chars, STATUS_WIDTH)
        .into_iter()
        .map(|range| range.map(|i| Cell::new(chars[i], style(i))).collect())
        .collect()
}

/// Break `chars` into lines of at most `width`, splitting at the last
/// whitespace at or before the limit (the whitespace is dropped), or
/// hard-splitting at `width` when a line has none. Lines never start or
/// end with whitespace.
pub fn wrap(chars: &[char], width: usize) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    if width == 0 {
        return lines;
    }
    let trimmed = |start: usize, mut end: usize| {
        while end > start && chars[end - 1].is_whitespace() {
            end -= 1;
        }
        start..end
    };
    let mut start = 0;
    loop {
        while start < chars.len() && chars[start].is_whitespace() {
            start += 1;
        }
        if start == chars.len() {
            break;
        }
        if chars.len() - start <= width {
            lines.push(trimmed(start, chars.len()));
            break;
        }
        let limit = start + width;
        match (start + 1..=limit).rev().find(|&k| chars[k].is_whitespace()) {
            Some(k) => {
                lines.push(trimmed(start, k));
                start = k + 1;
            }
            None => {
                lines.push(start..limit);
                start = limit;
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapped(s: &str, width: usize) -> Vec<String> {
        let chars: Vec<char> = s.chars().collect();
        wrap(&chars, width).into_iter().map(|r| chars[r].iter().collect()).collect()
    }

    #[test]
    fn wrap_splits_on_last_space() {
        assert_eq!(wrapped("hello world foo", 11), vec!["hello world", "foo"]);
        assert_eq!(wrapped("hello world foo", 10), vec!["hello", "world foo"]);
        assert_eq!(wrapped("short", 40), vec!["short"]);
    }

    #[test]
    fn wrapped_lines_never_start_with_space() {
        assert_eq!(wrapped(" abcdef", 3), vec!["abc", "def"]);
        assert_eq!(wrapped("ab  cd", 2), vec!["ab", "cd"]);
        assert_eq!(wrapped("go   ", 4), vec!["go"]);
    }

    #[test]
    fn wrap_hard_splits_long_words() {
        assert_eq!(wrapped("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert!(wrapped("", 4).is_empty());
        assert!(wrapped("abc", 0).is_empty());
    }

    #[test]
    fn set_text_stacks_both_lines() {
        let mut s = StatusPanel::new();
        s.set_text("Working on Tomato", "12:34 left");
        assert_eq!(s.row_text(0), "Working on Tomato");
        assert_eq!(s.row_text(1), "12:34 left");
        assert!(s.text[0][0].style.attributes.has(Attribute::Bold));
    }

    #[test]
    fn long_text_is_clipped_to_text_rows() {
        let mut s = StatusPanel::new();
        let long = "word ".repeat(60);
        s.set_text(&long, "second");
        assert_eq!(s.text.len(), TEXT_ROWS);
        assert!(s.text.iter().all(|r| r.len() <= STATUS_WIDTH));
    }

    #[test]
    fn speech_highlight_tracks_index_across_wrap() {
        let mut s = StatusPanel::new();
        let text = format!("{} second line", "x".repeat(39));
        s.set_speech_text(&text, 41);
        // Index 39 is the dropped space; row 1 starts at index 40.
        assert_eq!(s.row_text(1), "second line");
        assert_eq!(s.text[1][0].style, fg(Color::White));
        assert_eq!(s.text[1][1].style.background_color, Some(Color::Yellow));
        assert_eq!(s.text[1][2].style, fg(Color::DarkGrey));
    }

    #[test]
    fn celebration_colors_shift_with_tick() {
        let mut s = StatusPanel::new();
        s.set_celebration_text("yay", 0);
        let first = s.text[0][0].style;
        s.set_celebration_text("yay", 1);
        assert_eq!(s.text[0][0].style.foreground_color, Some(RAINBOW[1]));
        assert_eq!(s.text[0][2].style.foreground_color, Some(RAINBOW[3]));
        assert_ne!(s.text[0][0].style, first);
    }

    #[test]
    fn achievements_render_on_last_row() {
        use crate::domain::grid::{Canvas, Rect};
        let mut s = StatusPanel::new();
        s.set_text("a", "b");
        s.set_achievements("Built:", &[Cell::fg('●', Color::Red), Cell::fg('■', Color::Yellow)]);
        let mut canvas = Canvas::with_border(STATUS_WIDTH, STATUS_HEIGHT, Cell::BLANK);
        {
            let mut r = canvas.regions_mut(&[Rect::new(0, 0, STATUS_HEIGHT, STATUS_WIDTH)]).unwrap();
            s.render(&mut r[0]).unwrap();
        }
        let rows = canvas.text_rows();
        assert!(rows[ACHIEVEMENT_ROW].starts_with("Built: ●■"));
        assert_eq!(canvas.get(ACHIEVEMENT_ROW, 7), Some(Cell::fg('●', Color::Red)));
    }
}
