/// Colored cell: the atomic unit of every canvas and art grid.
///
/// A cell is a symbol plus a crossterm `ContentStyle` (foreground,
/// background, emphasis attributes). The default style means "no styling".
/// Cells are `Copy` and compared by value.

use crossterm::style::{Attribute, Color, ContentStyle};

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Cell {
    pub symbol: char,
    pub style: ContentStyle,
}

impl Cell {
    pub const BLANK: Cell = Cell::plain(' ');

    pub const fn plain(symbol: char) -> Self {
        Cell {
            symbol,
            style: ContentStyle {
                foreground_color: None,
                background_color: None,
                underline_color: None,
                attributes: crossterm::style::Attributes::none(),
            },
        }
    }

    pub fn new(symbol: char, style: ContentStyle) -> Self {
        Cell { symbol, style }
    }

    pub fn fg(symbol: char, color: Color) -> Self {
        Cell { symbol, style: fg(color) }
    }

    /// Blank cells are transparent to the build scene (not part of a body row).
    pub fn is_blank(&self) -> bool {
        self.symbol == ' '
    }

    pub fn is_styled(&self) -> bool {
        self.style != ContentStyle::default()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::BLANK
    }
}

// ── Style shorthands ──

pub fn fg(color: Color) -> ContentStyle {
    ContentStyle { foreground_color: Some(color), ..ContentStyle::default() }
}

pub fn bg(color: Color) -> ContentStyle {
    ContentStyle { background_color: Some(color), ..ContentStyle::default() }
}

pub fn with_attr(mut style: ContentStyle, attr: Attribute) -> ContentStyle {
    style.attributes.set(attr);
    style
}
