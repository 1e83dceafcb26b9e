/// One-line key-hint bar: `[s] start  [←/→] product  [q] quit`.

use crossterm::style::{Attribute, Color};

use crate::domain::cell::{fg, with_attr, Cell};
use crate::domain::grid::Region;
use crate::error::ForgeResult;
use crate::ui::compositor::Panel;

pub const COMMAND_WIDTH: usize = 48;

/// `(key, label)` pair.
pub type Hint = (&'static str, &'static str);

pub struct CommandBar {
    cells: Vec<Cell>,
}

impl CommandBar {
    pub fn new() -> Self {
        CommandBar { cells: Vec::new() }
    }

    pub fn set_hints(&mut self, hints: &[Hint]) {
        let key_style = with_attr(fg(Color::Cyan), Attribute::Bold);
        let label_style = fg(Color::Grey);
        let mut cells = Vec::new();
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                cells.extend([Cell::BLANK, Cell::BLANK]);
            }
            cells.push(Cell::new('[', label_style));
            cells.extend(key.chars().map(|c| Cell::new(c, key_style)));
            cells.push(Cell::new(']', label_style));
            cells.push(Cell::BLANK);
            cells.extend(label.chars().map(|c| Cell::new(c, label_style)));
        }
        cells.truncate(COMMAND_WIDTH);
        self.cells = cells;
    }

    #[cfg(test)]
    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.symbol).collect()
    }
}

impl Default for CommandBar {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel for CommandBar {
    fn width(&self) -> usize {
        COMMAND_WIDTH
    }

    fn height(&self) -> usize {
        1
    }

    fn render(&self, region: &mut Region<'_>) -> ForgeResult<()> {
        region.fill(Cell::BLANK);
        region.put_cells(0, 0, &self.cells);
        Ok(())
    }
}
