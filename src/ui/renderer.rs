/// Presentation layer: row-diffing terminal renderer.
///
/// How it works:
///   1. The compositor hands over the finished canvas
///   2. Each row is compared with the same row of the previous frame
///   3. Changed rows are rewritten whole: cursor to column 0, then every
///      cell, styled cells as `style, symbol, reset`
///   4. All commands are batched with `queue!`, flushed once at the end
///
/// A change in terminal size clears the screen and forces a full repaint.
///
/// Styles are applied per cell, never per run, so neighbouring cells with
/// unrelated styling cannot bleed into each other.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetStyle},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::Cell;
use crate::domain::grid::{Canvas, Grid};

pub struct Renderer<W: Write> {
    writer: W,
    /// Last frame emitted; `None` forces a full repaint.
    last: Option<Grid>,
    /// Terminal size seen by the last frame.
    size: Option<(u16, u16)>,
}

impl Renderer<BufWriter<Stdout>> {
    pub fn stdout() -> Self {
        Renderer::new(BufWriter::with_capacity(16384, io::stdout()))
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(writer: W) -> Self {
        Renderer { writer, last: None, size: None }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            Clear(ClearType::All)
        )?;
        self.last = None;
        self.size = terminal::size().ok();
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Draw `canvas`, skipping rows identical to the previous frame.
    /// Returns the number of rows written.
    pub fn render(&mut self, canvas: &Canvas) -> io::Result<usize> {
        self.track_size(terminal::size().ok())?;
        self.draw(canvas)
    }

    fn draw(&mut self, canvas: &Canvas) -> io::Result<usize> {
        let rows = canvas.rows();
        let mut written = 0;
        for (y, row) in rows.iter().enumerate() {
            let unchanged = self
                .last
                .as_ref()
                .and_then(|prev| prev.get(y))
                .is_some_and(|prev| prev == row);
            if unchanged {
                continue;
            }
            queue!(self.writer, MoveTo(0, y as u16))?;
            write_row(&mut self.writer, row)?;
            written += 1;
        }
        self.writer.flush()?;

        match &mut self.last {
            Some(last) if last.len() == rows.len() => {
                for (dst, src) in last.iter_mut().zip(rows) {
                    dst.clone_from(src);
                }
            }
            _ => self.last = Some(rows.to_vec()),
        }
        Ok(written)
    }

    /// Forget the previous frame so the next `render` repaints everything.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Clear and invalidate when the terminal size differs from the last
    /// frame's. An unknown size (no TTY) never counts as a change.
    fn track_size(&mut self, size: Option<(u16, u16)>) -> io::Result<()> {
        let Some(size) = size else { return Ok(()) };
        if self.size != Some(size) {
            if self.size.is_some() {
                queue!(self.writer, ResetColor, Clear(ClearType::All))?;
                self.invalidate();
            }
            self.size = Some(size);
        }
        Ok(())
    }

    #[cfg(test)]
    fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }
}

/// One canvas row: unstyled cells as bare symbols, styled cells wrapped in
/// their style and a reset.
pub fn write_row<W: Write>(w: &mut W, row: &[Cell]) -> io::Result<()> {
    for cell in row {
        if cell.is_styled() {
            queue!(w, SetStyle(cell.style), Print(cell.symbol), SetAttribute(Attribute::Reset))?;
        } else {
            queue!(w, Print(cell.symbol))?;
        }
    }
    Ok(())
}
