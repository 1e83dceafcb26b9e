/// Phrase cloud: a few motivational lines that type themselves in and,
/// one at a time, erase themselves to make room for a new line.

use crossterm::style::Color;
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};

use crate::domain::cell::{fg, Cell};
use crate::domain::grid::Region;
use crate::error::ForgeResult;
use crate::ui::compositor::Panel;

pub const PHRASES: &[&str] = &[
    "let's do it",
    "this will be awesome",
    "one thing at a time",
    "deep work mode",
    "small steps, big results",
    "you've got this",
    "stay with it",
    "progress over perfection",
    "focus is a superpower",
    "keep the line moving",
    "brick by brick",
    "almost there",
    "future you says thanks",
    "make it count",
    "just this one task",
    "breathe, then build",
];

pub const PHRASE_COLORS: &[Color] = &[
    Color::Cyan,
    Color::Green,
    Color::Magenta,
    Color::Yellow,
    Color::Blue,
    Color::White,
];

/// Style of the character currently being typed.
const CURSOR_COLOR: Color = Color::DarkGrey;

#[derive(Clone, Debug, PartialEq)]
pub struct PhraseSlot {
    pub row: usize,
    pub indent: usize,
    pub text: &'static str,
    pub color: Color,
    pub reveal: usize,
    pub fading: bool,
}

impl PhraseSlot {
    fn len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Replacement waiting for its slot to finish fading.
#[derive(Clone, Copy, Debug)]
struct Staged {
    slot: usize,
    text: &'static str,
}

pub struct PhraseCloud {
    width: usize,
    height: usize,
    pool: Vec<&'static str>,
    palette: &'static [Color],
    slots: Vec<PhraseSlot>,
    staged: Option<Staged>,
    rng: StdRng,
}

impl PhraseCloud {
    /// Place up to `slot_count` phrases from `pool` on distinct rows.
    /// Phrases wider than `width` are dropped from the pool.
    pub fn new(
        width: usize,
        height: usize,
        slot_count: usize,
        pool: &[&'static str],
        palette: &'static [Color],
        seed: u64,
    ) -> Self {
        let pool: Vec<&'static str> =
            pool.iter().copied().filter(|p| p.chars().count() <= width).collect();
        let mut rng = StdRng::seed_from_u64(seed);

        let n = slot_count.min(height).min(pool.len());
        let mut rows = index::sample(&mut rng, height, n).into_vec();
        rows.sort_unstable();
        let texts: Vec<&'static str> = pool.choose_multiple(&mut rng, n).copied().collect();

        let mut cloud = PhraseCloud {
            width,
            height,
            pool,
            palette,
            slots: Vec::with_capacity(n),
            staged: None,
            rng,
        };
        for (row, text) in rows.into_iter().zip(texts) {
            let slot = cloud.fresh_slot(row, text);
            cloud.slots.push(slot);
        }
        cloud
    }

    fn fresh_slot(&mut self, row: usize, text: &'static str) -> PhraseSlot {
        let len = text.chars().count();
        let indent = self.rng.gen_range(0..=self.width.saturating_sub(len));
        let color = self.palette.choose(&mut self.rng).copied().unwrap_or(Color::White);
        PhraseSlot { row, indent, text, color, reveal: 0, fading: false }
    }

    /// Start replacing one random slot. Returns false if a replacement is
    /// already running or no unused phrase is left.
    pub fn replace_one(&mut self) -> bool {
        if self.staged.is_some() || self.slots.is_empty() {
            return false;
        }
        let candidates: Vec<&'static str> = self
            .pool
            .iter()
            .copied()
            .filter(|p| self.slots.iter().all(|s| s.text != *p))
            .collect();
        let Some(&text) = candidates.choose(&mut self.rng) else {
            return false;
        };
        let slot = self.rng.gen_range(0..self.slots.len());
        self.slots[slot].fading = true;
        self.staged = Some(Staged { slot, text });
        true
    }

    /// Advance every slot's typing by one character. Returns whether
    /// anything visible changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        let mut swapped = None;

        if let Some(staged) = self.staged {
            let slot = &mut self.slots[staged.slot];
            if slot.reveal > 0 {
                slot.reveal -= 1;
                changed = true;
            }
            if slot.reveal == 0 {
                let row = slot.row;
                let fresh = self.fresh_slot(row, staged.text);
                self.slots[staged.slot] = fresh;
                self.staged = None;
                swapped = Some(staged.slot);
                changed = true;
            }
        }

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.fading || swapped == Some(i) {
                continue;
            }
            if slot.reveal < slot.len() {
                slot.reveal += 1;
                changed = true;
            }
        }
        changed
    }

    #[cfg(test)]
    pub fn slots(&self) -> &[PhraseSlot] {
        &self.slots
    }

    #[cfg(test)]
    pub fn is_replacing(&self) -> bool {
        self.staged.is_some()
    }
}

impl Panel for PhraseCloud {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn render(&self, region: &mut Region<'_>) -> ForgeResult<()> {
        region.fill(Cell::BLANK);
        for slot in &self.slots {
            let typing = !slot.fading && slot.reveal < slot.len();
            for (i, ch) in slot.text.chars().take(slot.reveal).enumerate() {
                let color = if typing && i + 1 == slot.reveal { CURSOR_COLOR } else { slot.color };
                region.set(slot.row, slot.indent + i, Cell::new(ch, fg(color)));
            }
        }
        Ok(())
    }
}
