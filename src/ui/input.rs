/// Keystroke reader.
///
/// A dedicated thread blocks on `crossterm::event::read`, decodes key
/// presses into `Key` and hands them to the main loop through a bounded
/// channel. It never touches session or compositor state. The thread ends
/// when the receiving side hangs up or the terminal stops producing events.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, warn};

/// Pending keys the reader may queue before it blocks.
const KEY_QUEUE: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Key {
    Char(char),
    Left,
    Right,
    /// q, Q, Esc or Ctrl-C.
    Quit,
}

/// Translate one terminal key event. Releases and unmapped keys yield `None`.
pub fn decode(ev: &KeyEvent) -> Option<Key> {
    if ev.kind == KeyEventKind::Release {
        return None;
    }
    match ev.code {
        KeyCode::Char('c' | 'C') if ev.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Quit),
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(Key::Quit),
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        _ => None,
    }
}

/// Start the reader thread and return the receiving end.
pub fn spawn_reader() -> Receiver<Key> {
    let (tx, rx) = mpsc::sync_channel(KEY_QUEUE);
    thread::Builder::new()
        .name("keys".into())
        .spawn(move || read_loop(tx))
        .map_err(|e| warn!(error = %e, "could not start key reader"))
        .ok();
    rx
}

fn read_loop(tx: SyncSender<Key>) {
    loop {
        let ev = match event::read() {
            Ok(ev) => ev,
            Err(e) => {
                warn!(error = %e, "key reader stopped");
                return;
            }
        };
        let Event::Key(key_event) = ev else { continue };
        let Some(key) = decode(&key_event) else { continue };
        if tx.send(key).is_err() {
            debug!("key receiver gone");
            return;
        }
    }
}
