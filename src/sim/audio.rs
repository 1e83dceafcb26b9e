/// Audio contract consumed by the celebration and the session.
///
/// Playback is fire-and-forget: a backend starts playing and immediately
/// hands back a `Completion` that the caller polls once per tick. The
/// core never blocks on audio. With no backend at all, the celebration
/// falls back to `synthetic_timings` and a deadline-based completion.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

/// Per-character cadence used when no backend provides real timing.
pub const FALLBACK_CHAR_DURATION: Duration = Duration::from_millis(80);
/// Length of the silent party phase.
pub const FALLBACK_PARTY_DURATION: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    Party,
    Notification,
}

/// When the `char_index`-th character of a spoken message starts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CharTiming {
    pub char_index: usize,
    pub start_offset: Duration,
}

/// Pollable "playback finished" signal. Once complete, stays complete.
#[derive(Debug)]
pub struct Completion {
    state: CompletionState,
}

#[derive(Debug)]
enum CompletionState {
    Deadline(Instant),
    /// Completes when the playing thread sends or hangs up.
    Channel(Receiver<()>),
    Done,
}

impl Completion {
    pub fn at(deadline: Instant) -> Self {
        Completion { state: CompletionState::Deadline(deadline) }
    }

    pub fn from_channel(rx: Receiver<()>) -> Self {
        Completion { state: CompletionState::Channel(rx) }
    }

    pub fn done() -> Self {
        Completion { state: CompletionState::Done }
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        let finished = match &self.state {
            CompletionState::Done => true,
            CompletionState::Deadline(at) => now >= *at,
            CompletionState::Channel(rx) => match rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => true,
                Err(TryRecvError::Empty) => false,
            },
        };
        if finished {
            self.state = CompletionState::Done;
        }
        finished
    }
}

pub struct Playback {
    pub completion: Completion,
    /// Expected play time.
    pub duration: Duration,
}

pub trait AudioBackend {
    fn play_effect(&self, effect: Effect) -> Playback;
    /// Speak `text`, returning one timing record per character.
    fn speak(&self, text: &str) -> (Playback, Vec<CharTiming>);
}

/// Fixed-cadence timing for `text` and its total length.
pub fn synthetic_timings(text: &str) -> (Vec<CharTiming>, Duration) {
    let timings: Vec<CharTiming> = text
        .chars()
        .enumerate()
        .map(|(i, _)| CharTiming { char_index: i, start_offset: FALLBACK_CHAR_DURATION * i as u32 })
        .collect();
    let total = FALLBACK_CHAR_DURATION * timings.len() as u32;
    (timings, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn deadline_completion_latches() {
        let t0 = Instant::now();
        let mut c = Completion::at(t0 + Duration::from_secs(1));
        assert!(!c.poll(t0));
        assert!(c.poll(t0 + Duration::from_secs(1)));
        assert!(c.poll(t0));
    }

    #[test]
    fn channel_completion_on_hangup() {
        let (tx, rx) = mpsc::channel();
        let mut c = Completion::from_channel(rx);
        let now = Instant::now();
        assert!(!c.poll(now));
        drop(tx);
        assert!(c.poll(now));
        assert!(c.poll(now));
    }

    #[test]
    fn channel_completion_on_message() {
        let (tx, rx) = mpsc::channel();
        let mut c = Completion::from_channel(rx);
        tx.send(()).unwrap();
        assert!(c.poll(Instant::now()));
    }

    #[test]
    fn synthetic_timing_is_per_char() {
        let (t, total) = synthetic_timings("héllo");
        assert_eq!(t.len(), 5);
        assert_eq!(t[2], CharTiming { char_index: 2, start_offset: Duration::from_millis(160) });
        assert_eq!(total, Duration::from_millis(400));
        assert_eq!(synthetic_timings("").1, Duration::ZERO);
    }
}
