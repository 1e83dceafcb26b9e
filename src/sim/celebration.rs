/// Celebration sequencer: party, then speech, then done.
///
/// Phases only move forward (`None -> Party -> Speech -> Done`). The party
/// phase lasts as long as the party effect; the speech phase ends when the
/// speech completion fires. The spoken-character cursor follows the timing
/// records on a best-effort basis and is never what ends the phase.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::sim::audio::{
    synthetic_timings, AudioBackend, CharTiming, Completion, Effect, FALLBACK_PARTY_DURATION,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    None,
    Party,
    Speech,
    Done,
}

pub struct Celebration {
    phase: Phase,
    message: String,
    phase_start: Instant,
    party_duration: Duration,
    party_tick: u64,
    timings: Vec<CharTiming>,
    current_char: usize,
    speech_done: Option<Completion>,
}

impl Celebration {
    pub fn new() -> Self {
        Celebration {
            phase: Phase::None,
            message: String::new(),
            phase_start: Instant::now(),
            party_duration: FALLBACK_PARTY_DURATION,
            party_tick: 0,
            timings: Vec::new(),
            current_char: 0,
            speech_done: None,
        }
    }

    /// Begin the party phase. `message` is spoken afterwards.
    /// Must not be called while `is_active()`.
    pub fn start(&mut self, message: &str, now: Instant, audio: Option<&dyn AudioBackend>) {
        self.message = message.to_string();
        self.phase = Phase::Party;
        self.phase_start = now;
        self.party_tick = 0;
        self.timings.clear();
        self.current_char = 0;
        self.speech_done = None;

        self.party_duration = match audio {
            Some(backend) => backend.play_effect(Effect::Party).duration,
            None => FALLBACK_PARTY_DURATION,
        };
        debug!(duration_ms = self.party_duration.as_millis() as u64, "celebration: party");
    }

    /// Advance one host tick.
    pub fn tick(&mut self, now: Instant, audio: Option<&dyn AudioBackend>) -> Phase {
        match self.phase {
            Phase::Party => {
                self.party_tick += 1;
                if now.saturating_duration_since(self.phase_start) >= self.party_duration {
                    self.start_speech(now, audio);
                }
            }
            Phase::Speech => {
                let elapsed = now.saturating_duration_since(self.phase_start);
                while self.current_char + 1 < self.timings.len()
                    && elapsed >= self.timings[self.current_char + 1].start_offset
                {
                    self.current_char += 1;
                }
                let finished = self.speech_done.as_mut().map_or(true, |c| c.poll(now));
                if finished {
                    self.phase = Phase::Done;
                    debug!("celebration: done");
                }
            }
            Phase::None | Phase::Done => {}
        }
        self.phase
    }

    fn start_speech(&mut self, now: Instant, audio: Option<&dyn AudioBackend>) {
        self.phase = Phase::Speech;
        self.phase_start = now;
        self.current_char = 0;

        match audio {
            Some(backend) => {
                let (playback, timings) = backend.speak(&self.message);
                self.timings = timings;
                self.speech_done = Some(playback.completion);
            }
            None => {
                let (timings, total) = synthetic_timings(&self.message);
                self.timings = timings;
                self.speech_done = Some(Completion::at(now + total));
            }
        }
        debug!(chars = self.timings.len(), "celebration: speech");
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Party | Phase::Speech)
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn party_tick(&self) -> u64 {
        self.party_tick
    }

    /// Character index of the message currently being spoken.
    pub fn current_char_index(&self) -> usize {
        self.timings.get(self.current_char).map_or(0, |t| t.char_index)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::audio::Playback;
    use std::cell::RefCell;
    use std::sync::mpsc::{self, Sender};

    const TICK: Duration = Duration::from_millis(50);

    /// Backend whose speech completes only when the test says so.
    struct ScriptedAudio {
        party: Duration,
        per_char: Duration,
        senders: RefCell<Vec<Sender<()>>>,
    }

    impl ScriptedAudio {
        fn new(party_ms: u64, per_char_ms: u64) -> Self {
            ScriptedAudio {
                party: Duration::from_millis(party_ms),
                per_char: Duration::from_millis(per_char_ms),
                senders: RefCell::new(Vec::new()),
            }
        }

        fn finish_speech(&self) {
            self.senders.borrow_mut().clear();
        }
    }

    impl AudioBackend for ScriptedAudio {
        fn play_effect(&self, _effect: Effect) -> Playback {
            Playback { completion: Completion::done(), duration: self.party }
        }

        fn speak(&self, text: &str) -> (Playback, Vec<CharTiming>) {
            let (tx, rx) = mpsc::channel();
            self.senders.borrow_mut().push(tx);
            let timings = (0..text.chars().count())
                .map(|i| CharTiming { char_index: i, start_offset: self.per_char * i as u32 })
                .collect();
            let duration = self.per_char * text.chars().count() as u32;
            (Playback { completion: Completion::from_channel(rx), duration }, timings)
        }
    }

    fn rank(p: Phase) -> u8 {
        match p {
            Phase::None => 0,
            Phase::Party => 1,
            Phase::Speech => 2,
            Phase::Done => 3,
        }
    }

    #[test]
    fn fresh_celebration_is_inactive() {
        let c = Celebration::new();
        assert_eq!(c.phase(), Phase::None);
        assert!(!c.is_active());
    }

    #[test]
    fn phases_run_forward_without_backend() {
        let t0 = Instant::now();
        let mut c = Celebration::new();
        c.start("Nice work!", t0, None);
        assert!(c.is_active());

        let mut seen = vec![c.phase()];
        let mut now = t0;
        for _ in 0..400 {
            now += TICK;
            let p = c.tick(now, None);
            if *seen.last().unwrap() != p {
                seen.push(p);
            }
        }
        assert_eq!(seen, vec![Phase::Party, Phase::Speech, Phase::Done]);
        assert!(!c.is_active());
    }

    #[test]
    fn party_lasts_fallback_duration() {
        let t0 = Instant::now();
        let mut c = Celebration::new();
        c.start("hi", t0, None);
        assert_eq!(c.tick(t0 + Duration::from_millis(2950), None), Phase::Party);
        assert_eq!(c.tick(t0 + FALLBACK_PARTY_DURATION, None), Phase::Speech);
        assert_eq!(c.party_tick(), 2);
    }

    #[test]
    fn synthetic_speech_ends_after_message_length() {
        let t0 = Instant::now();
        let mut c = Celebration::new();
        c.start("abcd", t0, None);
        let speech_start = t0 + FALLBACK_PARTY_DURATION;
        c.tick(speech_start, None);
        assert_eq!(c.tick(speech_start + Duration::from_millis(100), None), Phase::Speech);
        assert_eq!(c.current_char_index(), 1);
        assert_eq!(c.tick(speech_start + Duration::from_millis(319), None), Phase::Speech);
        assert_eq!(c.current_char_index(), 3);
        assert_eq!(c.tick(speech_start + Duration::from_millis(320), None), Phase::Done);
    }

    #[test]
    fn backend_durations_drive_phases() {
        let audio = ScriptedAudio::new(500, 100);
        let t0 = Instant::now();
        let mut c = Celebration::new();
        c.start("hello", t0, Some(&audio));

        assert_eq!(c.tick(t0 + Duration::from_millis(450), Some(&audio)), Phase::Party);
        let s = t0 + Duration::from_millis(500);
        assert_eq!(c.tick(s, Some(&audio)), Phase::Speech);

        // Cursor reaches the last character and stays there while audio plays on.
        assert_eq!(c.tick(s + Duration::from_secs(10), Some(&audio)), Phase::Speech);
        assert_eq!(c.current_char_index(), 4);
        assert_eq!(c.tick(s + Duration::from_secs(11), Some(&audio)), Phase::Speech);

        audio.finish_speech();
        assert_eq!(c.tick(s + Duration::from_secs(12), Some(&audio)), Phase::Done);
        assert_eq!(c.current_char_index(), 4);
    }

    #[test]
    fn audio_can_finish_before_cursor() {
        let audio = ScriptedAudio::new(0, 1000);
        let t0 = Instant::now();
        let mut c = Celebration::new();
        c.start("long message", t0, Some(&audio));
        c.tick(t0, Some(&audio));
        audio.finish_speech();
        assert_eq!(c.tick(t0 + TICK, Some(&audio)), Phase::Done);
        assert_eq!(c.current_char_index(), 0);
    }

    #[test]
    fn cursor_never_moves_backwards() {
        let t0 = Instant::now();
        let mut c = Celebration::new();
        c.start("the quick brown fox", t0, None);
        let mut now = t0;
        let mut last = 0;
        let mut max_rank = rank(c.phase());
        while c.phase() != Phase::Done {
            now += TICK;
            let p = c.tick(now, None);
            assert!(rank(p) >= max_rank, "phase went backwards");
            max_rank = rank(p);
            if p == Phase::Speech {
                assert!(c.current_char_index() >= last);
                last = c.current_char_index();
            }
        }
        // Ticking after done changes nothing.
        assert_eq!(c.tick(now + Duration::from_secs(60), None), Phase::Done);
    }

    #[test]
    fn empty_message_finishes_immediately() {
        let t0 = Instant::now();
        let mut c = Celebration::new();
        c.start("", t0, None);
        let s = t0 + FALLBACK_PARTY_DURATION;
        assert_eq!(c.tick(s, None), Phase::Speech);
        assert_eq!(c.tick(s, None), Phase::Done);
        assert_eq!(c.current_char_index(), 0);
    }
}
