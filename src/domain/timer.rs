/// Countdown timer driven by caller-supplied instants.
///
/// States: idle (fresh / reset), running, finished. The running → finished
/// transition happens exactly once, on the first query that observes
/// `elapsed >= duration`.

use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct Countdown {
    duration: Duration,
    started: Option<Instant>,
    running: bool,
    finished: bool,
}

impl Countdown {
    pub fn new(duration: Duration) -> Self {
        Countdown { duration, started: None, running: false, finished: false }
    }

    pub fn start(&mut self, now: Instant) {
        self.started = Some(now);
        self.running = true;
        self.finished = false;
    }

    /// Back to idle with a new duration.
    pub fn reset(&mut self, duration: Duration) {
        self.duration = duration;
        self.started = None;
        self.running = false;
        self.finished = false;
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        !self.running && !self.finished
    }

    /// Elapsed time clamped to the duration. Does not latch `finished`.
    pub fn elapsed(&self, now: Instant) -> Duration {
        if self.finished {
            return self.duration;
        }
        match (self.running, self.started) {
            (true, Some(start)) => now.saturating_duration_since(start).min(self.duration),
            _ => Duration::ZERO,
        }
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration - self.elapsed(now)
    }

    /// Completion fraction in [0, 1]. Latches `finished` when the duration
    /// has passed; afterwards always 1.0.
    pub fn progress(&mut self, now: Instant) -> f64 {
        if self.finished {
            return 1.0;
        }
        let start = match (self.running, self.started) {
            (true, Some(start)) => start,
            _ => return 0.0,
        };
        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.duration {
            self.running = false;
            self.finished = true;
            return 1.0;
        }
        elapsed.as_secs_f64() / self.duration.as_secs_f64()
    }
}

/// `mm:ss` for status lines.
pub fn format_mm_ss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
