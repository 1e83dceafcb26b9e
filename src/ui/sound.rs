/// Sound engine: procedural party, notification and "gibberish speech"
/// audio via rodio.
///
/// Sounds are synthesised as f32 samples, wrapped into in-memory WAV
/// buffers and played fire-and-forget. Each playback hands back a
/// `Completion` that hangs up when the sink drains, so callers poll and
/// never block.
///
/// Compile without the "sound" feature to drop rodio entirely; the stub
/// `SoundEngine::new()` then returns `None` and the celebration runs on
/// synthetic timing.

use std::time::Duration;

use crate::sim::audio::CharTiming;

// ════════════════════════════════════════════════════════════
//  Synthesis: pure sample generation, shared by engine and tests
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
mod synth {
    use std::f32::consts::PI;

    use rand::Rng;

    use super::{duration_of, CharTiming};

    pub const SAMPLE_RATE: u32 = 22050;

    const VOWELS: &str = "aeiouAEIOU";
    const GAP_MS: u64 = 20;

    pub fn samples_for_ms(ms: u64) -> usize {
        (SAMPLE_RATE as u64 * ms / 1000) as usize
    }

    /// Attack over the first 5%, release over the last 10%.
    fn envelope(t: f32) -> f32 {
        if t < 0.05 {
            t / 0.05
        } else if t > 0.9 {
            (1.0 - t) / 0.1
        } else {
            1.0
        }
    }

    fn silence(ms: u64) -> Vec<f32> {
        vec![0.0; samples_for_ms(ms)]
    }

    fn rising_tone(start_hz: f32, end_hz: f32, ms: u64) -> Vec<f32> {
        let n = samples_for_ms(ms);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = start_hz + (end_hz - start_hz) * t;
                phase += 2.0 * PI * freq / SAMPLE_RATE as f32;
                phase.sin() * envelope(t) * 0.3
            })
            .collect()
    }

    fn pop(ms: u64, rng: &mut impl Rng) -> Vec<f32> {
        let n = samples_for_ms(ms);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let noise: f32 = rng.gen_range(-1.0..1.0);
                noise * (-8.0 * t).exp() * 0.4
            })
            .collect()
    }

    /// C5-E5-G5-C6 square-wave run.
    fn fanfare() -> Vec<f32> {
        let notes = [523.25_f32, 659.25, 783.99, 1046.50];
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = samples_for_ms(150);
            for i in 0..n {
                let t = i as f32 / n as f32;
                let s = (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin();
                samples.push(0.25_f32.copysign(s) * envelope(t));
            }
            samples.extend(silence(30));
        }
        samples
    }

    /// Three rising sweeps, two noise pops, then the fanfare.
    pub fn party(rng: &mut impl Rng) -> Vec<f32> {
        let mut samples = Vec::new();
        for i in 0..3 {
            let start = 300.0 + i as f32 * 200.0;
            samples.extend(rising_tone(start, start + 400.0, 200));
            samples.extend(silence(50));
        }
        for _ in 0..2 {
            samples.extend(pop(100, rng));
            samples.extend(silence(50));
        }
        samples.extend(fanfare());
        samples
    }

    /// Desk-bell ring: 1.1 kHz bell struck by a 24 Hz clapper.
    pub fn notification() -> Vec<f32> {
        let dur = 1.2_f32;
        let n = samples_for_ms(1200);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = if t < 0.02 {
                    t / 0.02
                } else if t > dur - 0.2 {
                    (dur - t) / 0.2
                } else {
                    1.0
                };
                let clapper = (2.0 * PI * 24.0 * t).sin().max(0.0);
                let bell = (2.0 * PI * 1100.0 * t).sin() * 0.7
                    + (2.0 * PI * 1100.0 * 2.42 * t).sin() * 0.3;
                bell * clapper * env * 0.5
            })
            .collect()
    }

    /// Base pitch and length of one speech blip. Spaces are silent.
    pub fn blip_params(ch: char) -> (f32, u64) {
        if ch == ' ' {
            (0.0, 60)
        } else if VOWELS.contains(ch) {
            (200.0 + (ch as u32 % 10) as f32 * 20.0, 80)
        } else {
            (400.0 + (ch as u32 % 15) as f32 * 25.0, 60)
        }
    }

    /// One saw/sine blip per character, 20 ms apart, pitch jittered ±15%.
    pub fn speech(text: &str, rng: &mut impl Rng) -> (Vec<f32>, Vec<CharTiming>) {
        let mut samples = Vec::new();
        let mut timings = Vec::new();

        for (i, ch) in text.chars().enumerate() {
            timings.push(CharTiming { char_index: i, start_offset: duration_of(samples.len()) });

            let (base, ms) = blip_params(ch);
            let n = samples_for_ms(ms);
            if base > 0.0 {
                let freq = base * (1.0 + rng.gen_range(-0.15..0.15));
                for s in 0..n {
                    let t = s as f32 / n as f32;
                    let cycles = s as f32 * freq / SAMPLE_RATE as f32;
                    let saw = 2.0 * cycles.fract() - 1.0;
                    let sine = (2.0 * PI * cycles).sin();
                    samples.push((0.7 * saw + 0.3 * sine) * envelope(t) * 0.3);
                }
            } else {
                samples.extend(silence(ms));
            }
            samples.extend(silence(GAP_MS));
        }
        (samples, timings)
    }

    /// 16-bit mono PCM WAV.
    pub fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

/// Play time of `n` samples, exact to the nanosecond.
fn duration_of(n: usize) -> Duration {
    Duration::from_nanos(n as u64 * 1_000_000_000 / synth::SAMPLE_RATE as u64)
}

// ════════════════════════════════════════════════════════════
//  Engine
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::{info, warn};

    use super::{duration_of, synth};
    use crate::sim::audio::{AudioBackend, CharTiming, Completion, Effect, Playback};

    struct Clip {
        wav: Arc<Vec<u8>>,
        duration: Duration,
    }

    impl Clip {
        fn new(samples: &[f32]) -> Self {
            Clip { wav: Arc::new(synth::make_wav(samples)), duration: duration_of(samples.len()) }
        }
    }

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        party: Clip,
        notification: Clip,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "no audio output, running silent");
                    return None;
                }
            };
            let party = Clip::new(&synth::party(&mut rand::thread_rng()));
            let notification = Clip::new(&synth::notification());
            info!(party_ms = party.duration.as_millis() as u64, "sound engine ready");
            Some(SoundEngine { _stream: stream, handle, party, notification })
        }

        /// Start playing `wav`; the completion hangs up once the sink drains.
        /// If playback cannot start, completion falls back to a deadline.
        fn play(&self, wav: Vec<u8>, duration: Duration) -> Playback {
            let deadline = || Playback { completion: Completion::at(Instant::now() + duration), duration };

            let sink = match Sink::try_new(&self.handle) {
                Ok(sink) => sink,
                Err(e) => {
                    warn!(error = %e, "could not open sink");
                    return deadline();
                }
            };
            match rodio::Decoder::new(Cursor::new(wav)) {
                Ok(src) => sink.append(src),
                Err(e) => {
                    warn!(error = %e, "could not decode clip");
                    return deadline();
                }
            }

            let (tx, rx) = mpsc::channel::<()>();
            let spawned = thread::Builder::new().name("playback".into()).spawn(move || {
                sink.sleep_until_end();
                drop(tx);
            });
            match spawned {
                Ok(_) => Playback { completion: Completion::from_channel(rx), duration },
                Err(e) => {
                    warn!(error = %e, "could not start playback thread");
                    deadline()
                }
            }
        }
    }

    impl AudioBackend for SoundEngine {
        fn play_effect(&self, effect: Effect) -> Playback {
            let clip = match effect {
                Effect::Party => &self.party,
                Effect::Notification => &self.notification,
            };
            self.play(clip.wav.as_ref().clone(), clip.duration)
        }

        fn speak(&self, text: &str) -> (Playback, Vec<CharTiming>) {
            let (samples, timings) = synth::speech(text, &mut rand::thread_rng());
            let playback = self.play(synth::make_wav(&samples), duration_of(samples.len()));
            (playback, timings)
        }
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        None
    }
}

#[cfg(not(feature = "sound"))]
impl crate::sim::audio::AudioBackend for SoundEngine {
    fn play_effect(&self, _effect: crate::sim::audio::Effect) -> crate::sim::audio::Playback {
        use crate::sim::audio::{Completion, Playback};
        Playback { completion: Completion::done(), duration: Duration::ZERO }
    }

    fn speak(&self, text: &str) -> (crate::sim::audio::Playback, Vec<CharTiming>) {
        use crate::sim::audio::{synthetic_timings, Completion, Playback};
        let (timings, total) = synthetic_timings(text);
        let completion = Completion::at(std::time::Instant::now() + total);
        (Playback { completion, duration: total }, timings)
    }
}
