/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD or
/// `~/.local/share/pomoforge`. Falls back to defaults if the file is
/// missing or broken; missing keys take their per-key defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sim::session::SessionSettings;

// ── Config sections ──

#[derive(Deserialize, Clone, Debug, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub gamepad: GamepadConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TimerConfig {
    #[serde(default = "default_work")]
    pub work_minutes: u64,
    #[serde(default = "default_short_break")]
    pub short_break_minutes: u64,
    #[serde(default = "default_long_break")]
    pub long_break_minutes: u64,
    #[serde(default = "default_long_break_every")]
    pub long_break_every: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DisplayConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_phrase_slots")]
    pub phrase_slots: usize,
    #[serde(default = "default_phrase_rotation")]
    pub phrase_rotation_secs: u64,
    #[serde(default = "default_margin")]
    pub margin: usize,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Gamepad button names per action (see `ui::gamepad` for accepted names).
#[derive(Deserialize, Clone, Debug)]
pub struct GamepadConfig {
    #[serde(default = "default_start")]
    pub start: Vec<String>,
    #[serde(default = "default_celebrate")]
    pub celebrate: Vec<String>,
    #[serde(default = "default_prev")]
    pub prev: Vec<String>,
    #[serde(default = "default_next")]
    pub next: Vec<String>,
    #[serde(default = "default_quit")]
    pub quit: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct GeneralConfig {
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

// ── Defaults ──

fn default_work() -> u64 { 25 }
fn default_short_break() -> u64 { 5 }
fn default_long_break() -> u64 { 15 }
fn default_long_break_every() -> u32 { 4 }

fn default_tick_rate() -> u64 { 50 }
fn default_phrase_slots() -> usize { 4 }
fn default_phrase_rotation() -> u64 { 15 }
fn default_margin() -> usize { 2 }

fn default_true() -> bool { true }

fn default_start() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_celebrate() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_prev() -> Vec<String> { vec!["L1".into()] }
fn default_next() -> Vec<String> { vec!["R1".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }

fn default_log_file() -> PathBuf { std::env::temp_dir().join("pomoforge.log") }

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            work_minutes: default_work(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
            long_break_every: default_long_break_every(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            tick_rate_ms: default_tick_rate(),
            phrase_slots: default_phrase_slots(),
            phrase_rotation_secs: default_phrase_rotation(),
            margin: default_margin(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig { enabled: default_true() }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            start: default_start(),
            celebrate: default_celebrate(),
            prev: default_prev(),
            next: default_next(),
            quit: default_quit(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig { log_file: default_log_file() }
    }
}

// ── Loading ──

impl AppConfig {
    /// Load `config.toml` from the first candidate directory that has one.
    ///
    /// Logging is not up yet when this runs, so problems are returned as
    /// messages for the caller to log once it is.
    pub fn load() -> (Self, Vec<String>) {
        load_from(&candidate_dirs())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Repair values the layout cannot use.
    fn check(&mut self, warnings: &mut Vec<String>) {
        if self.display.margin == 0 {
            warnings.push("display.margin must be at least 1 (the border needs it); using 1".into());
            self.display.margin = 1;
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.display.tick_rate_ms.max(1))
    }

    pub fn session_settings(&self, seed: u64) -> SessionSettings {
        let minutes = |m: u64| Duration::from_secs(m * 60);
        SessionSettings {
            work: minutes(self.timer.work_minutes),
            short_break: minutes(self.timer.short_break_minutes),
            long_break: minutes(self.timer.long_break_minutes),
            long_break_every: self.timer.long_break_every,
            phrase_slots: self.display.phrase_slots,
            phrase_rotation: Duration::from_secs(self.display.phrase_rotation_secs),
            seed,
        }
    }
}

/// Candidate directories: exe dir, CWD, XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pomoforge");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    dirs
}

fn load_from(search_dirs: &[PathBuf]) -> (AppConfig, Vec<String>) {
    let mut warnings = Vec::new();
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match read_file(&path) {
            Ok(mut cfg) => {
                cfg.check(&mut warnings);
                return (cfg, warnings);
            }
            Err(msg) => {
                warnings.push(msg);
                return (AppConfig::default(), warnings);
            }
        }
    }
    (AppConfig::default(), warnings)
}

fn read_file(path: &Path) -> Result<AppConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read {}: {e}; using defaults", path.display()))?;
    AppConfig::from_toml_str(&text)
        .map_err(|e| format!("{} parse error: {e}; using defaults", path.display()))
}
