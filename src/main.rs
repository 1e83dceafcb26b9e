/// Entry point and main loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::AppConfig;
use domain::product;
use error::ForgeResult;
use sim::audio::AudioBackend;
use sim::session::{Control, Session};
use ui::compositor::{Compositor, Margin};
use ui::gamepad::GamepadState;
use ui::input::{self, Key};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    let (config, warnings) = AppConfig::load();

    if let Err(e) = init_logging(&config.general.log_file) {
        eprintln!("Warning: logging disabled: {e}");
    }
    for w in &warnings {
        warn!("config: {w}");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "pomoforge starting");

    let mut renderer = Renderer::stdout();
    install_panic_hook();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = run(&config, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(built) => {
            info!(built, "pomoforge finished");
            println!("Thanks for focusing! Builds completed this session: {built}");
        }
        Err(e) => {
            error!(error = %e, "pomoforge aborted");
            eprintln!("pomoforge: {e}");
            std::process::exit(1);
        }
    }
}

/// Log to a file: the terminal belongs to the renderer.
fn init_logging(path: &Path) -> Result<(), String> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pomoforge=info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .try_init()
        .map_err(|e| e.to_string())
}

/// Leave raw mode and the alternate screen before the panic message prints.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = crossterm::terminal::disable_raw_mode();
        let mut out = std::io::stdout();
        let _ = crossterm::execute!(
            out,
            crossterm::style::ResetColor,
            crossterm::cursor::Show,
            crossterm::terminal::LeaveAlternateScreen
        );
        let _ = out.flush();
        error!(%panic, "panic");
        previous(panic);
    }));
}

fn run<W: Write>(config: &AppConfig, renderer: &mut Renderer<W>) -> ForgeResult<usize> {
    let products = product::builtin()?;

    let audio: Option<Box<dyn AudioBackend>> = if config.audio.enabled {
        match SoundEngine::new() {
            Some(engine) => Some(Box::new(engine)),
            None => {
                warn!("audio unavailable, celebrating silently");
                None
            }
        }
    } else {
        info!("audio disabled in config");
        None
    };

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut session = Session::new(products, config.session_settings(seed), audio, Instant::now())?;
    let mut compositor = Compositor::new(session.panels(), Margin::uniform(config.display.margin))?;

    let mut keys = Some(input::spawn_reader());
    let mut pad = GamepadState::new();
    pad.load_button_config(&config.gamepad);
    if pad.connected {
        info!("gamepad connected");
    }

    let mut ticker = Ticker::new(config.tick_rate(), Instant::now());

    renderer.render(compositor.compose(session.panels())?)?;

    loop {
        if let Some(key) = wait_for_key(&mut keys, ticker.timeout(Instant::now())) {
            if session.handle_key(key, Instant::now())? == Control::Quit {
                break;
            }
            // One input event, then the tick if it is already due.
            if !ticker.is_due(Instant::now()) {
                continue;
            }
        }

        // ── Tick ──
        let now = Instant::now();
        for key in pad.poll() {
            if session.handle_key(key, now)? == Control::Quit {
                return Ok(session.completed_count());
            }
        }
        session.tick(now);
        renderer.render(compositor.compose(session.panels())?)?;
        ticker.advance(now);
    }

    Ok(session.completed_count())
}

/// Fixed-rate tick deadlines for the main loop.
struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    fn new(period: Duration, now: Instant) -> Self {
        Ticker { period, next: now + period }
    }

    fn is_due(&self, now: Instant) -> bool {
        now >= self.next
    }

    /// How long to wait for input before the next tick.
    fn timeout(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Schedule the following tick. Re-anchors on `now` if the loop has
    /// fallen more than a period behind.
    fn advance(&mut self, now: Instant) {
        self.next += self.period;
        if self.next < now {
            self.next = now + self.period;
        }
    }
}

/// Block until a key arrives or `timeout` passes. If the reader thread is
/// gone, just sleep out the timeout.
fn wait_for_key(keys: &mut Option<Receiver<Key>>, timeout: Duration) -> Option<Key> {
    let Some(rx) = keys else {
        thread::sleep(timeout);
        return None;
    };
    match rx.recv_timeout(timeout) {
        Ok(key) => Some(key),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => {
            warn!("keyboard reader gone; gamepad only");
            *keys = None;
            None
        }
    }
}
