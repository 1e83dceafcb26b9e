/// Session: the pomodoro state machine that drives every panel.
///
/// ```text
///   Idle --s--> Working --timer--> WaitingForCelebration --c--> Celebrating
///    ^                                                              |
///    +------------------- timer --- OnBreak <------- celebration done
/// ```
///
/// The session owns the countdown and the panels and is the only caller
/// of their setters. Input arrives through `handle_key`, time through
/// `tick`; both take `now` explicitly.

use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::domain::cell::Cell;
use crate::domain::product::Product;
use crate::domain::timer::{format_mm_ss, Countdown};
use crate::error::{ForgeError, ForgeResult};
use crate::sim::audio::{AudioBackend, Effect};
use crate::sim::celebration::{Celebration, Phase};
use crate::sim::phrases::{PhraseCloud, PHRASES, PHRASE_COLORS};
use crate::sim::scene::BuildScene;
use crate::ui::command::{CommandBar, Hint};
use crate::ui::compositor::Panel;
use crate::ui::input::Key;
use crate::ui::status::StatusPanel;

pub const PHRASE_WIDTH: usize = 30;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    Idle,
    Working,
    WaitingForCelebration,
    Celebrating,
    OnBreak,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub work: Duration,
    pub short_break: Duration,
    pub long_break: Duration,
    /// Every Nth completed build earns the long break.
    pub long_break_every: u32,
    pub phrase_slots: usize,
    pub phrase_rotation: Duration,
    pub seed: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            work: Duration::from_secs(25 * 60),
            short_break: Duration::from_secs(5 * 60),
            long_break: Duration::from_secs(15 * 60),
            long_break_every: 4,
            phrase_slots: 4,
            phrase_rotation: Duration::from_secs(15),
            seed: 0,
        }
    }
}

const CONGRATULATIONS: &[&str] = &[
    "Great job! Your {product} number {n} is done.",
    "Wonderful! {product} number {n} is fresh off the line.",
    "Look at that! {n} builds and this {product} is the best yet.",
    "Nice focus! {product} number {n} is ready to ship.",
    "Fantastic! Another {product} done, that makes {n}.",
];

/// Congratulation for the `n`th completed build (1-based).
pub fn congratulation(product: &str, n: usize) -> String {
    let template = CONGRATULATIONS[n.saturating_sub(1) % CONGRATULATIONS.len()];
    template.replace("{product}", product).replace("{n}", &n.to_string())
}

fn hints(state: State) -> &'static [Hint] {
    match state {
        State::Idle => &[("s", "start"), ("←/→", "product"), ("q", "quit")],
        State::Working | State::OnBreak => &[("q", "quit")],
        State::WaitingForCelebration => &[("c", "celebrate"), ("q", "quit")],
        State::Celebrating => &[],
    }
}

pub struct Session {
    settings: SessionSettings,
    state: State,
    timer: Countdown,
    products: Vec<Product>,
    selected: usize,
    /// Product index of every completed build, in order.
    completed: Vec<usize>,
    long_break: bool,
    scene: BuildScene,
    celebration: Celebration,
    phrases: PhraseCloud,
    status: StatusPanel,
    commands: CommandBar,
    audio: Option<Box<dyn AudioBackend>>,
    last_rotation: Instant,
}

impl Session {
    pub fn new(
        products: Vec<Product>,
        settings: SessionSettings,
        audio: Option<Box<dyn AudioBackend>>,
        now: Instant,
    ) -> ForgeResult<Self> {
        let scene = BuildScene::new(&products)?;
        let phrases = PhraseCloud::new(
            PHRASE_WIDTH,
            scene.height(),
            settings.phrase_slots,
            PHRASES,
            PHRASE_COLORS,
            settings.seed,
        );
        let mut session = Session {
            timer: Countdown::new(settings.work),
            settings,
            state: State::Idle,
            products,
            selected: 0,
            completed: Vec::new(),
            long_break: false,
            scene,
            celebration: Celebration::new(),
            phrases,
            status: StatusPanel::new(),
            commands: CommandBar::new(),
            audio,
            last_rotation: now,
        };
        session.enter_idle()?;
        Ok(session)
    }

    // ── Input ──

    pub fn handle_key(&mut self, key: Key, now: Instant) -> ForgeResult<Control> {
        match (self.state, key) {
            (_, Key::Quit) => return Ok(Control::Quit),
            (State::Idle, Key::Char('s' | 'S')) => self.start_work(now),
            (State::Idle, Key::Left) => self.select(-1)?,
            (State::Idle, Key::Right) => self.select(1)?,
            (State::WaitingForCelebration, Key::Char('c' | 'C')) => self.start_celebration(now),
            _ => {}
        }
        Ok(Control::Continue)
    }

    fn select(&mut self, step: isize) -> ForgeResult<()> {
        let n = self.products.len() as isize;
        self.selected = (self.selected as isize + step).rem_euclid(n) as usize;
        info!(product = %self.product().name, "product selected");
        self.enter_idle()
    }

    // ── Tick ──

    pub fn tick(&mut self, now: Instant) {
        match self.state {
            State::Idle | State::WaitingForCelebration => {}
            State::Working => {
                let p = self.timer.progress(now);
                self.scene.set_progress(p);
                if self.timer.is_finished() {
                    self.finish_work();
                } else {
                    let left = format_mm_ss(self.timer.remaining(now));
                    let name = self.product().name.clone();
                    self.status.set_text(&format!("Building a {name}..."), &format!("{left} left"));
                }
            }
            State::Celebrating => {
                let phase = self.celebration.tick(now, self.audio.as_deref());
                match phase {
                    Phase::Party => {
                        let tick = self.celebration.party_tick();
                        self.scene.set_celebrating(tick);
                        self.status.set_celebration_text(self.celebration.message(), tick);
                    }
                    Phase::Speech => {
                        let at = self.celebration.current_char_index();
                        self.status.set_speech_text(self.celebration.message(), at);
                    }
                    Phase::Done => self.start_break(now),
                    Phase::None => {}
                }
            }
            State::OnBreak => {
                self.timer.progress(now);
                if self.timer.is_finished() {
                    self.finish_break();
                } else {
                    let kind = if self.long_break { "Long" } else { "Short" };
                    let left = format_mm_ss(self.timer.remaining(now));
                    self.status.set_text(&format!("{kind} break, step away"), &format!("{left} left"));
                }
            }
        }

        self.phrases.tick();
        if now.saturating_duration_since(self.last_rotation) >= self.settings.phrase_rotation {
            self.phrases.replace_one();
            self.last_rotation = now;
        }
    }

    // ── Transitions ──

    fn start_work(&mut self, now: Instant) {
        self.timer.reset(self.settings.work);
        self.timer.start(now);
        self.scene.reset();
        let name = self.product().name.clone();
        info!(product = %name, minutes = self.settings.work.as_secs() / 60, "work started");
        self.status.set_text(&format!("Building a {name}..."), &format_mm_ss(self.settings.work));
        self.set_state(State::Working);
    }

    fn finish_work(&mut self) {
        self.scene.set_progress(1.0);
        let name = self.product().name.clone();
        info!(product = %name, "work finished");
        self.status.set_text(&format!("Your {name} is finished!"), "Press [c] to celebrate.");
        if let Some(audio) = &self.audio {
            audio.play_effect(Effect::Notification);
        }
        self.set_state(State::WaitingForCelebration);
    }

    fn start_celebration(&mut self, now: Instant) {
        if self.celebration.is_active() {
            return;
        }
        let message = congratulation(&self.product().name, self.completed.len() + 1);
        info!(%message, "celebration started");
        self.celebration.start(&message, now, self.audio.as_deref());
        self.set_state(State::Celebrating);
    }

    fn start_break(&mut self, now: Instant) {
        self.completed.push(self.selected);
        let badges: Vec<Cell> =
            self.completed.iter().map(|&i| self.products[i].badge).collect();
        self.status.set_achievements("Built:", &badges);

        let n = self.completed.len() as u32;
        self.long_break = self.settings.long_break_every > 0 && n % self.settings.long_break_every == 0;
        let length = if self.long_break { self.settings.long_break } else { self.settings.short_break };
        self.scene.set_progress(1.0);
        self.timer.reset(length);
        self.timer.start(now);
        info!(completed = n, long = self.long_break, secs = self.timer.duration().as_secs(), "break started");

        let kind = if self.long_break { "Long" } else { "Short" };
        self.status.set_text(&format!("{kind} break, step away"), &format_mm_ss(length));
        self.set_state(State::OnBreak);
    }

    fn finish_break(&mut self) {
        info!("break finished");
        self.timer.reset(self.settings.work);
        if let Some(audio) = &self.audio {
            audio.play_effect(Effect::Notification);
        }
        // The selected art always fits: the scene is sized for every product.
        if let Err(e) = self.enter_idle() {
            error!(error = %e, "could not reload product art");
        }
    }

    fn enter_idle(&mut self) -> ForgeResult<()> {
        let product = self
            .products
            .get(self.selected)
            .ok_or_else(|| ForgeError::art("<none>", "no product selected"))?;
        self.scene.load_art(&product.art)?;
        let name = product.name.clone();
        self.status.set_text(
            &format!("Next build: < {name} >"),
            &format!("{} of focus. Press [s] to start.", format_mm_ss(self.settings.work)),
        );
        self.set_state(State::Idle);
        Ok(())
    }

    fn set_state(&mut self, state: State) {
        if self.state != state {
            info!(from = ?self.state, to = ?state, "state change");
        }
        self.state = state;
        self.commands.set_hints(hints(state));
    }

    // ── Queries ──

    #[cfg(test)]
    pub fn state(&self) -> State {
        self.state
    }

    #[cfg(test)]
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn product(&self) -> &Product {
        &self.products[self.selected]
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    #[cfg(test)]
    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    #[cfg(test)]
    pub fn scene(&self) -> &BuildScene {
        &self.scene
    }

    #[cfg(test)]
    pub fn phrases(&self) -> &PhraseCloud {
        &self.phrases
    }

    /// `[top_left, top_right, middle, bottom]` for the compositor.
    pub fn panels(&self) -> [&dyn Panel; 4] {
        [&self.scene, &self.phrases, &self.status, &self.commands]
    }
}
