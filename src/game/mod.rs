pub mod config;
pub mod map;
pub mod reflections;
pub mod render;
pub mod rng;
pub mod save;
pub mod sparkle;
pub mod voyage;
pub mod weather;

use crate::storage::KeyValueStore;
use config::{VoyageConfig, STORAGE_KEY};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use render::{render_intro, render_voyage, Screen};
use sparkle::Sparkles;
use voyage::{Heading, Voyage};

const NOTICE_MS: u64 = 1_800;
const RESET_NOTICE_MS: u64 = 2_200;
const RESET_CONFIRM_MS: u64 = 2_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Intro,
    Playing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Steer(Heading),
    ToggleAnchor,
    Reset,
    Start,
}

impl InputEvent {
    /// Maps a DOM `KeyboardEvent.key` to an event for the current phase.
    pub fn from_key(key: &str, phase: Phase) -> Option<Self> {
        match phase {
            Phase::Intro => match key {
                "Enter" | " " | "Spacebar" | "s" | "S" => Some(InputEvent::Start),
                _ => None,
            },
            Phase::Playing => match key {
                "ArrowUp" => Some(InputEvent::Steer(Heading::N)),
                "ArrowRight" => Some(InputEvent::Steer(Heading::E)),
                "ArrowDown" => Some(InputEvent::Steer(Heading::S)),
                "ArrowLeft" => Some(InputEvent::Steer(Heading::W)),
                "a" | "A" => Some(InputEvent::ToggleAnchor),
                "r" | "R" => Some(InputEvent::Reset),
                _ => None,
            },
        }
    }
}

#[derive(Clone, Debug)]
struct Notice {
    text: String,
    until_ms: u64,
}

/// Everything one browser tab owns: the voyage, its save slot and the
/// transient UI state around it.
pub struct Session<S: KeyValueStore> {
    store: S,
    config: VoyageConfig,
    phase: Phase,
    voyage: Voyage,
    sparkles: Sparkles,
    rng: ChaCha8Rng,
    notice: Option<Notice>,
    reset_armed_until: Option<u64>,
    last_frame: Option<f64>,
}

impl<S: KeyValueStore> Session<S> {
    pub fn load(store: S, now_ms: u64) -> Self {
        Self::with_config(store, now_ms, VoyageConfig::default(), ChaCha8Rng::from_entropy())
    }

    pub fn with_config(store: S, now_ms: u64, config: VoyageConfig, rng: ChaCha8Rng) -> Self {
        let raw = match store.get(STORAGE_KEY) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("could not read save slot: {}", err);
                None
            }
        };
        let voyage = save::load_or_new(raw.as_deref(), now_ms, config.clone());
        let sparkles = Sparkles::new(config.sparkle_rate, config.sparkle_life_ms.clone());
        Self {
            store,
            config,
            phase: Phase::Intro,
            voyage,
            sparkles,
            rng,
            notice: None,
            reset_armed_until: None,
            last_frame: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn voyage(&self) -> &Voyage {
        &self.voyage
    }

    pub fn notice(&self, now_ms: u64) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| n.until_ms > now_ms)
            .map(|n| n.text.as_str())
    }

    fn set_notice(&mut self, text: &str, now_ms: u64, ms: u64) {
        self.notice = Some(Notice {
            text: text.to_string(),
            until_ms: now_ms + ms,
        });
    }

    fn persist(&self) {
        match save::encode(&self.voyage) {
            Ok(json) => {
                if let Err(err) = self.store.set(STORAGE_KEY, &json) {
                    warn!("could not write save slot: {}", err);
                }
            }
            Err(err) => warn!("{}", err),
        }
    }

    fn catch_up(&mut self, now_ms: u64) {
        let report = self.voyage.advance(now_ms);
        for text in &report.found {
            info!("reflection found: {}", text);
        }
        if report.changed() {
            self.persist();
        }
    }

    /// Applies one input event. Returns whether the event was used.
    pub fn handle(&mut self, event: InputEvent, now_ms: u64) -> bool {
        match (self.phase, event) {
            (Phase::Intro, InputEvent::Start) => {
                self.start(now_ms);
                true
            }
            (Phase::Intro, _) | (Phase::Playing, InputEvent::Start) => false,
            (Phase::Playing, InputEvent::Steer(heading)) => {
                self.catch_up(now_ms);
                self.voyage.steer(heading);
                self.persist();
                true
            }
            (Phase::Playing, InputEvent::ToggleAnchor) => {
                self.catch_up(now_ms);
                let anchored = self.voyage.toggle_anchor();
                let text = if anchored { "Anchor dropped" } else { "Anchor raised" };
                self.set_notice(text, now_ms, NOTICE_MS);
                self.persist();
                true
            }
            (Phase::Playing, InputEvent::Reset) => {
                self.request_reset(now_ms);
                true
            }
        }
    }

    fn start(&mut self, now_ms: u64) {
        self.phase = Phase::Playing;
        self.notice = None;
        self.reset_armed_until = None;
        self.catch_up(now_ms);
        self.persist();
        info!("sailing seed={}", self.voyage.seed());
    }

    fn request_reset(&mut self, now_ms: u64) {
        match self.reset_armed_until {
            Some(until) if now_ms <= until => {
                let seed = save::time_seed(now_ms);
                self.voyage = Voyage::with_config(seed, now_ms, self.config.clone());
                self.sparkles.clear();
                self.reset_armed_until = None;
                self.set_notice("Game reset", now_ms, RESET_NOTICE_MS);
                self.persist();
            }
            _ => {
                self.reset_armed_until = Some(now_ms + RESET_CONFIRM_MS);
                self.set_notice("Press R again to confirm reset", now_ms, RESET_CONFIRM_MS);
            }
        }
    }

    /// One animation frame: catch up, decorate, describe the screen.
    ///
    /// `now_ms` is wall-clock time for the voyage schedules; `perf_ms` is the
    /// frame clock and only drives sparkles.
    pub fn frame(&mut self, now_ms: u64, perf_ms: f64) -> Screen {
        let dt = self.last_frame.map_or(0.0, |last| perf_ms - last);
        self.last_frame = Some(perf_ms);

        let width = self.voyage.grid().width();
        let height = self.voyage.grid().height();
        if self.phase == Phase::Intro {
            return render_intro(width, height);
        }

        self.catch_up(now_ms);
        let boat = (self.voyage.boat().x, self.voyage.boat().y);
        self.sparkles
            .spawn(&mut self.rng, dt, perf_ms, self.voyage.grid(), boat);
        self.sparkles.prune(perf_ms);
        render_voyage(&self.voyage, self.sparkles.items(), self.notice(now_ms))
    }
}
