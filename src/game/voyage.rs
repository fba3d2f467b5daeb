use crate::game::config::VoyageConfig;
use crate::game::map::{find_water_start, Grid, MapGenerator};
use crate::game::reflections::{place_reflections, Reflection};
use crate::game::weather::{generate_weather, WeatherMask};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    N,
    E,
    S,
    W,
}

impl Heading {
    pub fn delta(self) -> (i64, i64) {
        match self {
            Heading::N => (0, -1),
            Heading::E => (1, 0),
            Heading::S => (0, 1),
            Heading::W => (-1, 0),
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Heading::N => '▲',
            Heading::E => '▶',
            Heading::S => '▼',
            Heading::W => '◀',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Heading::N => "N",
            Heading::E => "E",
            Heading::S => "S",
            Heading::W => "W",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "N" => Some(Heading::N),
            "E" => Some(Heading::E),
            "S" => Some(Heading::S),
            "W" => Some(Heading::W),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Boat {
    pub x: usize,
    pub y: usize,
    pub heading: Heading,
    pub anchored: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoatState {
    Anchored,
    Blocked,
    Clear,
}

/// What a call to [`Voyage::advance`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    pub weather_steps: u32,
    pub boat_steps: u32,
    pub moves: u32,
    /// Elapsed time beyond the catch-up cap that was discarded.
    pub dropped_ms: u64,
    pub found: Vec<String>,
}

impl AdvanceReport {
    pub fn changed(&self) -> bool {
        self.weather_steps > 0 || self.boat_steps > 0 || self.dropped_ms > 0
    }
}

/// One voyage: the archipelago, the boat and both schedules.
///
/// Boat and weather each keep a next-due timestamp; `advance` replays due
/// events in time order so the outcome does not depend on how often it is
/// called.
#[derive(Clone, Debug)]
pub struct Voyage {
    pub(crate) config: VoyageConfig,
    pub(crate) seed: u32,
    pub(crate) grid: Grid,
    pub(crate) weather: WeatherMask,
    pub(crate) boat: Boat,
    pub(crate) front_offset: usize,
    pub(crate) boat_due_ms: u64,
    pub(crate) weather_due_ms: u64,
    pub(crate) reflections: Vec<Reflection>,
    pub(crate) found: u32,
    pub(crate) total: u32,
    pub(crate) aphorism: Option<String>,
    pub(crate) aphorism_visible: bool,
}

impl Voyage {
    pub fn new(seed: u32, now_ms: u64) -> Self {
        Self::with_config(seed, now_ms, VoyageConfig::default())
    }

    pub fn with_config(seed: u32, now_ms: u64, config: VoyageConfig) -> Self {
        let grid = MapGenerator::with_config(seed, config.map.clone()).generate();
        Self::assemble(seed, grid, now_ms, config)
    }

    fn assemble(seed: u32, grid: Grid, now_ms: u64, config: VoyageConfig) -> Self {
        let weather = generate_weather(seed, &config.weather, grid.height());
        let (x, y) = find_water_start(&grid);
        let reflections = place_reflections(&grid, (x, y), seed, config.reflections.clone());
        let total = reflections.len() as u32;

        let mut voyage = Self {
            weather_due_ms: now_ms + config.weather.step_ms.max(1),
            config,
            seed,
            grid,
            weather,
            boat: Boat {
                x,
                y,
                heading: Heading::E,
                anchored: false,
            },
            front_offset: 0,
            boat_due_ms: now_ms,
            reflections,
            found: 0,
            total,
            aphorism: None,
            aphorism_visible: false,
        };
        voyage.boat_due_ms = now_ms + voyage.boat_interval_ms();
        info!("new voyage seed={} start=({},{})", seed, x, y);
        voyage
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn config(&self) -> &VoyageConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn weather(&self) -> &WeatherMask {
        &self.weather
    }

    pub fn boat(&self) -> &Boat {
        &self.boat
    }

    pub fn front_offset(&self) -> usize {
        self.front_offset
    }

    pub fn boat_due_ms(&self) -> u64 {
        self.boat_due_ms
    }

    pub fn weather_due_ms(&self) -> u64 {
        self.weather_due_ms
    }

    pub fn reflections(&self) -> &[Reflection] {
        &self.reflections
    }

    pub fn found(&self) -> u32 {
        self.found
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// The aphorism currently on display, if any.
    pub fn visible_aphorism(&self) -> Option<&str> {
        if self.aphorism_visible {
            self.aphorism.as_deref()
        } else {
            None
        }
    }

    pub fn in_front(&self, x: usize, y: usize) -> bool {
        self.weather
            .covers(x as i64, y, self.front_offset, self.grid.width())
    }

    pub fn boat_in_front(&self) -> bool {
        self.in_front(self.boat.x, self.boat.y)
    }

    /// Rough seas inside the front shorten the interval.
    pub fn boat_interval_ms(&self) -> u64 {
        let ms = if self.boat_in_front() {
            self.config.front_step_ms
        } else {
            self.config.clear_step_ms
        };
        ms.max(1)
    }

    /// Cell ahead of the bow. Wraps left/right, stops at the top and bottom.
    pub fn forward_cell(&self) -> Option<(usize, usize)> {
        let (dx, dy) = self.boat.heading.delta();
        let w = self.grid.width() as i64;
        let ny = self.boat.y as i64 + dy;
        if w == 0 || ny < 0 || ny >= self.grid.height() as i64 {
            return None;
        }
        let nx = ((self.boat.x as i64 + dx) % w + w) % w;
        Some((nx as usize, ny as usize))
    }

    pub fn boat_state(&self) -> BoatState {
        if self.boat.anchored {
            return BoatState::Anchored;
        }
        match self.forward_cell() {
            Some((x, y)) if self.grid.is_water(x, y) => BoatState::Clear,
            _ => BoatState::Blocked,
        }
    }

    pub fn steer(&mut self, heading: Heading) {
        self.boat.heading = heading;
    }

    /// Flips the anchor and returns whether it is now down.
    pub fn toggle_anchor(&mut self) -> bool {
        self.boat.anchored = !self.boat.anchored;
        self.boat.anchored
    }

    /// Brings both schedules up to `now_ms`.
    pub fn advance(&mut self, now_ms: u64) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        let floor = now_ms.saturating_sub(self.config.max_catchup_ms);
        let stale = self.boat_due_ms.min(self.weather_due_ms);
        if stale < floor {
            report.dropped_ms = floor - stale;
            self.boat_due_ms = self.boat_due_ms.max(floor);
            self.weather_due_ms = self.weather_due_ms.max(floor);
            debug!("catch-up capped, dropping {}ms", report.dropped_ms);
        }

        loop {
            let due = self.boat_due_ms.min(self.weather_due_ms);
            if due > now_ms {
                break;
            }
            if self.weather_due_ms <= self.boat_due_ms {
                self.step_weather(&mut report);
            } else {
                self.step_boat(&mut report);
            }
        }

        report
    }

    fn step_weather(&mut self, report: &mut AdvanceReport) {
        let width = self.grid.width().max(1);
        self.front_offset = (self.front_offset + 1) % width;
        self.weather_due_ms += self.config.weather.step_ms.max(1);
        report.weather_steps += 1;
    }

    fn step_boat(&mut self, report: &mut AdvanceReport) {
        let at = self.boat_due_ms;
        report.boat_steps += 1;
        if self.boat_state() == BoatState::Clear {
            if let Some((x, y)) = self.forward_cell() {
                self.boat.x = x;
                self.boat.y = y;
                report.moves += 1;
                self.aphorism = None;
                self.aphorism_visible = false;
                if let Some(text) = self.collect_at(x, y) {
                    report.found.push(text);
                }
            }
        }
        self.boat_due_ms = at + self.boat_interval_ms();
    }

    fn collect_at(&mut self, x: usize, y: usize) -> Option<String> {
        let idx = self.reflections.iter().position(|r| r.x == x && r.y == y)?;
        let reflection = self.reflections.remove(idx);
        self.found += 1;
        self.aphorism = Some(reflection.text.clone());
        self.aphorism_visible = true;
        debug!(
            "reflection {}/{} found at ({},{})",
            self.found, self.total, x, y
        );
        self.ensure_reflections();
        Some(reflection.text)
    }

    /// Regenerates a full set around the current boat position when none
    /// are left. Returns whether a new set was placed.
    pub(crate) fn ensure_reflections(&mut self) -> bool {
        if !self.reflections.is_empty() {
            return false;
        }
        self.reflections = place_reflections(
            &self.grid,
            (self.boat.x, self.boat.y),
            self.seed,
            self.config.reflections.clone(),
        );
        self.found = 0;
        self.total = self.reflections.len() as u32;
        info!("placed {} fresh reflections", self.total);
        true
    }
}
