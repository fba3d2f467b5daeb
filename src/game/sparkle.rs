use crate::game::map::Grid;
use rand::Rng;
use std::ops::RangeInclusive;

const GLYPHS: [char; 2] = ['*', '+'];
const PLACEMENT_TRIES: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sparkle {
    pub x: usize,
    pub y: usize,
    pub glyph: char,
    pub expires_at: f64,
}

/// Cosmetic glints on open water. Never persisted, never seeded.
#[derive(Clone, Debug)]
pub struct Sparkles {
    rate_per_sec: f64,
    life_ms: RangeInclusive<u32>,
    items: Vec<Sparkle>,
}

impl Sparkles {
    pub fn new(rate_per_sec: f64, life_ms: RangeInclusive<u32>) -> Self {
        Self {
            rate_per_sec,
            life_ms,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Sparkle] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Spawns the sparkles owed for `dt_ms` of frame time.
    pub fn spawn<R: Rng>(
        &mut self,
        rng: &mut R,
        dt_ms: f64,
        now: f64,
        grid: &Grid,
        boat: (usize, usize),
    ) -> usize {
        let expected = self.rate_per_sec * dt_ms.max(0.0) / 1000.0;
        if !expected.is_finite() {
            return 0;
        }
        let mut count = expected.floor() as usize;
        if rng.gen::<f64>() < expected.fract() {
            count += 1;
        }

        let mut spawned = 0;
        for _ in 0..count {
            let Some((x, y)) = pick_open_water(rng, grid, boat) else {
                continue;
            };
            let life = rng.gen_range(self.life_ms.clone());
            self.items.push(Sparkle {
                x,
                y,
                glyph: GLYPHS[rng.gen_range(0..GLYPHS.len())],
                expires_at: now + f64::from(life),
            });
            spawned += 1;
        }
        spawned
    }

    pub fn prune(&mut self, now: f64) {
        self.items.retain(|s| s.expires_at > now);
    }
}

fn pick_open_water<R: Rng>(
    rng: &mut R,
    grid: &Grid,
    boat: (usize, usize),
) -> Option<(usize, usize)> {
    if grid.width() == 0 || grid.height() == 0 {
        return None;
    }
    for _ in 0..PLACEMENT_TRIES {
        let x = rng.gen_range(0..grid.width());
        let y = rng.gen_range(0..grid.height());
        if grid.is_water(x, y) && (x, y) != boat {
            return Some((x, y));
        }
    }
    None
}
