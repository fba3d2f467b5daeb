use crate::game::config::WeatherConfig;
use crate::game::rng::{random_int, Mulberry32};

/// The storm front pattern. Generated once per seed and scrolled across the
/// world by an offset that lives on the voyage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeatherMask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl WeatherMask {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, value: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = value;
        }
    }

    /// Whether world cell `(x, y)` sits under the front when the pattern is
    /// scrolled `offset` columns across a world `world_width` wide.
    pub fn covers(&self, world_x: i64, y: usize, offset: usize, world_width: usize) -> bool {
        if world_width == 0 {
            return false;
        }
        let w = world_width as i64;
        let local_x = ((world_x - offset as i64) % w + w) % w;
        let local_x = local_x as usize;
        if local_x >= self.width {
            return false;
        }
        self.get(local_x, y)
    }

    /// One pass of 3x3 majority smoothing; out-of-bounds neighbours count as clear.
    fn smoothed(&self) -> Self {
        let mut next = self.clone();
        for y in 0..self.height {
            for x in 0..self.width {
                let mut count = 0;
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx >= 0 && ny >= 0 && self.get(nx as usize, ny as usize) {
                            count += 1;
                        }
                    }
                }
                next.set(x, y, count >= 4);
            }
        }
        next
    }
}

pub struct WeatherGenerator {
    rng: Mulberry32,
    width: usize,
    height: usize,
}

impl WeatherGenerator {
    pub fn new(seed: u32, config: &WeatherConfig, height: usize) -> Self {
        Self {
            rng: Mulberry32::for_purpose("weather:", seed),
            width: config.front_width,
            height,
        }
    }

    fn thickness_bounds(&self) -> (i32, i32) {
        let min = ((self.width as f64 * 0.4).floor() as i32).max(3);
        let max = ((self.width as f64 * 0.8).floor() as i32).max(min);
        (min, max)
    }

    pub fn generate(&mut self) -> WeatherMask {
        let mut mask = WeatherMask {
            width: self.width,
            height: self.height,
            cells: vec![false; self.width * self.height],
        };
        if self.width == 0 || self.height == 0 {
            return mask;
        }

        self.paint_band(&mut mask);
        self.punch_holes(&mut mask);
        mask.smoothed()
    }

    fn paint_band(&mut self, mask: &mut WeatherMask) {
        let wf = self.width as i32;
        let (min_thick, max_thick) = self.thickness_bounds();
        let mut center = random_int(&mut self.rng, wf / 4, (wf * 3) / 4);
        let mut thickness = random_int(&mut self.rng, min_thick, max_thick);

        for y in 0..self.height {
            center = (center + random_int(&mut self.rng, -1, 1)).clamp(0, wf - 1);
            thickness =
                (thickness + random_int(&mut self.rng, -1, 1)).clamp(min_thick, max_thick);
            let start = center - thickness / 2;
            for x in start.max(0)..(start + thickness).min(wf) {
                mask.set(x as usize, y, true);
            }
        }
    }

    fn punch_holes(&mut self, mask: &mut WeatherMask) {
        let wf = self.width as i32;
        let h = self.height as i32;
        let holes = (self.height * self.width / 18).max(8);
        for _ in 0..holes {
            let hw = random_int(&mut self.rng, 2, 3).min(wf);
            let hh = random_int(&mut self.rng, 1, 2).min(h);
            let hx = random_int(&mut self.rng, 0, wf - hw);
            let hy = random_int(&mut self.rng, 0, h - hh);
            for y in hy..hy + hh {
                for x in hx..hx + hw {
                    mask.set(x as usize, y as usize, false);
                }
            }
        }
    }
}

pub fn generate_weather(seed: u32, config: &WeatherConfig, height: usize) -> WeatherMask {
    WeatherGenerator::new(seed, config, height).generate()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: usize = 160;

    fn mask_for(seed: u32) -> WeatherMask {
        generate_weather(seed, &WeatherConfig::default(), 45)
    }

    fn raw_mask(width: usize, height: usize, on: &[(usize, usize)]) -> WeatherMask {
        let mut mask = WeatherMask {
            width,
            height,
            cells: vec![false; width * height],
        };
        for &(x, y) in on {
            mask.set(x, y, true);
        }
        mask
    }

    #[test]
    fn mask_is_deterministic_per_seed() {
        assert_eq!(mask_for(42), mask_for(42));
        assert_ne!(mask_for(42), mask_for(43));
    }

    #[test]
    fn mask_has_front_dimensions_and_coverage() {
        let mask = mask_for(42);
        assert_eq!(mask.width(), 40);
        assert_eq!(mask.height(), 45);
        let on = mask.cells.iter().filter(|c| **c).count();
        assert!(on > 0, "front should cover something");
        assert!(on < mask.cells.len(), "front should not be solid");
    }

    #[test]
    fn coverage_is_periodic_in_world_width() {
        let mask = mask_for(7);
        for offset in [0, 13, 159] {
            for y in 0..45 {
                for x in -200i64..200 {
                    assert_eq!(
                        mask.covers(x, y, offset, WORLD),
                        mask.covers(x + WORLD as i64, y, offset, WORLD),
                        "x={x} y={y} offset={offset}"
                    );
                }
            }
        }
    }

    #[test]
    fn coverage_follows_offset() {
        let mask = raw_mask(4, 1, &[(0, 0)]);
        assert!(mask.covers(0, 0, 0, 10));
        assert!(mask.covers(3, 0, 3, 10));
        assert!(!mask.covers(0, 0, 3, 10));
        // wraps around the right edge back to column 1
        assert!(mask.covers(1, 0, 11, 10));
    }

    #[test]
    fn columns_beyond_front_width_are_clear() {
        let mask = raw_mask(4, 1, &[(0, 0), (1, 0), (2, 0), (3, 0)]);
        for x in 4..10 {
            assert!(!mask.covers(x, 0, 0, 10));
        }
    }

    #[test]
    fn smoothing_removes_isolated_cells_and_fills_gaps() {
        let lonely = raw_mask(5, 5, &[(2, 2)]).smoothed();
        assert!(!lonely.get(2, 2));

        let mut block = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                if (x, y) != (1, 1) {
                    block.push((x, y));
                }
            }
        }
        let filled = raw_mask(3, 3, &block).smoothed();
        assert!(filled.get(1, 1));
        // corner sees itself plus two edge neighbours only
        assert!(!filled.get(0, 0));
    }
}
