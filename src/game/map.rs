use crate::game::config::MapConfig;
use crate::game::rng::{random_int, Mulberry32};
use log::warn;
use std::ops::RangeInclusive;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Water,
    Land,
}

impl Cell {
    pub fn glyph(self) -> char {
        match self {
            Cell::Water => '.',
            Cell::Land => '#',
        }
    }
}

/// Fixed-size archipelago, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn filled(width: usize, height: usize, cell: Cell) -> Self {
        Self {
            width,
            height,
            cells: vec![cell; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    pub fn is_water(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == Some(Cell::Water)
    }

    /// Every water cell in row-major order.
    pub fn water_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Cell::Water)
            .map(move |(i, _)| (i % self.width, i / self.width))
    }
}

pub struct MapGenerator {
    rng: Mulberry32,
    config: MapConfig,
}

impl MapGenerator {
    pub fn new(seed: u32) -> Self {
        Self::with_config(seed, MapConfig::default())
    }

    pub fn with_config(seed: u32, config: MapConfig) -> Self {
        Self {
            rng: Mulberry32::for_purpose("", seed),
            config,
        }
    }

    fn rng_in_range(&mut self, range: RangeInclusive<i32>) -> i32 {
        random_int(&mut self.rng, *range.start(), *range.end())
    }

    pub fn generate(&mut self) -> Grid {
        let w = self.config.width as i32;
        let h = self.config.height as i32;
        let mut grid = Grid::filled(self.config.width, self.config.height, Cell::Water);

        let island_count = self.rng_in_range(self.config.islands.clone());
        for _ in 0..island_count {
            let cx = random_int(&mut self.rng, 8, w - 9);
            let cy = random_int(&mut self.rng, 6, h - 7);
            let blobs = self.rng_in_range(self.config.blobs_per_island.clone());

            for _ in 0..blobs {
                let ox = random_int(&mut self.rng, -self.config.blob_offset_x, self.config.blob_offset_x);
                let oy = random_int(&mut self.rng, -self.config.blob_offset_y, self.config.blob_offset_y);
                let bx = (cx + ox).clamp(2, w - 3);
                let by = (cy + oy).clamp(2, h - 3);
                let rx = self.rng_in_range(self.config.radius_x.clone());
                let ry = self.rng_in_range(self.config.radius_y.clone());
                paint_ellipse(&mut grid, bx, by, rx, ry);
            }
        }

        grid
    }
}

fn paint_ellipse(grid: &mut Grid, bx: i32, by: i32, rx: i32, ry: i32) {
    let max_x = grid.width() as i32 - 1;
    let max_y = grid.height() as i32 - 1;
    for y in (by - ry).clamp(0, max_y)..=(by + ry).clamp(0, max_y) {
        for x in (bx - rx).clamp(0, max_x)..=(bx + rx).clamp(0, max_x) {
            let nx = f64::from(x - bx) / f64::from(rx);
            let ny = f64::from(y - by) / f64::from(ry);
            if nx * nx + ny * ny <= 1.0 {
                grid.set(x as usize, y as usize, Cell::Land);
            }
        }
    }
}

pub fn generate_map(seed: u32) -> Grid {
    MapGenerator::new(seed).generate()
}

/// Nearest water to the grid center, scanning square rings outward.
/// Falls back to the origin when there is no water at all.
pub fn find_water_start(grid: &Grid) -> (usize, usize) {
    let cx = (grid.width() / 2) as i64;
    let cy = (grid.height() / 2) as i64;
    if grid.is_water(cx as usize, cy as usize) {
        return (cx as usize, cy as usize);
    }

    let max_r = grid.width().max(grid.height()) as i64;
    for r in 1..=max_r {
        for dy in -r..=r {
            for dx in -r..=r {
                let (x, y) = (cx + dx, cy + dy);
                if x < 0 || y < 0 {
                    continue;
                }
                if grid.is_water(x as usize, y as usize) {
                    return (x as usize, y as usize);
                }
            }
        }
    }

    warn!("generated grid has no water; starting at the origin");
    (0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        for seed in [0, 1, 42, 123_456_789, u32::MAX] {
            assert_eq!(generate_map(seed), generate_map(seed));
        }
    }

    #[test]
    fn different_seeds_give_different_archipelagos() {
        assert_ne!(generate_map(1), generate_map(2));
    }

    #[test]
    fn grid_has_configured_dimensions_and_some_land() {
        let grid = generate_map(42);
        assert_eq!(grid.width(), 160);
        assert_eq!(grid.height(), 45);
        let land = grid.width() * grid.height() - grid.water_cells().count();
        assert!(land > 0);
    }

    #[test]
    fn start_search_returns_water() {
        for seed in 0..50 {
            let grid = generate_map(seed);
            let (x, y) = find_water_start(&grid);
            assert!(grid.is_water(x, y), "seed {seed} start ({x},{y}) is land");
        }
    }

    #[test]
    fn start_search_prefers_center() {
        let grid = Grid::filled(11, 7, Cell::Water);
        assert_eq!(find_water_start(&grid), (5, 3));
    }

    #[test]
    fn start_search_scans_rings_row_major() {
        let mut grid = Grid::filled(11, 7, Cell::Land);
        grid.set(6, 4, Cell::Water);
        grid.set(4, 2, Cell::Water);
        assert_eq!(find_water_start(&grid), (4, 2));
    }

    #[test]
    fn start_search_falls_back_to_origin_on_all_land() {
        let grid = Grid::filled(8, 4, Cell::Land);
        assert_eq!(find_water_start(&grid), (0, 0));
    }

    #[test]
    fn water_cells_are_row_major() {
        let mut grid = Grid::filled(3, 2, Cell::Water);
        grid.set(1, 0, Cell::Land);
        let cells: Vec<_> = grid.water_cells().collect();
        assert_eq!(cells, vec![(0, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }
}
