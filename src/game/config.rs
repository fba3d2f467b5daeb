use std::ops::RangeInclusive;

/// localStorage slot holding the single save.
pub const STORAGE_KEY: &str = "tl-ocean-solo-race-v2";

#[derive(Clone, Debug)]
pub struct MapConfig {
    pub width: usize,
    pub height: usize,
    pub islands: RangeInclusive<i32>,
    pub blobs_per_island: RangeInclusive<i32>,
    pub blob_offset_x: i32,
    pub blob_offset_y: i32,
    pub radius_x: RangeInclusive<i32>,
    pub radius_y: RangeInclusive<i32>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 45,
            islands: 9..=12,
            blobs_per_island: 2..=5,
            blob_offset_x: 10,
            blob_offset_y: 6,
            radius_x: 4..=12,
            radius_y: 2..=7,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WeatherConfig {
    /// Width of the front pattern; the rest of the world row is clear.
    pub front_width: usize,
    pub step_ms: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            front_width: 40,
            step_ms: 60_000,
        }
    }
}

#[derive(Clone, Debug)]
pub struct VoyageConfig {
    pub map: MapConfig,
    pub weather: WeatherConfig,
    pub clear_step_ms: u64,
    pub front_step_ms: u64,
    pub max_catchup_ms: u64,
    pub reflections: RangeInclusive<usize>,
    pub sparkle_rate: f64,
    pub sparkle_life_ms: RangeInclusive<u32>,
}

impl Default for VoyageConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            weather: WeatherConfig::default(),
            clear_step_ms: 30_000,
            front_step_ms: 15_000,
            max_catchup_ms: 2 * 60 * 60 * 1000,
            reflections: 5..=8,
            sparkle_rate: 7.0,
            sparkle_life_ms: 200..=800,
        }
    }
}
