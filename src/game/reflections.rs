use crate::game::map::Grid;
use crate::game::rng::{random_int, shuffle, Mulberry32};
use std::ops::RangeInclusive;

pub const APHORISMS: &[&str] = &[
    "The sea does not hurry, yet it reaches every shore.",
    "A calm horizon is still a horizon.",
    "Drop anchor before the storm, not during it.",
    "The wind answers only the sail that is raised.",
    "Every island was once just a rumour of land.",
    "Slow water still carves stone.",
    "You cannot steer a boat that is not moving.",
    "The compass points; the sailor decides.",
    "Rough seas make the kettle taste better.",
    "Charts are memories of other people's courage.",
    "The tide returns what it borrows.",
    "A quiet deck is a good place to think.",
    "Stars do not mind which way you are heading.",
    "Distance is patience measured in waves.",
    "Salt dries; the journey stays.",
    "Even driftwood arrives somewhere.",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reflection {
    pub x: usize,
    pub y: usize,
    pub text: String,
}

pub fn is_known_aphorism(text: &str) -> bool {
    APHORISMS.contains(&text)
}

/// Scatters a seeded set of reflections over water, never on `exclude`.
///
/// Positions and aphorisms are both unique within the returned set.
pub fn place_reflections(
    grid: &Grid,
    exclude: (usize, usize),
    seed: u32,
    count_range: RangeInclusive<usize>,
) -> Vec<Reflection> {
    let mut rng = Mulberry32::for_purpose("qmarks:", seed);
    let count = random_int(&mut rng, *count_range.start() as i32, *count_range.end() as i32);

    let mut spots: Vec<(usize, usize)> = grid.water_cells().filter(|p| *p != exclude).collect();
    shuffle(&mut rng, &mut spots);

    let mut pool: Vec<&str> = APHORISMS.to_vec();
    shuffle(&mut rng, &mut pool);

    spots
        .into_iter()
        .zip(pool)
        .take(count.max(0) as usize)
        .map(|((x, y), text)| Reflection {
            x,
            y,
            text: text.to_string(),
        })
        .collect()
}
