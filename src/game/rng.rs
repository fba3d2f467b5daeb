/// Seeded 32-bit generator used for every piece of procedural content.
///
/// Output is a pure function of the seed, so a voyage can be rebuilt from the
/// seed alone after a reload.
#[derive(Clone, Debug)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seeds a generator for one purpose (islands, weather, reflections) so
    /// the streams stay decorrelated while sharing the voyage seed.
    pub fn for_purpose(tag: &str, seed: u32) -> Self {
        Self::new(purpose_seed(tag, seed))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let t = self.state;
        let mut x = (t ^ (t >> 15)).wrapping_mul(t | 1);
        x ^= x.wrapping_add((x ^ (x >> 7)).wrapping_mul(x | 61));
        x ^ (x >> 14)
    }

    /// Uniform float in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

/// FNV-1a over UTF-16 code units.
pub fn hash_seed_str(s: &str) -> u32 {
    const FNV_OFFSET: u32 = 2_166_136_261;
    const FNV_PRIME: u32 = 16_777_619;
    let mut hash = FNV_OFFSET;
    for unit in s.encode_utf16() {
        hash = (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME);
    }
    hash
}

pub fn purpose_seed(tag: &str, seed: u32) -> u32 {
    hash_seed_str(&format!("{}{}", tag, seed))
}

/// Inclusive-uniform integer in `min..=max`.
pub fn random_int(rng: &mut Mulberry32, min: i32, max: i32) -> i32 {
    let span = f64::from(max) - f64::from(min) + 1.0;
    (rng.next_f64() * span).floor() as i32 + min
}

/// Fisher-Yates, walking down from the last index.
pub fn shuffle<T>(rng: &mut Mulberry32, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = random_int(rng, 0, i as i32) as usize;
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Mulberry32::new(42);
        let mut b = Mulberry32::new(42);
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn floats_stay_in_unit_interval() {
        let mut rng = Mulberry32::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn fnv_matches_reference_values() {
        assert_eq!(hash_seed_str(""), 2_166_136_261);
        assert_eq!(hash_seed_str("a"), 0xe40c_292c);
        assert_eq!(hash_seed_str("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn purpose_tags_decorrelate_streams() {
        let mut islands = Mulberry32::for_purpose("", 42);
        let mut weather = Mulberry32::for_purpose("weather:", 42);
        let a: Vec<u32> = (0..8).map(|_| islands.next_u32()).collect();
        let b: Vec<u32> = (0..8).map(|_| weather.next_u32()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn random_int_covers_inclusive_bounds() {
        let mut rng = Mulberry32::new(99);
        let mut seen = [false; 4];
        for _ in 0..1_000 {
            let v = random_int(&mut rng, -1, 2);
            assert!((-1..=2).contains(&v));
            seen[(v + 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn shuffle_is_a_deterministic_permutation() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        shuffle(&mut Mulberry32::new(5), &mut a);
        shuffle(&mut Mulberry32::new(5), &mut b);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }
}
