//! Save slot codec.
//!
//! Encoding is a straight serde dump of the voyage. Decoding is lenient: the
//! payload is walked as a `serde_json::Value` and every field is validated on
//! its own, so one bad field is replaced instead of losing the whole voyage.
//! Only a payload with no usable seed is rejected outright.

use crate::game::config::VoyageConfig;
use crate::game::map::find_water_start;
use crate::game::reflections::{is_known_aphorism, Reflection};
use crate::game::voyage::{Heading, Voyage};
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save payload is not valid JSON: {0}")]
    Unparseable(#[source] serde_json::Error),
    #[error("save payload is not an object")]
    NotAnObject,
    #[error("save payload has no usable seed")]
    MissingSeed,
    #[error("could not encode save: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A field that failed validation and what was done about it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Repair {
    #[error("`{0}` missing or malformed, using default")]
    Defaulted(&'static str),
    #[error("`{0}` out of range, clamped")]
    Clamped(&'static str),
    #[error("boat was on land, moved to the start point")]
    BoatRelocated,
    #[error("dropped reflection #{index}: {reason}")]
    DroppedReflection { index: usize, reason: &'static str },
    #[error("no reflections left, placed a fresh set")]
    ReflectionsRegenerated,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoatRecord {
    x: usize,
    y: usize,
    heading: Heading,
    anchored: bool,
}

#[derive(Serialize)]
struct ReflectionRecord<'a> {
    x: usize,
    y: usize,
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveRecord<'a> {
    seed: u32,
    boat: BoatRecord,
    boat_due_ms: u64,
    weather_due_ms: u64,
    front_offset: usize,
    reflections: Vec<ReflectionRecord<'a>>,
    found: u32,
    total: u32,
    aphorism: Option<&'a str>,
    aphorism_visible: bool,
}

pub fn encode(voyage: &Voyage) -> Result<String, SaveError> {
    let boat = voyage.boat();
    let record = SaveRecord {
        seed: voyage.seed(),
        boat: BoatRecord {
            x: boat.x,
            y: boat.y,
            heading: boat.heading,
            anchored: boat.anchored,
        },
        boat_due_ms: voyage.boat_due_ms(),
        weather_due_ms: voyage.weather_due_ms(),
        front_offset: voyage.front_offset(),
        reflections: voyage
            .reflections()
            .iter()
            .map(|r| ReflectionRecord {
                x: r.x,
                y: r.y,
                text: &r.text,
            })
            .collect(),
        found: voyage.found(),
        total: voyage.total(),
        aphorism: voyage.aphorism.as_deref(),
        aphorism_visible: voyage.aphorism_visible,
    };
    serde_json::to_string(&record).map_err(SaveError::Encode)
}

pub struct Restored {
    pub voyage: Voyage,
    pub repairs: Vec<Repair>,
}

/// Integers, including whole floats written by a JavaScript host.
fn as_whole(value: &Value) -> Option<i64> {
    if let Some(v) = value.as_i64() {
        return Some(v);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

fn coord(value: Option<&Value>, limit: usize) -> Option<usize> {
    let v = as_whole(value?)?;
    if v >= 0 && (v as u64) < limit as u64 {
        Some(v as usize)
    } else {
        None
    }
}

pub fn decode(raw: &str, now_ms: u64, config: VoyageConfig) -> Result<Restored, SaveError> {
    let parsed: Value = serde_json::from_str(raw).map_err(SaveError::Unparseable)?;
    let obj = parsed.as_object().ok_or(SaveError::NotAnObject)?;
    let seed = obj
        .get("seed")
        .and_then(as_whole)
        .and_then(|s| u32::try_from(s).ok())
        .ok_or(SaveError::MissingSeed)?;

    let mut voyage = Voyage::with_config(seed, now_ms, config);
    let mut repairs = Vec::new();

    restore_boat(&mut voyage, obj.get("boat"), &mut repairs);
    restore_schedule(&mut voyage, obj, now_ms, &mut repairs);
    restore_reflections(&mut voyage, obj, &mut repairs);
    restore_aphorism(&mut voyage, obj, &mut repairs);

    for repair in &repairs {
        warn!("save repaired: {}", repair);
    }
    Ok(Restored { voyage, repairs })
}

fn restore_boat(voyage: &mut Voyage, boat: Option<&Value>, repairs: &mut Vec<Repair>) {
    let Some(boat) = boat.and_then(Value::as_object) else {
        repairs.push(Repair::Defaulted("boat"));
        return;
    };
    let width = voyage.grid.width();
    let height = voyage.grid.height();

    for (key, field, limit, slot) in [
        ("boat.x", "x", width, &mut voyage.boat.x),
        ("boat.y", "y", height, &mut voyage.boat.y),
    ] {
        match boat.get(field).and_then(as_whole) {
            Some(v) if v >= 0 && (v as u64) < limit as u64 => *slot = v as usize,
            Some(v) => {
                *slot = v.clamp(0, limit.saturating_sub(1) as i64) as usize;
                repairs.push(Repair::Clamped(key));
            }
            None => repairs.push(Repair::Defaulted(key)),
        }
    }

    match boat.get("heading").and_then(Value::as_str).and_then(Heading::from_label) {
        Some(h) => voyage.boat.heading = h,
        None => repairs.push(Repair::Defaulted("boat.heading")),
    }
    match boat.get("anchored").and_then(Value::as_bool) {
        Some(a) => voyage.boat.anchored = a,
        None => repairs.push(Repair::Defaulted("boat.anchored")),
    }

    if !voyage.grid.is_water(voyage.boat.x, voyage.boat.y) {
        let (x, y) = find_water_start(&voyage.grid);
        voyage.boat.x = x;
        voyage.boat.y = y;
        repairs.push(Repair::BoatRelocated);
    }
}

fn restore_schedule(
    voyage: &mut Voyage,
    obj: &Map<String, Value>,
    now_ms: u64,
    repairs: &mut Vec<Repair>,
) {
    let width = voyage.grid.width().max(1);
    match obj.get("frontOffset").and_then(as_whole) {
        Some(v) if v >= 0 && (v as u64) < width as u64 => voyage.front_offset = v as usize,
        Some(v) => {
            voyage.front_offset = v.rem_euclid(width as i64) as usize;
            repairs.push(Repair::Clamped("frontOffset"));
        }
        None => repairs.push(Repair::Defaulted("frontOffset")),
    }

    // A due time past one full interval from now means the clock moved backwards.
    let boat_latest = now_ms + voyage.config.clear_step_ms.max(voyage.config.front_step_ms);
    let weather_latest = now_ms + voyage.config.weather.step_ms.max(1);
    for (key, latest, slot) in [
        ("boatDueMs", boat_latest, &mut voyage.boat_due_ms),
        ("weatherDueMs", weather_latest, &mut voyage.weather_due_ms),
    ] {
        match obj.get(key).and_then(as_whole) {
            Some(v) if v >= 0 && (v as u64) <= latest => *slot = v as u64,
            Some(_) => {
                *slot = latest;
                repairs.push(Repair::Clamped(key));
            }
            None => repairs.push(Repair::Defaulted(key)),
        }
    }
}

fn restore_reflections(voyage: &mut Voyage, obj: &Map<String, Value>, repairs: &mut Vec<Repair>) {
    let entries: &[Value] = match obj.get("reflections").and_then(Value::as_array) {
        Some(entries) => entries.as_slice(),
        None => {
            repairs.push(Repair::Defaulted("reflections"));
            &[]
        }
    };

    let mut kept = Vec::with_capacity(entries.len());
    let mut spots = HashSet::new();
    let mut texts = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        match validate_reflection(voyage, entry, &spots, &texts) {
            Ok(reflection) => {
                spots.insert((reflection.x, reflection.y));
                texts.insert(reflection.text.clone());
                kept.push(reflection);
            }
            Err(reason) => repairs.push(Repair::DroppedReflection { index, reason }),
        }
    }
    voyage.reflections = kept;

    let found = obj.get("found").and_then(as_whole);
    let total = obj.get("total").and_then(as_whole);
    voyage.found = match found {
        Some(v) if v >= 0 => v.min(i64::from(u32::MAX)) as u32,
        _ => {
            repairs.push(Repair::Defaulted("found"));
            0
        }
    };
    let floor = voyage.found.saturating_add(voyage.reflections.len() as u32);
    voyage.total = match total {
        Some(v) if v >= i64::from(floor) => v.min(i64::from(u32::MAX)) as u32,
        Some(_) => {
            repairs.push(Repair::Clamped("total"));
            floor
        }
        None => {
            repairs.push(Repair::Defaulted("total"));
            floor
        }
    };

    if voyage.ensure_reflections() {
        repairs.push(Repair::ReflectionsRegenerated);
    }
}

fn validate_reflection(
    voyage: &Voyage,
    entry: &Value,
    spots: &HashSet<(usize, usize)>,
    texts: &HashSet<String>,
) -> Result<Reflection, &'static str> {
    let entry = entry.as_object().ok_or("not an object")?;
    let x = coord(entry.get("x"), voyage.grid.width()).ok_or("x out of range")?;
    let y = coord(entry.get("y"), voyage.grid.height()).ok_or("y out of range")?;
    let text = entry.get("text").and_then(Value::as_str).ok_or("missing text")?;
    if !voyage.grid.is_water(x, y) {
        return Err("on land");
    }
    if !is_known_aphorism(text) {
        return Err("unknown aphorism");
    }
    if spots.contains(&(x, y)) {
        return Err("duplicate position");
    }
    if texts.contains(text) {
        return Err("duplicate aphorism");
    }
    Ok(Reflection {
        x,
        y,
        text: text.to_string(),
    })
}

fn restore_aphorism(voyage: &mut Voyage, obj: &Map<String, Value>, repairs: &mut Vec<Repair>) {
    voyage.aphorism = match obj.get("aphorism") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) if is_known_aphorism(text) => Some(text.clone()),
        Some(_) => {
            repairs.push(Repair::Defaulted("aphorism"));
            None
        }
    };
    let visible = obj
        .get("aphorismVisible")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    voyage.aphorism_visible = visible && voyage.aphorism.is_some();
}

/// Restores the saved voyage, or starts a new one with a time-derived seed
/// when there is nothing usable.
pub fn load_or_new(raw: Option<&str>, now_ms: u64, config: VoyageConfig) -> Voyage {
    let Some(raw) = raw else {
        return Voyage::with_config(time_seed(now_ms), now_ms, config);
    };
    match decode(raw, now_ms, config.clone()) {
        Ok(restored) => restored.voyage,
        Err(err) => {
            warn!("discarding save: {}", err);
            Voyage::with_config(time_seed(now_ms), now_ms, config)
        }
    }
}

pub fn time_seed(now_ms: u64) -> u32 {
    (now_ms % 1_000_000_000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::Cell;
    use crate::game::reflections::APHORISMS;

    const NOW: u64 = 1_700_000_000_000;

    fn saved(voyage: &Voyage) -> Value {
        serde_json::from_str(&encode(voyage).unwrap()).unwrap()
    }

    fn restore(payload: &Value) -> Restored {
        restore_at(payload, NOW)
    }

    fn restore_at(payload: &Value, now: u64) -> Restored {
        decode(&payload.to_string(), now, VoyageConfig::default()).unwrap()
    }

    #[test]
    fn encoded_record_uses_flat_camel_case_fields() {
        let voyage = Voyage::new(42, NOW);
        let value = saved(&voyage);
        assert_eq!(value["seed"], 42);
        assert_eq!(value["boat"]["heading"], "E");
        assert_eq!(value["boat"]["anchored"], false);
        assert!(value["boatDueMs"].is_u64());
        assert!(value["weatherDueMs"].is_u64());
        assert_eq!(value["frontOffset"], 0);
        assert_eq!(value["found"], 0);
        assert!(value["aphorism"].is_null());
        assert_eq!(value["aphorismVisible"], false);
    }

    #[test]
    fn clean_save_restores_without_repairs() {
        let later = NOW + 20 * 60_000;
        let mut voyage = Voyage::new(42, NOW);
        voyage.advance(later);
        voyage.steer(Heading::S);
        voyage.toggle_anchor();

        let restored = restore_at(&saved(&voyage), later);
        assert!(restored.repairs.is_empty(), "{:?}", restored.repairs);
        let back = restored.voyage;
        assert_eq!(back.boat(), voyage.boat());
        assert_eq!(back.front_offset(), voyage.front_offset());
        assert_eq!(back.boat_due_ms(), voyage.boat_due_ms());
        assert_eq!(back.weather_due_ms(), voyage.weather_due_ms());
        assert_eq!(back.reflections(), voyage.reflections());
        assert_eq!((back.found(), back.total()), (voyage.found(), voyage.total()));
    }

    #[test]
    fn out_of_range_marker_is_dropped() {
        let voyage = Voyage::new(42, NOW);
        let mut payload = saved(&voyage);
        payload["reflections"][0]["x"] = Value::from(-1);

        let restored = restore(&payload);
        assert!(restored.repairs.contains(&Repair::DroppedReflection {
            index: 0,
            reason: "x out of range"
        }));
        assert_eq!(
            restored.voyage.reflections().len(),
            voyage.reflections().len() - 1
        );
    }

    #[test]
    fn lone_bad_marker_triggers_regeneration() {
        let voyage = Voyage::new(42, NOW);
        let mut payload = saved(&voyage);
        payload["reflections"] = serde_json::json!([{ "x": -1, "y": 3, "text": APHORISMS[0] }]);
        payload["found"] = Value::from(3);
        payload["total"] = Value::from(4);

        let restored = restore(&payload);
        assert!(restored.repairs.contains(&Repair::ReflectionsRegenerated));
        let back = restored.voyage;
        assert_eq!(back.found(), 0);
        assert!((5..=8).contains(&back.total()));
        assert_eq!(back.total() as usize, back.reflections().len());
        let boat = (back.boat().x, back.boat().y);
        assert!(back.reflections().iter().all(|r| (r.x, r.y) != boat));
    }

    #[test]
    fn markers_on_land_unknown_or_duplicated_are_filtered() {
        let voyage = Voyage::new(42, NOW);
        let (lx, ly) = (0..voyage.grid().height())
            .flat_map(|y| (0..voyage.grid().width()).map(move |x| (x, y)))
            .find(|&(x, y)| voyage.grid().get(x, y) == Some(Cell::Land))
            .unwrap();
        let good = &voyage.reflections()[0];
        let mut payload = saved(&voyage);
        payload["reflections"] = serde_json::json!([
            { "x": good.x, "y": good.y, "text": good.text },
            { "x": lx, "y": ly, "text": APHORISMS[15] },
            { "x": good.x, "y": good.y, "text": APHORISMS[14] },
            { "x": 0, "y": 0, "text": "made up" },
            "junk",
        ]);

        let back = restore(&payload).voyage;
        assert_eq!(back.reflections().len(), 1);
        assert_eq!(&back.reflections()[0], good);
    }

    #[test]
    fn wrong_types_fall_back_field_by_field() {
        let voyage = Voyage::new(42, NOW);
        let mut payload = saved(&voyage);
        payload["boat"]["heading"] = Value::from("NE");
        payload["boat"]["anchored"] = Value::from("yes");
        payload["frontOffset"] = Value::from("far");
        payload["found"] = Value::from(true);

        let restored = restore(&payload);
        let back = &restored.voyage;
        assert_eq!(back.boat().heading, Heading::E);
        assert!(!back.boat().anchored);
        assert_eq!(back.front_offset(), 0);
        assert_eq!(back.reflections(), voyage.reflections());
        assert!(restored.repairs.contains(&Repair::Defaulted("boat.heading")));
        assert!(restored.repairs.contains(&Repair::Defaulted("found")));
    }

    #[test]
    fn boat_on_land_is_relocated() {
        let voyage = Voyage::new(42, NOW);
        let (lx, ly) = (0..voyage.grid().height())
            .flat_map(|y| (0..voyage.grid().width()).map(move |x| (x, y)))
            .find(|&(x, y)| voyage.grid().get(x, y) == Some(Cell::Land))
            .unwrap();
        let mut payload = saved(&voyage);
        payload["boat"]["x"] = Value::from(lx);
        payload["boat"]["y"] = Value::from(ly);

        let restored = restore(&payload);
        assert!(restored.repairs.contains(&Repair::BoatRelocated));
        let boat = restored.voyage.boat().clone();
        assert!(restored.voyage.grid().is_water(boat.x, boat.y));
    }

    #[test]
    fn out_of_bounds_boat_is_clamped_onto_the_grid() {
        let voyage = Voyage::new(42, NOW);
        let mut payload = saved(&voyage);
        payload["boat"]["x"] = Value::from(10_000);
        payload["boat"]["y"] = Value::from(-4);

        let restored = restore(&payload);
        assert!(restored.repairs.contains(&Repair::Clamped("boat.x")));
        assert!(restored.repairs.contains(&Repair::Clamped("boat.y")));
        let boat = restored.voyage.boat();
        assert!(boat.x < 160 && boat.y < 45);
        assert!(restored.voyage.grid().is_water(boat.x, boat.y));
    }

    #[test]
    fn future_due_times_are_pulled_back() {
        let voyage = Voyage::new(42, NOW);
        let mut payload = saved(&voyage);
        payload["boatDueMs"] = Value::from(NOW + 10_000_000);
        payload["weatherDueMs"] = Value::from(NOW + 10_000_000);

        let back = restore(&payload).voyage;
        assert!(back.boat_due_ms() <= NOW + 30_000);
        assert!(back.weather_due_ms() <= NOW + 60_000);
    }

    #[test]
    fn whole_floats_from_javascript_are_accepted() {
        let voyage = Voyage::new(42, NOW);
        let mut payload = saved(&voyage);
        payload["seed"] = Value::from(42.0);
        payload["frontOffset"] = Value::from(7.0);
        let restored = restore(&payload);
        assert_eq!(restored.voyage.seed(), 42);
        assert_eq!(restored.voyage.front_offset(), 7);
    }

    #[test]
    fn unusable_payloads_are_rejected() {
        let cfg = VoyageConfig::default;
        assert!(matches!(
            decode("{not json", NOW, cfg()),
            Err(SaveError::Unparseable(_))
        ));
        assert!(matches!(decode("[1,2]", NOW, cfg()), Err(SaveError::NotAnObject)));
        assert!(matches!(
            decode(r#"{"seed":"abc"}"#, NOW, cfg()),
            Err(SaveError::MissingSeed)
        ));
        assert!(matches!(
            decode(r#"{"seed":-5}"#, NOW, cfg()),
            Err(SaveError::MissingSeed)
        ));
    }

    #[test]
    fn seed_only_payload_restores_a_playable_voyage() {
        let restored = decode(r#"{"seed":42}"#, NOW, VoyageConfig::default()).unwrap();
        let fresh = Voyage::new(42, NOW);
        assert_eq!(restored.voyage.boat(), fresh.boat());
        assert!(!restored.voyage.reflections().is_empty());
        assert!(restored.repairs.contains(&Repair::Defaulted("boat")));
    }

    #[test]
    fn garbage_falls_back_to_a_time_seeded_voyage() {
        let voyage = load_or_new(Some("garbage"), NOW, VoyageConfig::default());
        assert_eq!(voyage.seed(), time_seed(NOW));
        let fresh = load_or_new(None, NOW + 5, VoyageConfig::default());
        assert_eq!(fresh.seed(), time_seed(NOW + 5));
    }
}
