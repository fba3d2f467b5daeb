use std::cell::RefCell;
use wasm_bindgen::prelude::*;

pub mod game;
pub mod storage;
use game::{InputEvent, Session};
use storage::LocalStore;

thread_local! {
    static SESSION: RefCell<Option<Session<LocalStore>>> = RefCell::new(None);
}

fn with_session_mut<R>(f: impl FnOnce(&mut Session<LocalStore>) -> R) -> Result<R, &'static str> {
    SESSION.with(|cell| {
        let mut opt = cell.borrow_mut();
        match opt.as_mut() {
            Some(session) => Ok(f(session)),
            None => Err("session not initialized"),
        }
    })
}

/// Forwards `log` records to the browser console.
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from(format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn install_logger() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

/// Loads the saved voyage (or starts one) and shows the intro screen.
#[wasm_bindgen]
pub fn init_session(now_ms: f64) {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    install_logger();

    let session = Session::load(LocalStore, wall_clock(now_ms));
    SESSION.with(|s| {
        *s.borrow_mut() = Some(session);
    });
}

fn wall_clock(now_ms: f64) -> u64 {
    if now_ms.is_finite() && now_ms > 0.0 {
        now_ms as u64
    } else {
        0
    }
}

/// Runs one animation frame and returns the screen as JSON.
#[wasm_bindgen]
pub fn frame(now_ms: f64, perf_ms: f64) -> String {
    match with_session_mut(|session| {
        let screen = session.frame(wall_clock(now_ms), perf_ms);
        serde_json::to_string(&screen).unwrap_or_else(|_| "{}".to_string())
    }) {
        Ok(v) => v,
        Err(e) => e.to_string(),
    }
}

/// Handles a `keydown`; returns true when the host should `preventDefault`.
#[wasm_bindgen]
pub fn key_down(key: &str, now_ms: f64) -> bool {
    with_session_mut(|session| {
        InputEvent::from_key(key, session.phase())
            .map(|event| session.handle(event, wall_clock(now_ms)))
            .unwrap_or(false)
    })
    .unwrap_or(false)
}

/// Click on the intro's start button.
#[wasm_bindgen]
pub fn click_start(now_ms: f64) -> bool {
    with_session_mut(|session| session.handle(InputEvent::Start, wall_clock(now_ms)))
        .unwrap_or(false)
}
