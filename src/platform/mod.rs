//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (keyboard state, scripted input for headless runs)
//! - Page chrome (dialog box and crash overlay)
//! - Wall-clock time

pub mod chrome;
pub mod input;

pub use chrome::{Chrome, LogChrome};
pub use input::{Control, InputSource, KeyboardState, ScriptedInput};

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
