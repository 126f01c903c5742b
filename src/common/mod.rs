// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod error;
pub mod hal_traits;
pub mod timer;
pub mod timing;
pub mod units;

// --- Re-export key types/traits/functions for easier access ---

// From error.rs
pub use error::SonicError;

// From hal_traits.rs
pub use hal_traits::SonicClock;

// From timer.rs
pub use timer::PollTimer;

// From units.rs
pub use units::{echo_pulse_to_raw, raw_to_mm, raw_to_mm_truncated};

// From timing.rs (constants - users can access via common::timing::*)
