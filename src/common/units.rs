// src/common/units.rs

//! Conversions between device-native counts and millimetres.
//!
//! Both transport variants happen to report in thousandths of a
//! millimetre: the I2C chip returns a 24-bit count scaled that way, and
//! the IO variant's echo pulse converts to micrometres. The acquisition
//! state machines store those raw counts untouched; clamping to the
//! device's maximum range happens here, and only here, so every public
//! accessor applies exactly the same policy.

use super::timing::{MAX_DISTANCE_MM, SPEED_OF_SOUND_UM_PER_US};

/// Raw device counts per millimetre.
pub const RAW_PER_MM: u32 = 1000;

/// Sentinel raw reading: the maximum range in device counts. Used as the
/// initial value before any measurement completes and as the substitute
/// for a timed-out (out-of-range) cycle.
pub const MAX_DISTANCE_RAW: u32 = MAX_DISTANCE_MM as u32 * RAW_PER_MM;

/// Converts raw device counts to millimetres, clamped to the maximum
/// measurable range.
pub fn raw_to_mm(raw: u32) -> f32 {
    let mm = raw as f32 / RAW_PER_MM as f32;
    mm.min(MAX_DISTANCE_MM as f32)
}

/// Converts raw device counts to whole millimetres (truncating), clamped
/// to the maximum measurable range.
pub fn raw_to_mm_truncated(raw: u32) -> u16 {
    let mm = raw / RAW_PER_MM;
    if mm > MAX_DISTANCE_MM as u32 {
        MAX_DISTANCE_MM
    } else {
        mm as u16
    }
}

/// Converts an echo pulse width in microseconds to raw device counts
/// (micrometres of target distance).
///
/// The pulse spans the out-and-back flight, so half of it corresponds to
/// the target distance. Saturating multiply: a pathological pulse width
/// clamps instead of wrapping, and the clamp in the accessors then caps
/// it at the maximum range.
pub fn echo_pulse_to_raw(pulse_us: u32) -> u32 {
    pulse_us.saturating_mul(SPEED_OF_SOUND_UM_PER_US) / 2
}
