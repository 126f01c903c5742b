// src/common/timing.rs

use core::time::Duration;

// Nominal values from the vendor driver; no datasheet exists for the
// RCWL-9620, so these were reverse-engineered from its reference code.

// === Range limits ===

/// Farthest distance the chip can report, in millimetres. Doubles as the
/// sentinel reading for "no echo / out of range".
pub const MAX_DISTANCE_MM: u16 = 4500;
/// Smallest distance the chip is expected to resolve, in millimetres.
/// Advisory only; readings below this are passed through unmodified.
pub const MIN_DISTANCE_MM: u16 = 20;

// === I2C variant ===

/// Time the chip needs between the trigger command and the result
/// becoming readable over the bus.
pub const I2C_SETTLING_TIME: Duration = Duration::from_millis(120);
/// Vendor command byte that starts a measurement.
pub const I2C_TRIGGER_COMMAND: u8 = 0x01;
/// Factory-default 7-bit bus address of the I2C variant.
pub const I2C_DEFAULT_ADDRESS: u8 = 0x57;

// === IO variant ===

/// Width of the high pulse on the trigger pin that starts a measurement.
pub const TRIG_PULSE_WIDTH_US: u32 = 10;
/// Upper bound on the wait for an echo edge pair. Covers the round-trip
/// flight time of the maximum range with margin; past this the target is
/// out of range.
pub const ECHO_TIMEOUT: Duration = Duration::from_millis(120);
/// Sound travels 343 µm in 1 µs (at ~20 °C; the chip does not compensate
/// for temperature and neither do we).
pub const SPEED_OF_SOUND_UM_PER_US: u32 = 343;
