//! A platform-agnostic driver for the M5Stack Unit Sonic ultrasonic
//! range-finder, in both of its physical variants:
//!
//! - **Unit Sonic I2C** ([`i2c::SonicI2c`]): register-polled transport.
//!   A single vendor command byte triggers a measurement; after a fixed
//!   settling time the result is read back as a 24-bit big-endian count.
//! - **Unit Sonic IO** ([`io::SonicIo`]): HC-SR04-style trigger/echo
//!   transport. A 10 µs trigger pulse starts a measurement; the echo
//!   pulse width is captured by the caller's edge interrupts through an
//!   [`io::EchoCapture`].
//!
//! Both drivers are built around the same non-blocking acquisition state
//! machine: call `poll()` once per loop tick, and read the last completed
//! distance at any time. No call ever blocks beyond one bounded unit of
//! bus or pin work, so the drivers fit cooperative schedulers that the
//! usual sleep/spin-wait ultrasonic drivers cannot share a thread with.
//!
//! Bus, pin and delay access goes through [`embedded-hal`] 1.0 traits;
//! the monotonic clock is the crate's own [`SonicClock`] trait.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![no_std]

pub mod common;
pub mod i2c;
pub mod io;

// Re-export key types for convenience
pub use common::hal_traits::SonicClock;
pub use common::SonicError;
pub use i2c::{I2cConfig, SonicI2c};
pub use io::{EchoCapture, SonicIo};
