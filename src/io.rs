// src/io.rs

//! Driver for the IO (trigger/echo) variant of the Unit Sonic.
//!
//! This variant is electrically an HC-SR04: a 10 µs high pulse on the
//! trigger pin starts a measurement, and the device answers with a pulse
//! on the echo pin whose high time encodes the round-trip flight time.
//! Edge timing belongs to the caller's interrupt layer; the driver only
//! provides the two capture entry points and the tick-driven state
//! machine that turns a captured pulse (or its absence) into a reading.
//!
//! The intended wiring is a shared [`EchoCapture`] in a `static`:
//!
//! ```ignore
//! static ECHO: EchoCapture = EchoCapture::new();
//!
//! // in the echo-pin EXTI/PIO interrupt handler:
//! ECHO.on_rising(micros());   // rising edge
//! ECHO.on_falling(micros());  // falling edge
//!
//! // in the application loop:
//! let mut sonic = SonicIo::new(trig_pin, delay, clock, &ECHO);
//! sonic.init()?;
//! loop {
//!     if sonic.poll()? {
//!         let mm = sonic.distance_mm();
//!     }
//! }
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::common::hal_traits::SonicClock;
use crate::common::timer::PollTimer;
use crate::common::timing::{ECHO_TIMEOUT, TRIG_PULSE_WIDTH_US};
use crate::common::units::{echo_pulse_to_raw, raw_to_mm, raw_to_mm_truncated, MAX_DISTANCE_RAW};
use crate::common::SonicError;

/// Lock-free record of one echo pulse, written from interrupt context and
/// consumed by [`SonicIo::poll`] on the loop thread.
///
/// The edge handlers write `ready` last with `Release` ordering and the
/// poll side reads it first with `Acquire`, so a `true` flag guarantees
/// the pulse width it publishes is fully written — no torn reads even
/// when an edge interrupt preempts `poll` mid-instruction-sequence. Only
/// atomic loads and stores are used (no compare-and-swap), so this works
/// on M0-class cores too.
#[derive(Debug, Default)]
pub struct EchoCapture {
    start_us: AtomicU32,
    pulse_us: AtomicU32,
    ready: AtomicBool,
}

impl EchoCapture {
    /// Creates an empty capture. `const` so it can live in a `static`.
    pub const fn new() -> Self {
        EchoCapture {
            start_us: AtomicU32::new(0),
            pulse_us: AtomicU32::new(0),
            ready: AtomicBool::new(false),
        }
    }

    /// Entry point for the rising edge of the echo pin: records the pulse
    /// start. `now_us` is the caller's microsecond counter, read inside
    /// the interrupt handler. Constant-time and allocation-free.
    pub fn on_rising(&self, now_us: u32) {
        self.start_us.store(now_us, Ordering::Relaxed);
    }

    /// Entry point for the falling edge of the echo pin: publishes the
    /// pulse width. The wrapping subtraction tolerates the microsecond
    /// counter wrapping between the two edges. Constant-time and
    /// allocation-free.
    pub fn on_falling(&self, now_us: u32) {
        let start = self.start_us.load(Ordering::Relaxed);
        self.pulse_us
            .store(now_us.wrapping_sub(start), Ordering::Relaxed);
        // Last write; pairs with the Acquire load in `take`.
        self.ready.store(true, Ordering::Release);
    }

    /// Whether an unconsumed pulse is pending.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Consumes the pending pulse width, if any.
    fn take(&self) -> Option<u32> {
        if !self.ready.load(Ordering::Acquire) {
            return None;
        }
        let pulse = self.pulse_us.load(Ordering::Relaxed);
        self.ready.store(false, Ordering::Relaxed);
        Some(pulse)
    }

    /// Discards any pending pulse.
    fn reset(&self) {
        self.ready.store(false, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Ready to emit a trigger pulse.
    Idle,
    /// Trigger pulse sent; waiting for the echo edges or the timeout.
    Measuring,
}

/// Non-blocking driver for the Unit Sonic IO.
///
/// Call [`poll`](Self::poll) once per loop tick; wire the echo pin's edge
/// interrupts to the shared [`EchoCapture`]. `poll` returns `Ok(true)`
/// exactly once per cycle — either a decoded echo or, after the timeout,
/// the out-of-range sentinel.
#[derive(Debug)]
pub struct SonicIo<'a, TRIG, D, C> {
    trig: TRIG,
    delay: D,
    clock: C,
    capture: &'a EchoCapture,
    state: State,
    timeout: PollTimer,
    /// Latest completed reading in device counts (micrometres).
    raw: u32,
}

impl<'a, TRIG, D, C> SonicIo<'a, TRIG, D, C>
where
    TRIG: OutputPin,
    D: DelayNs,
    C: SonicClock,
{
    /// Creates the driver. The reading starts at the maximum-distance
    /// sentinel until the first measurement completes.
    pub fn new(trig: TRIG, delay: D, clock: C, capture: &'a EchoCapture) -> Self {
        SonicIo {
            trig,
            delay,
            clock,
            capture,
            state: State::Idle,
            timeout: PollTimer::new(),
            raw: MAX_DISTANCE_RAW,
        }
    }

    /// Drives the trigger pin low and resets the state machine and any
    /// pending capture. Call once before the first poll.
    pub fn init(&mut self) -> Result<(), SonicError<TRIG::Error>> {
        self.state = State::Idle;
        self.timeout.stop();
        self.capture.reset();
        self.trig.set_low().map_err(SonicError::Io)?;
        Ok(())
    }

    /// Advances the acquisition state machine by one bounded step.
    ///
    /// - `Idle`: discards any stale capture, emits the 10 µs trigger
    ///   pulse, starts the timeout timer and returns `Ok(false)`.
    /// - `Measuring`, echo captured: decodes the pulse width into a
    ///   distance and returns `Ok(true)`.
    /// - `Measuring`, timeout elapsed with no echo: stores the
    ///   out-of-range sentinel and returns `Ok(true)`.
    /// - `Measuring` otherwise: `Ok(false)`, no side effects; the trigger
    ///   is never re-pulsed mid-cycle.
    pub fn poll(&mut self) -> Result<bool, SonicError<TRIG::Error>> {
        match self.state {
            State::Idle => {
                // Drop any edge pair that landed after the previous cycle
                // was closed out; it belongs to no measurement.
                self.capture.reset();

                self.trig.set_high().map_err(SonicError::Io)?;
                self.delay.delay_us(TRIG_PULSE_WIDTH_US);
                self.trig.set_low().map_err(SonicError::Io)?;

                self.state = State::Measuring;
                self.timeout.start(self.clock.now_ms());
                Ok(false)
            }
            State::Measuring => {
                if let Some(pulse_us) = self.capture.take() {
                    self.raw = echo_pulse_to_raw(pulse_us);
                    self.finish_cycle();
                    return Ok(true);
                }

                if self.timeout.expired(self.clock.now_ms(), ECHO_TIMEOUT) {
                    // No echo came back: the target is out of range.
                    self.raw = MAX_DISTANCE_RAW;
                    self.finish_cycle();
                    return Ok(true);
                }

                Ok(false)
            }
        }
    }

    fn finish_cycle(&mut self) {
        self.timeout.stop();
        self.capture.reset();
        self.state = State::Idle;
    }

    /// One-shot flavour of [`poll`](Self::poll): `WouldBlock` while a
    /// measurement is in flight, the fresh distance in millimetres once
    /// it completes. Usable with `nb::block!`.
    pub fn read_mm(&mut self) -> nb::Result<f32, SonicError<TRIG::Error>> {
        match self.poll() {
            Ok(true) => Ok(self.distance_mm()),
            Ok(false) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    /// Latest completed distance in millimetres, clamped to the maximum
    /// range. Total and side-effect free; returns the sentinel maximum
    /// before the first measurement completes.
    pub fn distance_mm(&self) -> f32 {
        raw_to_mm(self.raw)
    }

    /// Latest completed distance in whole millimetres (truncated), with
    /// the same clamp and staleness semantics as
    /// [`distance_mm`](Self::distance_mm).
    pub fn distance_mm_truncated(&self) -> u16 {
        raw_to_mm_truncated(self.raw)
    }

    /// Whether a measurement is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.state == State::Measuring
    }

    /// The capture record this driver consumes; hand this to the echo
    /// pin's interrupt registration.
    pub fn capture(&self) -> &'a EchoCapture {
        self.capture
    }

    /// Forwards a rising echo edge using the driver's own clock, for
    /// setups where the whole driver is reachable from the interrupt
    /// handler (e.g. inside a critical-section mutex).
    pub fn on_echo_rising(&self) {
        self.capture.on_rising(self.clock.now_us());
    }

    /// Falling-edge counterpart of [`on_echo_rising`](Self::on_echo_rising).
    pub fn on_echo_falling(&self) {
        self.capture.on_falling(self.clock.now_us());
    }

    /// Releases the trigger pin, delay provider and clock.
    pub fn release(self) -> (TRIG, D, C) {
        (self.trig, self.delay, self.clock)
    }
}
