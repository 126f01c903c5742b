// src/i2c.rs

//! Driver for the I2C variant of the Unit Sonic.
//!
//! The chip has no documented register map; the vendor protocol is a
//! single trigger command byte, a 120 ms conversion wait, then a 3-byte
//! big-endian read of the distance in thousandths of a millimetre.
//! [`SonicI2c::poll`] turns that into a two-state machine driven from the
//! caller's loop, so the conversion wait never blocks anything.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, SevenBitAddress};

use crate::common::hal_traits::SonicClock;
use crate::common::timer::PollTimer;
use crate::common::timing::{
    I2C_DEFAULT_ADDRESS, I2C_SETTLING_TIME, I2C_TRIGGER_COMMAND,
};
use crate::common::units::{raw_to_mm, raw_to_mm_truncated, MAX_DISTANCE_RAW};
use crate::common::SonicError;

/// Bus-level configuration for [`SonicI2c`].
///
/// Pin selection and bus speed belong to the HAL's I2C construction and
/// are not repeated here; the only per-device choice is the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cConfig {
    /// 7-bit device address.
    pub address: SevenBitAddress,
}

impl Default for I2cConfig {
    fn default() -> Self {
        I2cConfig {
            address: I2C_DEFAULT_ADDRESS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Ready to trigger a new measurement.
    Idle,
    /// Trigger command sent; waiting out the conversion time.
    Measuring,
}

/// Non-blocking driver for the Unit Sonic I2C.
///
/// Call [`poll`](Self::poll) once per loop tick. It returns `Ok(true)`
/// exactly once per completed measurement; the accessors return the last
/// completed reading at any time, including mid-measurement.
#[derive(Debug)]
pub struct SonicI2c<I2C, C> {
    i2c: I2C,
    clock: C,
    address: SevenBitAddress,
    state: State,
    timer: PollTimer,
    /// Latest completed reading in device counts (thousandths of a mm).
    raw: u32,
    detected: bool,
}

impl<I2C, C> SonicI2c<I2C, C>
where
    I2C: I2c,
    C: SonicClock,
{
    /// Creates the driver. The reading starts at the maximum-distance
    /// sentinel until the first measurement completes.
    pub fn new(i2c: I2C, clock: C, config: I2cConfig) -> Self {
        SonicI2c {
            i2c,
            clock,
            address: config.address,
            state: State::Idle,
            timer: PollTimer::new(),
            raw: MAX_DISTANCE_RAW,
            detected: false,
        }
    }

    /// Probes the bus for the device and resets the state machine.
    ///
    /// A zero-length write serves as the probe; an address NACK yields
    /// [`SonicError::NotDetected`]. That error is non-fatal — the driver
    /// can still be polled, it will just keep addressing a device that
    /// never answers. Any other bus fault is surfaced as
    /// [`SonicError::Io`].
    pub fn init(&mut self) -> Result<(), SonicError<I2C::Error>> {
        self.state = State::Idle;
        self.timer.stop();
        self.detected = false;

        match self.i2c.write(self.address, &[]) {
            Ok(()) => {
                self.detected = true;
                Ok(())
            }
            Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => {
                Err(SonicError::NotDetected)
            }
            Err(e) => Err(SonicError::Io(e)),
        }
    }

    /// Advances the acquisition state machine by one bounded step.
    ///
    /// - `Idle`: sends the trigger command, starts the settling timer and
    ///   returns `Ok(false)`. A failed trigger write leaves the state
    ///   `Idle`, so the next tick retries.
    /// - `Measuring`, settling time not yet elapsed: returns `Ok(false)`
    ///   with no bus traffic. The trigger is never re-issued mid-cycle.
    /// - `Measuring`, settling time elapsed: reads the 3-byte result,
    ///   stores it and returns `Ok(true)`. A failed read still consumes
    ///   the cycle (the machine re-arms) and the previous reading stays
    ///   in place.
    pub fn poll(&mut self) -> Result<bool, SonicError<I2C::Error>> {
        match self.state {
            State::Idle => {
                self.i2c
                    .write(self.address, &[I2C_TRIGGER_COMMAND])
                    .map_err(SonicError::Io)?;
                self.state = State::Measuring;
                self.timer.start(self.clock.now_ms());
                Ok(false)
            }
            State::Measuring => {
                if !self.timer.expired(self.clock.now_ms(), I2C_SETTLING_TIME) {
                    return Ok(false);
                }

                // Zeroed defensively: on a partial read we decode zeros
                // rather than stack garbage.
                let mut payload = [0u8; 3];
                let result = self.i2c.read(self.address, &mut payload);

                self.timer.stop();
                self.state = State::Idle;
                result.map_err(SonicError::Io)?;

                self.raw = u32::from_be_bytes([0, payload[0], payload[1], payload[2]]);
                Ok(true)
            }
        }
    }

    /// One-shot flavour of [`poll`](Self::poll): `WouldBlock` while a
    /// measurement is in flight, the fresh distance in millimetres once
    /// it completes. Usable with `nb::block!`.
    pub fn read_mm(&mut self) -> nb::Result<f32, SonicError<I2C::Error>> {
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

    /// Whether the device acknowledged the probe at the last
    /// [`init`](Self::init).
    pub fn is_detected(&self) -> bool {
        self.detected
    }

    /// Releases the bus and clock.
    pub fn release(self) -> (I2C, C) {
        (self.i2c, self.clock)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embedded_hal::i2c::{NoAcknowledgeSource, Operation};

    // --- Mocks ---

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct MockBusError(ErrorKind);

    impl embedded_hal::i2c::Error for MockBusError {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    const NACK: MockBusError =
        MockBusError(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
    const BUS_FAULT: MockBusError = MockBusError(ErrorKind::Other);

    struct MockBus {
        ack: bool,
        fail_reads: bool,
        payload: [u8; 3],
        probe_count: usize,
        trigger_count: usize,
        last_command: Option<u8>,
        read_count: usize,
    }

    impl MockBus {
        fn new() -> Self {
            MockBus {
                ack: true,
                fail_reads: false,
                payload: [0; 3],
                probe_count: 0,
                trigger_count: 0,
                last_command: None,
                read_count: 0,
            }
        }
    }

    impl embedded_hal::i2c::ErrorType for MockBus {
        type Error = MockBusError;
    }

    impl I2c for MockBus {
        fn transaction(
            &mut self,
            _address: SevenBitAddress,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if !self.ack {
                return Err(NACK);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        if bytes.is_empty() {
                            self.probe_count += 1;
                        } else {
                            self.trigger_count += 1;
                            self.last_command = Some(bytes[0]);
                        }
                    }
                    Operation::Read(buffer) => {
                        if self.fail_reads {
                            return Err(BUS_FAULT);
                        }
                        self.read_count += 1;
                        let n = buffer.len().min(self.payload.len());
                        buffer[..n].copy_from_slice(&self.payload[..n]);
                    }
                }
            }
            Ok(())
        }
    }

    struct MockClock {
        ms: Cell<u32>,
    }

    impl MockClock {
        fn new() -> Self {
            MockClock { ms: Cell::new(0) }
        }

        fn advance_ms(&self, ms: u32) {
            self.ms.set(self.ms.get().wrapping_add(ms));
        }
    }

    impl SonicClock for MockClock {
        fn now_ms(&self) -> u32 {
            self.ms.get()
        }

        fn now_us(&self) -> u32 {
            self.ms.get().wrapping_mul(1000)
        }
    }

    // --- Tests ---

    #[test]
    fn init_probes_and_latches_detection() {
        let clock = MockClock::new();
        let mut bus = MockBus::new();
        let mut sonic = SonicI2c::new(&mut bus, &clock, I2cConfig::default());

        assert!(!sonic.is_detected());
        sonic.init().unwrap();
        assert!(sonic.is_detected());
        assert!(!sonic.is_busy());

        drop(sonic);
        assert_eq!(bus.probe_count, 1);
        assert_eq!(bus.trigger_count, 0);
    }

    #[test]
    fn init_nack_reports_not_detected() {
        let clock = MockClock::new();
        let mut bus = MockBus::new();
        bus.ack = false;
        let mut sonic = SonicI2c::new(&mut bus, &clock, I2cConfig::default());

        assert!(matches!(sonic.init(), Err(SonicError::NotDetected)));
        assert!(!sonic.is_detected());

        // Driver stays usable: polling still attempts the trigger.
        assert!(matches!(sonic.poll(), Err(SonicError::Io(_))));
        assert!(!sonic.is_busy());
    }

    #[test]
    fn full_measurement_cycle() {
        let clock = MockClock::new();
        let mut bus = MockBus::new();
        bus.payload = [0x00, 0x0B, 0xB8]; // 3000 counts = 3 mm
        let mut sonic = SonicI2c::new(&mut bus, &clock, I2cConfig::default());
        sonic.init().unwrap();

        // Sentinel reading before any measurement completes.
        assert_eq!(sonic.distance_mm(), 4500.0);
        assert_eq!(sonic.distance_mm_truncated(), 4500);

        // First poll triggers and starts the settling timer.
        assert_eq!(sonic.poll().unwrap(), false);
        assert!(sonic.is_busy());

        // Settling time not yet elapsed: no completion, reading unchanged.
        clock.advance_ms(60);
        assert_eq!(sonic.poll().unwrap(), false);
        assert_eq!(sonic.distance_mm(), 4500.0);

        // Exactly the settling time: strict comparison, still waiting.
        clock.advance_ms(60);
        assert_eq!(sonic.poll().unwrap(), false);

        clock.advance_ms(1);
        assert_eq!(sonic.poll().unwrap(), true);
        assert!(!sonic.is_busy());
        assert_eq!(sonic.distance_mm(), 3.0);
        assert_eq!(sonic.distance_mm_truncated(), 3);

        // Accessors are idempotent between completions.
        assert_eq!(sonic.distance_mm(), 3.0);

        drop(sonic);
        // One probe, one trigger for the whole cycle: the repeated polls
        // while measuring generated no bus traffic.
        assert_eq!(bus.probe_count, 1);
        assert_eq!(bus.trigger_count, 1);
        assert_eq!(bus.last_command, Some(I2C_TRIGGER_COMMAND));
        assert_eq!(bus.read_count, 1);
    }

    #[test]
    fn next_poll_after_completion_retriggers() {
        let clock = MockClock::new();
        let mut bus = MockBus::new();
        bus.payload = [0x00, 0x0B, 0xB8];
        let mut sonic = SonicI2c::new(&mut bus, &clock, I2cConfig::default());
        sonic.init().unwrap();

        assert_eq!(sonic.poll().unwrap(), false);
        clock.advance_ms(121);
        assert_eq!(sonic.poll().unwrap(), true);

        // Completion re-arms the machine.
        assert_eq!(sonic.poll().unwrap(), false);
        assert!(sonic.is_busy());

        drop(sonic);
        assert_eq!(bus.trigger_count, 2);
    }

    #[test]
    fn failed_read_consumes_cycle_and_keeps_stale_reading() {
        let clock = MockClock::new();
        let mut bus = MockBus::new();
        bus.fail_reads = true;
        let mut sonic = SonicI2c::new(&mut bus, &clock, I2cConfig::default());
        sonic.init().unwrap();

        assert_eq!(sonic.poll().unwrap(), false);
        clock.advance_ms(121);
        assert!(matches!(sonic.poll(), Err(SonicError::Io(_))));

        // Cycle consumed: machine is idle again, reading untouched.
        assert!(!sonic.is_busy());
        assert_eq!(sonic.distance_mm(), 4500.0);
    }

    #[test]
    fn read_mm_blocks_until_completion() {
        let clock = MockClock::new();
        let mut bus = MockBus::new();
        bus.payload = [0x00, 0x0B, 0xB8];
        let mut sonic = SonicI2c::new(&mut bus, &clock, I2cConfig::default());
        sonic.init().unwrap();

        assert!(matches!(sonic.read_mm(), Err(nb::Error::WouldBlock)));
        clock.advance_ms(50);
        assert!(matches!(sonic.read_mm(), Err(nb::Error::WouldBlock)));
        clock.advance_ms(71);
        assert_eq!(sonic.read_mm().unwrap(), 3.0);
    }
}
