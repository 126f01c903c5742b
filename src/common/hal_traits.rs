// src/common/hal_traits.rs

/// Abstraction over the platform's free-running monotonic counters.
///
/// The millisecond counter paces the settling/timeout timers; the
/// microsecond counter timestamps echo edges. Both are expected to wrap
/// like an unsigned counter (`millis()`/`micros()` semantics) — all
/// arithmetic in this crate uses wrapping subtraction, so a wrap in the
/// middle of a measurement is handled the same way the underlying clock
/// handles it.
///
/// Note: this could potentially be replaced by requiring a HAL-specific
/// timer type directly, but a two-method trait keeps the drivers portable
/// and trivially mockable.
pub trait SonicClock {
    /// Milliseconds since some arbitrary epoch. Wraps after ~49.7 days.
    fn now_ms(&self) -> u32;

    /// Microseconds since some arbitrary epoch. Wraps after ~71.6 minutes.
    fn now_us(&self) -> u32;
}

impl<T: SonicClock + ?Sized> SonicClock for &T {
    fn now_ms(&self) -> u32 {
        T::now_ms(self)
    }

    fn now_us(&self) -> u32 {
        T::now_us(self)
    }
}
