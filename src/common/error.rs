// src/common/error.rs

/// Driver error, generic over the HAL's bus/pin error type.
///
/// There is deliberately no variant for a timed-out measurement: per the
/// device contract a missing echo is an in-band condition, recovered by
/// substituting the maximum-distance sentinel and re-arming on the next
/// poll. Only genuine transport faults surface here.
#[derive(Debug, thiserror::Error)]
pub enum SonicError<E>
where
    E: core::fmt::Debug,
{
    /// Underlying I/O error from the HAL implementation (bus or pin).
    #[error("I/O error: {0:?}")]
    Io(E),

    /// No device acknowledged the probe transaction at `init`.
    ///
    /// Non-fatal: the driver remains usable and will keep issuing trigger
    /// commands that the (absent) device is free to ignore. Callers that
    /// care should check for this at start-up.
    #[error("no device acknowledged the probe")]
    NotDetected,
}

// Allow mapping from underlying HAL error if From is implemented
impl<E: core::fmt::Debug> From<E> for SonicError<E> {
    fn from(e: E) -> Self {
        SonicError::Io(e)
    }
}
