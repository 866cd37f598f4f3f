//! Telemetry frame rendering and the observer broadcast seam.
//!
//! Frames are rendered directly into a bounded buffer; no JSON library is
//! involved. Field names are part of the wire contract with the deployed
//! observer page and must stay exactly `time`, `MV`, `PV`.

use core::fmt::{self, Write as _};

use heapless::String;

use crate::sampling::Reading;

/// Upper bound for a rendered frame, sized for worst-case float widths.
pub const FRAME_CAPACITY: usize = 64;

/// Buffer holding one rendered telemetry frame.
pub type FrameBuffer = String<FRAME_CAPACITY>;

/// Error raised when a frame does not fit [`FRAME_CAPACITY`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameOverflow;

impl fmt::Display for FrameOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("telemetry frame exceeds buffer capacity")
    }
}

/// Renders a reading into the compact key/value text payload.
///
/// Values are decimal strings with two fractional digits, mirroring what the
/// deployed observer page already parses.
///
/// # Errors
///
/// Returns [`FrameOverflow`] if the rendered text would not fit the buffer;
/// with [`FRAME_CAPACITY`] sized for full-width floats this indicates a
/// corrupted reading rather than an expected runtime condition.
pub fn render_frame(reading: &Reading) -> Result<FrameBuffer, FrameOverflow> {
    let mut frame = FrameBuffer::new();
    write!(
        frame,
        "{{\"time\":\"{:.2}\",\"MV\":\"{:.2}\",\"PV\":\"{:.2}\"}}",
        reading.elapsed_secs(),
        reading.applied_volts,
        reading.measured_volts,
    )
    .map_err(|_| FrameOverflow)?;
    Ok(frame)
}

/// Abstraction over the observer transport.
///
/// Implementations must be best-effort and non-blocking: a slow observer is
/// the transport's problem and must never stall the sampling cadence. The
/// core never enumerates observers, it only broadcasts to the whole set.
pub trait TelemetryOutlet {
    /// Pushes one text payload to every connected observer.
    fn broadcast_text(&mut self, payload: &str);

    /// Number of currently connected observers, for diagnostics only.
    fn observer_count(&self) -> usize;
}

/// Outlet that drops every frame, for bring-up and tests.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopOutlet;

impl NoopOutlet {
    /// Creates a new no-op outlet.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TelemetryOutlet for NoopOutlet {
    fn broadcast_text(&mut self, _: &str) {}

    fn observer_count(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;

    #[test]
    fn frame_carries_exactly_the_three_contract_fields() {
        let reading = Reading::new(Duration::from_millis(4_100), 3.3, 2.95);
        let frame = render_frame(&reading).unwrap();
        assert_eq!(
            frame.as_str(),
            "{\"time\":\"4.10\",\"MV\":\"3.30\",\"PV\":\"2.95\"}"
        );
    }

    #[test]
    fn pre_step_frame_shows_zero_applied_voltage() {
        let reading = Reading::new(Duration::from_millis(100), 0.0, 0.01);
        let frame = render_frame(&reading).unwrap();
        assert_eq!(
            frame.as_str(),
            "{\"time\":\"0.10\",\"MV\":\"0.00\",\"PV\":\"0.01\"}"
        );
    }

    #[test]
    fn long_running_timestamps_still_fit_the_buffer() {
        let reading = Reading::new(Duration::from_secs(86_400 * 30), 3.3, 3.3);
        let frame = render_frame(&reading).unwrap();
        assert!(frame.len() <= FRAME_CAPACITY);
        assert!(frame.as_str().starts_with("{\"time\":\"2592000.00\""));
    }
}
