//! Telemetry publication path.
//!
//! One publisher instance exists per task that broadcasts: the sampler pushes
//! a fresh frame every tick, and the serve loop re-broadcasts the cached
//! frame when an observer pings. Delivery is handed to the transport outlet
//! without waiting; a congested outlet costs a dropped frame, never a stalled
//! sampling cadence.

use acquisition_core::sampling::Reading;
use acquisition_core::telemetry::{TelemetryOutlet, render_frame};

use super::LatestFrame;

/// Formats readings and pushes them to every connected observer.
pub struct TelemetryPublisher<'a, O: TelemetryOutlet> {
    outlet: O,
    latest: &'a LatestFrame,
}

impl<'a, O: TelemetryOutlet> TelemetryPublisher<'a, O> {
    /// Creates a publisher over the given outlet and frame cache.
    pub fn new(outlet: O, latest: &'a LatestFrame) -> Self {
        Self { outlet, latest }
    }

    /// Renders and broadcasts one reading, refreshing the cached frame.
    pub fn publish(&mut self, reading: &Reading) {
        let Ok(frame) = render_frame(reading) else {
            // A reading that cannot render points at corrupted state; skip
            // the frame and keep the stream alive.
            emit_render_failure(reading.elapsed_secs());
            return;
        };

        emit_frame_log(frame.as_str(), self.outlet.observer_count());
        self.latest
            .lock(|cell| *cell.borrow_mut() = Some(frame.clone()));
        self.outlet.broadcast_text(frame.as_str());
    }

    /// Re-broadcasts the most recent frame to all observers.
    ///
    /// Any inbound observer text is a ping for the latest reading; the reply
    /// goes to the whole set, not just the sender. A ping before the first
    /// tick is a no-op.
    pub fn resend_latest(&mut self) {
        let cached = self.latest.lock(|cell| cell.borrow().clone());
        if let Some(frame) = cached {
            self.outlet.broadcast_text(frame.as_str());
        }
    }
}

#[cfg(target_os = "none")]
fn emit_frame_log(frame: &str, observers: usize) {
    defmt::debug!("telemetry:frame {} observers={}", frame, observers);
}

#[cfg(not(target_os = "none"))]
fn emit_frame_log(frame: &str, observers: usize) {
    println!("telemetry:frame {frame} observers={observers}");
}

#[cfg(target_os = "none")]
fn emit_render_failure(elapsed_secs: f32) {
    defmt::warn!("telemetry:render-failure t={}s", elapsed_secs);
}

#[cfg(not(target_os = "none"))]
fn emit_render_failure(elapsed_secs: f32) {
    println!("telemetry:render-failure t={elapsed_secs}s");
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use acquisition_core::telemetry::FrameBuffer;
    use heapless::Vec;

    use super::*;
    use crate::acquisition::latest_frame;

    #[derive(Default)]
    struct CapturingOutlet {
        sent: Vec<FrameBuffer, 8>,
    }

    impl TelemetryOutlet for &mut CapturingOutlet {
        fn broadcast_text(&mut self, payload: &str) {
            let mut frame = FrameBuffer::new();
            frame.push_str(payload).unwrap();
            self.sent.push(frame).unwrap();
        }

        fn observer_count(&self) -> usize {
            1
        }
    }

    #[test]
    fn publish_caches_and_broadcasts_the_frame() {
        let latest = latest_frame();
        let mut outlet = CapturingOutlet::default();
        let mut publisher = TelemetryPublisher::new(&mut outlet, &latest);

        let reading = Reading::new(Duration::from_millis(4_100), 3.3, 2.95);
        publisher.publish(&reading);
        publisher.resend_latest();

        assert_eq!(outlet.sent.len(), 2);
        assert_eq!(outlet.sent[0], outlet.sent[1]);
        assert!(outlet.sent[0].as_str().contains("\"MV\":\"3.30\""));
    }

    #[test]
    fn resend_before_first_tick_is_a_no_op() {
        let latest = latest_frame();
        let mut outlet = CapturingOutlet::default();
        let mut publisher = TelemetryPublisher::new(&mut outlet, &latest);

        publisher.resend_latest();
        assert!(outlet.sent.is_empty());
    }
}
