//! Acquisition surface bridging firmware tasks with `acquisition-core`.
//!
//! The shared state crosses three execution contexts (sampling tick, step
//! one-shot, discharge handler); it lives behind a blocking mutex so each
//! access is one scoped critical section and the fields can never tear.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use core::cell::RefCell;

use acquisition_core::state::SharedState;
use acquisition_core::telemetry::FrameBuffer;
use embassy_sync::blocking_mutex::Mutex;
#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_time::Duration as EmbassyDuration;

pub mod discharge;
pub mod publisher;
pub mod sampler;
pub mod step;

#[cfg(target_os = "none")]
pub type BenchRawMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
pub type BenchRawMutex = NoopRawMutex;

/// Critical-section cell guarding the cross-context state as one unit.
pub type SharedCell = Mutex<BenchRawMutex, RefCell<SharedState>>;

/// Cell guarding the bench outputs shared by the step and discharge paths.
pub type DriverCell<D> = Mutex<BenchRawMutex, RefCell<D>>;

/// Cache of the most recently rendered telemetry frame, re-broadcast when an
/// observer pings.
pub type LatestFrame = Mutex<BenchRawMutex, RefCell<Option<FrameBuffer>>>;

/// Creates the shared-state cell in its pre-step idle condition.
#[must_use]
pub const fn shared_cell() -> SharedCell {
    Mutex::new(RefCell::new(SharedState::new()))
}

/// Creates an empty latest-frame cache.
#[must_use]
pub const fn latest_frame() -> LatestFrame {
    Mutex::new(RefCell::new(None))
}

/// Converts a portable duration into the Embassy tick domain.
#[must_use]
pub fn to_embassy(duration: core::time::Duration) -> EmbassyDuration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    EmbassyDuration::from_micros(micros)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_conversion_preserves_microseconds() {
        let core = core::time::Duration::from_millis(100);
        assert_eq!(to_embassy(core), EmbassyDuration::from_micros(100_000));
    }
}
