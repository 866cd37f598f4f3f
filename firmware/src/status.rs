#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! Lightweight atomics track sampling health, observer population, and the
//! discharge indicator so diagnostics can surface a snapshot without touching
//! the acquisition critical section.

use portable_atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

/// Sampling ticks that fell more than one interval behind schedule.
static MISSED_TICKS: AtomicU32 = AtomicU32::new(0);
/// Frames dropped because the transport queue was full.
static DROPPED_FRAMES: AtomicU32 = AtomicU32::new(0);
/// Mirrors the discharge-in-progress indicator pin.
static DISCHARGE_ACTIVE: AtomicBool = AtomicBool::new(false);
/// Currently connected telemetry observers.
static OBSERVERS: AtomicU8 = AtomicU8::new(0);

/// Counts one sampling tick that missed its slot.
pub fn record_missed_tick() {
    MISSED_TICKS.fetch_add(1, Ordering::Relaxed);
}

/// Total missed sampling ticks since boot.
pub fn missed_ticks() -> u32 {
    MISSED_TICKS.load(Ordering::Relaxed)
}

/// Counts one telemetry frame dropped on the transport queue.
pub fn record_dropped_frame() {
    DROPPED_FRAMES.fetch_add(1, Ordering::Relaxed);
}

/// Total dropped telemetry frames since boot.
pub fn dropped_frames() -> u32 {
    DROPPED_FRAMES.load(Ordering::Relaxed)
}

/// Mirrors the discharge indicator.
pub fn set_discharge_active(active: bool) {
    DISCHARGE_ACTIVE.store(active, Ordering::Relaxed);
}

/// Returns `true` while a discharge sequence is underway.
pub fn discharge_active() -> bool {
    DISCHARGE_ACTIVE.load(Ordering::Relaxed)
}

/// Records an observer joining the telemetry channel.
pub fn observer_connected() {
    OBSERVERS.fetch_add(1, Ordering::Relaxed);
}

/// Records an observer leaving the telemetry channel.
pub fn observer_disconnected() {
    let _ = OBSERVERS.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
        count.checked_sub(1)
    });
}

/// Currently connected observers.
pub fn observer_count() -> usize {
    usize::from(OBSERVERS.load(Ordering::Relaxed))
}

/// Point-in-time view of the counters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    pub missed_ticks: u32,
    pub dropped_frames: u32,
    pub discharge_active: bool,
    pub observers: usize,
}

/// Builds a [`StatusSnapshot`] from the stored counters.
pub fn snapshot() -> StatusSnapshot {
    StatusSnapshot {
        missed_ticks: missed_ticks(),
        dropped_frames: dropped_frames(),
        discharge_active: discharge_active(),
        observers: observer_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_mirrors_the_recorded_counters() {
        let before = snapshot();
        record_missed_tick();
        record_missed_tick();

        let after = snapshot();
        assert_eq!(after.missed_ticks, before.missed_ticks + 2);
        assert_eq!(after.missed_ticks, missed_ticks());
    }

    #[test]
    fn observer_count_never_underflows() {
        observer_disconnected();
        assert_eq!(observer_count(), 0);

        observer_connected();
        observer_connected();
        observer_disconnected();
        assert_eq!(observer_count(), 1);
        observer_disconnected();
        assert_eq!(observer_count(), 0);
    }
}
