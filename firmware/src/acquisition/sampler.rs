//! The periodic sampling scheduler.
//!
//! Runs from acquisition start until the process ends. Each firing performs
//! one scoped shared-state access (store the clamped code, read the applied
//! voltage), converts the code to volts, and hands the reading to the
//! publisher. Timestamps come from the tick counter so they sit on the ideal
//! sampling grid and are monotonic by construction.

use acquisition_core::sampling::{Reading, SensorScale};
use acquisition_core::telemetry::TelemetryOutlet;
use embassy_time::{Instant, Ticker};

use super::{SharedCell, publisher::TelemetryPublisher, to_embassy};
use crate::hw::AnalogProbe;
use crate::status;

/// Sampling ticks between status-counter log lines.
const STATUS_LOG_TICKS: u32 = 100;

/// Periodic sampler bound to one probe and the shared state.
pub struct Sampler<'a, P: AnalogProbe> {
    shared: &'a SharedCell,
    probe: P,
    scale: SensorScale,
    interval: core::time::Duration,
    ticks: u32,
}

impl<'a, P: AnalogProbe> Sampler<'a, P> {
    /// Creates a sampler that has not yet produced a tick.
    pub fn new(
        shared: &'a SharedCell,
        probe: P,
        scale: SensorScale,
        interval: core::time::Duration,
    ) -> Self {
        Self {
            shared,
            probe,
            scale,
            interval,
            ticks: 0,
        }
    }

    /// Number of ticks produced so far.
    #[must_use]
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Performs one sampling tick and returns the resulting reading.
    pub fn sample_once(&mut self) -> Reading {
        self.ticks += 1;

        let raw = self.probe.read_raw();
        let clamped = self.scale.clamp_code(raw);

        let applied = self.shared.lock(|cell| {
            let mut state = cell.borrow_mut();
            state.record_sample(clamped);
            state.applied_volts
        });

        Reading::new(
            self.interval * self.ticks,
            applied,
            self.scale.volts_from_code(raw),
        )
    }

    /// Drives the sampler forever at the configured interval.
    pub async fn run<O: TelemetryOutlet>(
        mut self,
        mut publisher: TelemetryPublisher<'_, O>,
    ) -> ! {
        let interval = to_embassy(self.interval);
        let started = Instant::now();
        let mut ticker = Ticker::every(interval);

        loop {
            ticker.next().await;
            let reading = self.sample_once();

            // A tick that lands a full interval late is counted, not hidden.
            let deadline = started + interval * self.ticks;
            if Instant::now().saturating_duration_since(deadline) >= interval {
                status::record_missed_tick();
            }

            if self.ticks.is_multiple_of(STATUS_LOG_TICKS) {
                emit_status_log(status::snapshot());
            }

            publisher.publish(&reading);
        }
    }
}

#[cfg(target_os = "none")]
fn emit_status_log(snapshot: status::StatusSnapshot) {
    defmt::info!(
        "status: missed={} dropped={} observers={} discharging={}",
        snapshot.missed_ticks,
        snapshot.dropped_frames,
        snapshot.observers,
        snapshot.discharge_active,
    );
}

#[cfg(not(target_os = "none"))]
fn emit_status_log(snapshot: status::StatusSnapshot) {
    println!(
        "status: missed={} dropped={} observers={} discharging={}",
        snapshot.missed_ticks, snapshot.dropped_frames, snapshot.observers, snapshot.discharge_active,
    );
}
