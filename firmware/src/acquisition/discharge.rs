//! Discharge sequencing.
//!
//! A discharge request releases the drive pin, raises the indicator, and
//! holds that condition for the full drain window before reporting the bench
//! idle again. Requests that arrive mid-drain are rejected without touching
//! the bench. The serve loop owns the wait so it can keep delivering
//! telemetry while the window runs out.

use acquisition_core::discharge::{DischargeBusy, DischargeGate};

use super::{DriverCell, SharedCell};
use crate::hw::BenchDriver;
use crate::status;

/// Owns the discharge gate and walks the bench through a drain cycle.
pub struct DischargeSequence<'a, D: BenchDriver> {
    shared: &'a SharedCell,
    driver: &'a DriverCell<D>,
    gate: DischargeGate,
    drain: core::time::Duration,
}

impl<'a, D: BenchDriver> DischargeSequence<'a, D> {
    /// Creates an idle sequence with a `drain` hold window.
    pub const fn new(
        shared: &'a SharedCell,
        driver: &'a DriverCell<D>,
        drain: core::time::Duration,
    ) -> Self {
        Self {
            shared,
            driver,
            gate: DischargeGate::new(),
            drain,
        }
    }

    /// Enters the draining phase: drive released, indicator raised, applied
    /// voltage zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`DischargeBusy`] when a drain is already underway; the bench
    /// is left untouched in that case.
    pub fn begin(&mut self) -> Result<(), DischargeBusy> {
        self.gate.try_begin()?;

        self.driver.lock(|cell| {
            let mut driver = cell.borrow_mut();
            driver.set_drive(false);
            driver.set_discharge_flag(true);
        });
        self.shared.lock(|cell| cell.borrow_mut().begin_discharge());
        status::set_discharge_active(true);
        emit_discharge_log("begin");
        Ok(())
    }

    /// Leaves the draining phase and lowers the indicator.
    pub fn finish(&mut self) {
        self.driver
            .lock(|cell| cell.borrow_mut().set_discharge_flag(false));
        self.shared.lock(|cell| cell.borrow_mut().end_discharge());
        self.gate.finish();
        status::set_discharge_active(false);
        emit_discharge_log("finish");
    }

    /// Length of the hold window between [`Self::begin`] and [`Self::finish`].
    #[must_use]
    pub const fn drain(&self) -> core::time::Duration {
        self.drain
    }
}

#[cfg(target_os = "none")]
fn emit_discharge_log(phase: &str) {
    defmt::info!("discharge:{}", phase);
}

#[cfg(not(target_os = "none"))]
fn emit_discharge_log(phase: &str) {
    println!("discharge:{phase}");
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;
    use core::time::Duration;

    use embassy_sync::blocking_mutex::Mutex;

    use super::*;
    use crate::acquisition::shared_cell;
    use crate::hw::RecordingDriver;

    #[test]
    fn begin_releases_the_drive_and_raises_the_indicator() {
        let shared = shared_cell();
        shared.lock(|cell| cell.borrow_mut().apply_step(3.3));
        let driver = Mutex::new(RefCell::new(RecordingDriver {
            drive: true,
            flag: false,
        }));
        let mut sequence = DischargeSequence::new(&shared, &driver, Duration::from_secs(4));

        sequence.begin().unwrap();

        let outputs = driver.lock(|cell| *cell.borrow());
        assert!(!outputs.drive);
        assert!(outputs.flag);
        shared.lock(|cell| {
            let state = cell.borrow();
            assert_eq!(state.applied_volts, 0.0);
            assert!(state.discharge_active);
        });
    }

    #[test]
    fn finish_lowers_the_indicator_and_clears_the_flag() {
        let shared = shared_cell();
        let driver = Mutex::new(RefCell::new(RecordingDriver::new()));
        let mut sequence = DischargeSequence::new(&shared, &driver, Duration::from_secs(4));

        sequence.begin().unwrap();
        sequence.finish();

        assert!(!driver.lock(|cell| cell.borrow().flag));
        assert!(!shared.lock(|cell| cell.borrow().discharge_active));
        // The gate is reusable once the drain completes.
        sequence.begin().unwrap();
    }

    #[test]
    fn a_second_request_mid_drain_leaves_the_bench_untouched() {
        let shared = shared_cell();
        let driver = Mutex::new(RefCell::new(RecordingDriver::new()));
        let mut sequence = DischargeSequence::new(&shared, &driver, Duration::from_secs(4));

        sequence.begin().unwrap();
        let before = driver.lock(|cell| *cell.borrow());
        let state_before = shared.lock(|cell| *cell.borrow());

        assert!(sequence.begin().is_err());
        assert_eq!(driver.lock(|cell| *cell.borrow()), before);
        assert_eq!(shared.lock(|cell| *cell.borrow()), state_before);
    }
}
