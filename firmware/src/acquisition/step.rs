//! One-shot step application.
//!
//! The sequencer sleeps through the settling window and then drives the step
//! voltage exactly once. The drive pin and the shared applied-voltage field
//! change back to back, so the next sampling tick already reports the new
//! excitation. A discharge in progress holds the step off; it lands on the
//! first poll after the drain window closes.

use acquisition_core::step::StepInput;
use embassy_time::Timer;

use super::{DriverCell, SharedCell, to_embassy};
use crate::hw::BenchDriver;

/// Applies the step input once after the settling window elapses.
pub struct StepSequencer<'a, D: BenchDriver> {
    shared: &'a SharedCell,
    driver: &'a DriverCell<D>,
    input: StepInput,
    settling: core::time::Duration,
    poll: core::time::Duration,
}

impl<'a, D: BenchDriver> StepSequencer<'a, D> {
    /// Creates an armed sequencer that will drive `input` after `settling`,
    /// re-checking every `poll` while a discharge keeps the window shut.
    pub const fn new(
        shared: &'a SharedCell,
        driver: &'a DriverCell<D>,
        input: StepInput,
        settling: core::time::Duration,
        poll: core::time::Duration,
    ) -> Self {
        Self {
            shared,
            driver,
            input,
            settling,
            poll,
        }
    }

    /// Drives the step if the window is open. Returns `true` on the firing
    /// call; `false` while a discharge holds the step off, and on every call
    /// after it has fired.
    pub fn apply(&mut self) -> bool {
        let draining = self.shared.lock(|cell| cell.borrow().discharge_active);
        if draining {
            return false;
        }

        let Some(volts) = self.input.fire() else {
            return false;
        };

        self.driver
            .lock(|cell| cell.borrow_mut().set_drive(true));
        self.shared.lock(|cell| cell.borrow_mut().apply_step(volts));
        emit_step_log(volts);
        true
    }

    /// Waits out the settling window, then fires the step on the first poll
    /// with no drain in progress.
    pub async fn run(mut self) {
        Timer::after(to_embassy(self.settling)).await;
        while !self.apply() {
            Timer::after(to_embassy(self.poll)).await;
        }
    }
}

#[cfg(target_os = "none")]
fn emit_step_log(volts: f32) {
    defmt::info!("step:applied {}V", volts);
}

#[cfg(not(target_os = "none"))]
fn emit_step_log(volts: f32) {
    println!("step:applied {volts}V");
}
