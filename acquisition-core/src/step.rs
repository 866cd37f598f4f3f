//! One-shot step-input state machine.

/// Lifecycle of the step input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StepPhase {
    /// Waiting for the settling delay to elapse.
    Armed,
    /// The step has been applied; terminal for this controller.
    Applied,
}

/// Tracks the single armed-to-applied transition of the step input.
///
/// There is no path back to [`StepPhase::Armed`]: a new measurement cycle
/// requires the process-level discharge-and-restart sequence.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StepInput {
    phase: StepPhase,
    drive_volts: f32,
}

impl StepInput {
    /// Arms the controller with the voltage the step will force.
    #[must_use]
    pub const fn new(drive_volts: f32) -> Self {
        Self {
            phase: StepPhase::Armed,
            drive_volts,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Returns `true` once the step has fired.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self.phase, StepPhase::Applied)
    }

    /// Voltage the step forces onto the circuit.
    #[must_use]
    pub const fn drive_volts(&self) -> f32 {
        self.drive_volts
    }

    /// Fires the one-shot.
    ///
    /// Returns the drive voltage on the first call so the caller can commit
    /// it to the shared state and the output pin; later calls are no-ops.
    pub const fn fire(&mut self) -> Option<f32> {
        match self.phase {
            StepPhase::Armed => {
                self.phase = StepPhase::Applied;
                Some(self.drive_volts)
            }
            StepPhase::Applied => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_exactly_once() {
        let mut step = StepInput::new(3.3);
        assert_eq!(step.phase(), StepPhase::Armed);
        assert!(!step.is_applied());

        assert_eq!(step.fire(), Some(3.3));
        assert!(step.is_applied());

        assert_eq!(step.fire(), None);
        assert_eq!(step.phase(), StepPhase::Applied);
    }
}
