//! Re-entry guard for the discharge-and-settle sequence.
//!
//! The discharge blocks the request-servicing path for the full settling
//! duration, so overlapping invocations would corrupt the timing assumptions.
//! The gate rejects a second request outright instead of re-entering; the
//! reference firmware had no such guard.

use core::fmt;

/// Rejection returned while a discharge is already underway.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DischargeBusy;

impl fmt::Display for DischargeBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("discharge already in progress")
    }
}

/// Phases of the discharge sequence.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DischargePhase {
    /// No discharge in progress.
    Idle,
    /// Output driven low; waiting out the settling duration.
    Draining,
}

/// Serializes discharge requests.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DischargeGate {
    phase: DischargePhase,
}

impl DischargeGate {
    /// Creates an idle gate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: DischargePhase::Idle,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> DischargePhase {
        self.phase
    }

    /// Returns `true` while a discharge holds the gate.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.phase, DischargePhase::Draining)
    }

    /// Claims the gate for a new discharge.
    ///
    /// # Errors
    ///
    /// Returns [`DischargeBusy`] without mutating anything when a discharge
    /// is already active.
    pub const fn try_begin(&mut self) -> Result<(), DischargeBusy> {
        match self.phase {
            DischargePhase::Idle => {
                self.phase = DischargePhase::Draining;
                Ok(())
            }
            DischargePhase::Draining => Err(DischargeBusy),
        }
    }

    /// Releases the gate after the settling wait completes.
    pub const fn finish(&mut self) {
        self.phase = DischargePhase::Idle;
    }
}

impl Default for DischargeGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_request_is_rejected_while_draining() {
        let mut gate = DischargeGate::new();
        assert!(!gate.is_active());

        gate.try_begin().unwrap();
        assert!(gate.is_active());

        assert_eq!(gate.try_begin(), Err(DischargeBusy));
        // The rejection must not disturb the in-flight discharge.
        assert_eq!(gate.phase(), DischargePhase::Draining);

        gate.finish();
        assert!(!gate.is_active());
        gate.try_begin().unwrap();
    }
}
