//! The mutable state shared between the sampling, step, and discharge
//! contexts.
//!
//! The reference design kept these as independent volatile globals, which
//! permits a sampling tick to observe a half-applied transition. Here the
//! three fields travel as one value: every accessor runs inside a scoped
//! critical section owned by the embedding runtime, and the transition
//! helpers below are the only mutation paths.

/// Snapshot of the values crossing execution contexts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SharedState {
    /// Voltage currently forced onto the circuit.
    pub applied_volts: f32,
    /// Raw sensor code captured by the most recent sampling tick.
    pub last_raw_sample: u16,
    /// Set while a discharge-and-settle sequence is underway.
    pub discharge_active: bool,
}

impl SharedState {
    /// Pre-step idle state: nothing applied, nothing sampled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            applied_volts: 0.0,
            last_raw_sample: 0,
            discharge_active: false,
        }
    }

    /// Records the step input taking effect.
    pub const fn apply_step(&mut self, drive_volts: f32) {
        self.applied_volts = drive_volts;
    }

    /// Records the clamped sensor code for the current tick.
    pub const fn record_sample(&mut self, code: u16) {
        self.last_raw_sample = code;
    }

    /// Enters the discharge sequence: output cleared, indicator raised.
    pub const fn begin_discharge(&mut self) {
        self.applied_volts = 0.0;
        self.discharge_active = true;
    }

    /// Leaves the discharge sequence once the settling wait has elapsed.
    pub const fn end_discharge(&mut self) {
        self.discharge_active = false;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
