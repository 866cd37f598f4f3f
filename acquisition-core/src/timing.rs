//! Timing constants derived from the circuit under test.
//!
//! Everything downstream of configuration keys off the RC time constant: the
//! sampling cadence resolves the charge curve at ten points per time constant,
//! and the settling window models the ~98% steady-state threshold (4x tau)
//! used both for the step-application delay and the discharge wait.

use core::fmt;
use core::time::Duration;

/// Samples taken per time constant.
pub const SAMPLES_PER_TIME_CONSTANT: f32 = 10.0;

/// Multiple of the time constant treated as fully settled.
pub const SETTLING_TIME_CONSTANTS: f32 = 4.0;

/// Fatal configuration errors raised while deriving the timing model.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimingError {
    /// Resistance was zero, negative, or not a finite number.
    NonPositiveResistance,
    /// Capacitance was zero, negative, or not a finite number.
    NonPositiveCapacitance,
    /// R * C is too short to resolve with the microsecond timer services.
    TimeConstantTooShort,
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingError::NonPositiveResistance => {
                f.write_str("resistance must be a positive finite value")
            }
            TimingError::NonPositiveCapacitance => {
                f.write_str("capacitance must be a positive finite value")
            }
            TimingError::TimeConstantTooShort => {
                f.write_str("time constant below timer resolution")
            }
        }
    }
}

/// Immutable timing model computed once at startup.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimingModel {
    time_constant: Duration,
    sampling_interval: Duration,
    settling_duration: Duration,
}

impl TimingModel {
    /// Derives the model from the resistor and capacitor values.
    ///
    /// Rejects non-positive or non-finite inputs; acquisition must not start
    /// from a rejected configuration.
    pub fn from_circuit(
        resistance_ohms: f32,
        capacitance_farads: f32,
    ) -> Result<Self, TimingError> {
        if !resistance_ohms.is_finite() || resistance_ohms <= 0.0 {
            return Err(TimingError::NonPositiveResistance);
        }
        if !capacitance_farads.is_finite() || capacitance_farads <= 0.0 {
            return Err(TimingError::NonPositiveCapacitance);
        }

        let tau_secs = resistance_ohms * capacitance_farads;
        let model = Self {
            time_constant: duration_from_secs(tau_secs),
            sampling_interval: duration_from_secs(tau_secs / SAMPLES_PER_TIME_CONSTANT),
            settling_duration: duration_from_secs(tau_secs * SETTLING_TIME_CONSTANTS),
        };
        if model.sampling_interval.is_zero() {
            return Err(TimingError::TimeConstantTooShort);
        }
        Ok(model)
    }

    /// RC time constant (tau = R * C).
    #[must_use]
    pub const fn time_constant(&self) -> Duration {
        self.time_constant
    }

    /// Fixed period of the sampling scheduler.
    #[must_use]
    pub const fn sampling_interval(&self) -> Duration {
        self.sampling_interval
    }

    /// Delay before the step input fires, and the discharge wait.
    #[must_use]
    pub const fn settling_duration(&self) -> Duration {
        self.settling_duration
    }
}

/// Truncates to whole microseconds, matching the resolution of the timer
/// services that consume these values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn duration_from_secs(secs: f32) -> Duration {
    Duration::from_micros((secs * 1_000_000.0) as u64)
}
