//! Startup configuration for the bench.
//!
//! Network credentials and pin routing are deployment details, not behavior;
//! they live in one named structure so targets can override them without
//! touching the acquisition path. The default catalog mirrors the reference
//! bench wiring.

use crate::sampling::SensorScale;
use crate::timing::{TimingError, TimingModel};

/// Credentials handed to the network-join collaborator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NetworkCredentials {
    pub ssid: &'static str,
    pub password: &'static str,
}

/// Logical pin routing, by board label.
///
/// The firmware runtime binds these labels to concrete peripherals; host
/// targets only ever log them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PinAssignments {
    /// Analog input sampling the capacitor voltage.
    pub sensor_input: &'static str,
    /// Digital output forcing the step voltage.
    pub drive_output: &'static str,
    /// Status output asserted for the duration of a discharge.
    pub discharge_flag: &'static str,
}

/// The circuit under test.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CircuitParams {
    pub resistance_ohms: f32,
    pub capacitance_farads: f32,
}

/// Complete startup configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BenchConfig {
    pub network: NetworkCredentials,
    pub pins: PinAssignments,
    pub circuit: CircuitParams,
    /// Voltage the step input forces onto the circuit.
    pub drive_volts: f32,
    pub sensor: SensorScale,
}

impl BenchConfig {
    /// Derives the timing model, validating the circuit parameters.
    ///
    /// # Errors
    ///
    /// Propagates [`TimingError`] for a circuit the timer services cannot
    /// resolve; the process must not proceed to acquisition.
    pub fn timing(&self) -> Result<TimingModel, TimingError> {
        TimingModel::from_circuit(self.circuit.resistance_ohms, self.circuit.capacitance_farads)
    }
}

/// Reference bench: 10 kOhm into 100 uF, 3.3 V drive, 12-bit sensor.
pub const DEFAULT_CONFIG: BenchConfig = BenchConfig {
    network: NetworkCredentials {
        ssid: "bench-lab",
        password: "change-me",
    },
    pins: PinAssignments {
        sensor_input: "PA0",
        drive_output: "PA1",
        discharge_flag: "PA5",
    },
    circuit: CircuitParams {
        resistance_ohms: 10_000.0,
        capacitance_farads: 0.000_1,
    },
    drive_volts: 3.3,
    sensor: SensorScale::twelve_bit(3.3),
};

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;

    #[test]
    fn default_catalog_validates_and_matches_reference_timing() {
        let model = DEFAULT_CONFIG.timing().unwrap();
        assert_eq!(model.time_constant(), Duration::from_secs(1));
        assert_eq!(model.sampling_interval(), Duration::from_millis(100));
        assert_eq!(model.settling_duration(), Duration::from_secs(4));
    }

    #[test]
    fn invalid_circuit_is_fatal_at_startup() {
        let mut config = DEFAULT_CONFIG;
        config.circuit.capacitance_farads = 0.0;
        assert!(config.timing().is_err());
    }
}
