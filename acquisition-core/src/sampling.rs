//! Sensor code conversion and the per-tick reading value object.

use core::time::Duration;

/// Linear mapping from raw sensor codes to volts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SensorScale {
    full_scale_volts: f32,
    max_code: u16,
}

impl SensorScale {
    /// Creates a scale mapping `max_code` onto `full_scale_volts`.
    #[must_use]
    pub const fn new(full_scale_volts: f32, max_code: u16) -> Self {
        Self {
            full_scale_volts,
            max_code,
        }
    }

    /// Scale for a 12-bit converter, the resolution of the bench ADC.
    #[must_use]
    pub const fn twelve_bit(full_scale_volts: f32) -> Self {
        Self::new(full_scale_volts, 4095)
    }

    /// Largest representable sensor code.
    #[must_use]
    pub const fn max_code(&self) -> u16 {
        self.max_code
    }

    /// Full-scale voltage mapped onto [`Self::max_code`].
    #[must_use]
    pub const fn full_scale_volts(&self) -> f32 {
        self.full_scale_volts
    }

    /// Clamps a raw code into the representable range.
    ///
    /// Out-of-range codes are tolerated rather than propagated as errors so a
    /// misbehaving sensor cannot stall the telemetry stream.
    #[must_use]
    pub const fn clamp_code(&self, raw: u16) -> u16 {
        if raw > self.max_code { self.max_code } else { raw }
    }

    /// Converts a raw sensor code to volts, clamping first.
    #[must_use]
    pub fn volts_from_code(&self, raw: u16) -> f32 {
        let code = self.clamp_code(raw);
        f32::from(code) * (self.full_scale_volts / f32::from(self.max_code))
    }
}

/// Value object produced once per sampling tick.
///
/// Constructed fresh from the shared state, handed to the publisher, and
/// discarded; nothing retains history.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Reading {
    /// Elapsed time since acquisition start.
    pub elapsed: Duration,
    /// Voltage currently forced onto the circuit (MV).
    pub applied_volts: f32,
    /// Voltage sampled from the circuit (PV).
    pub measured_volts: f32,
}

impl Reading {
    /// Builds a reading for a single tick.
    #[must_use]
    pub const fn new(elapsed: Duration, applied_volts: f32, measured_volts: f32) -> Self {
        Self {
            elapsed,
            applied_volts,
            measured_volts,
        }
    }

    /// Elapsed time in seconds, as carried in the telemetry payload.
    #[must_use]
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn conversion_matches_manual_computation() {
        let scale = SensorScale::twelve_bit(3.3);
        for raw in [0_u16, 1, 512, 2048, 4000, 4095] {
            let expected = f32::from(raw) * (3.3 / 4095.0);
            assert_close(scale.volts_from_code(raw), expected);
        }
    }

    #[test]
    fn full_scale_code_reads_full_scale_volts() {
        let scale = SensorScale::twelve_bit(3.3);
        assert_close(scale.volts_from_code(4095), 3.3);
        assert_close(scale.volts_from_code(0), 0.0);
    }

    #[test]
    fn out_of_range_codes_are_clamped_not_rejected() {
        let scale = SensorScale::twelve_bit(3.3);
        assert_eq!(scale.clamp_code(4096), 4095);
        assert_eq!(scale.clamp_code(u16::MAX), 4095);
        assert_close(scale.volts_from_code(u16::MAX), 3.3);
    }

    #[test]
    fn reading_reports_elapsed_seconds() {
        let reading = Reading::new(Duration::from_millis(4_100), 3.3, 2.95);
        assert_close(reading.elapsed_secs(), 4.1);
    }
}
