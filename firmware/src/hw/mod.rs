//! Hardware seams for the bench.
//!
//! The acquisition logic only ever talks to these traits; the concrete
//! Embassy peripherals live behind `cfg(target_os = "none")` so the same
//! modules compile and test on the host.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

#[cfg(target_os = "none")]
use embassy_stm32::adc::{Adc, AnyAdcChannel, SampleTime};
#[cfg(target_os = "none")]
use embassy_stm32::gpio::Output;
#[cfg(target_os = "none")]
use embassy_stm32::peripherals::ADC1;

/// Analog input sampling the capacitor voltage.
pub trait AnalogProbe {
    /// Performs one conversion and returns the raw sensor code.
    fn read_raw(&mut self) -> u16;
}

/// Digital outputs the bench drives: the step voltage and the
/// discharge-in-progress indicator.
pub trait BenchDriver {
    /// Forces the step voltage onto the circuit (or releases it).
    fn set_drive(&mut self, on: bool);

    /// Raises or clears the externally visible discharge indicator.
    fn set_discharge_flag(&mut self, on: bool);
}

/// Probe returning a fixed code, for bring-up and host tests.
#[derive(Copy, Clone, Debug, Default)]
pub struct FixedProbe(pub u16);

impl AnalogProbe for FixedProbe {
    fn read_raw(&mut self) -> u16 {
        self.0
    }
}

/// Driver that records the last commanded levels instead of touching pins.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordingDriver {
    pub drive: bool,
    pub flag: bool,
}

impl RecordingDriver {
    /// Creates a driver with both outputs released.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            drive: false,
            flag: false,
        }
    }
}

impl BenchDriver for RecordingDriver {
    fn set_drive(&mut self, on: bool) {
        self.drive = on;
    }

    fn set_discharge_flag(&mut self, on: bool) {
        self.flag = on;
    }
}

/// Embassy ADC wrapper sampling the sensor input pin.
#[cfg(target_os = "none")]
pub struct SensorAdc<'d> {
    adc: Adc<'d, ADC1>,
    channel: AnyAdcChannel<ADC1>,
}

#[cfg(target_os = "none")]
impl<'d> SensorAdc<'d> {
    /// Wraps the ADC with the sample time used for the bench's source
    /// impedance.
    pub fn new(mut adc: Adc<'d, ADC1>, channel: AnyAdcChannel<ADC1>) -> Self {
        adc.set_sample_time(SampleTime::CYCLES160_5);
        Self { adc, channel }
    }
}

#[cfg(target_os = "none")]
impl AnalogProbe for SensorAdc<'_> {
    fn read_raw(&mut self) -> u16 {
        self.adc.blocking_read(&mut self.channel)
    }
}

/// GPIO-backed bench outputs.
#[cfg(target_os = "none")]
pub struct GpioBenchDriver {
    drive: Output<'static>,
    flag: Output<'static>,
}

#[cfg(target_os = "none")]
impl GpioBenchDriver {
    pub fn new(drive: Output<'static>, flag: Output<'static>) -> Self {
        Self { drive, flag }
    }
}

#[cfg(target_os = "none")]
impl BenchDriver for GpioBenchDriver {
    fn set_drive(&mut self, on: bool) {
        if on {
            self.drive.set_high();
        } else {
            self.drive.set_low();
        }
    }

    fn set_discharge_flag(&mut self, on: bool) {
        if on {
            self.flag.set_high();
        } else {
            self.flag.set_low();
        }
    }
}
