use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::gpio::{Level, Output, Speed};
use static_cell::StaticCell;

use crate::acquisition::discharge::DischargeSequence;
use crate::acquisition::publisher::TelemetryPublisher;
use crate::acquisition::sampler::Sampler;
use crate::acquisition::step::StepSequencer;
use crate::acquisition::{
    DriverCell, LatestFrame, SharedCell, latest_frame, shared_cell, to_embassy,
};
use crate::hw::{GpioBenchDriver, SensorAdc};
use crate::net::{
    EventChannel, JoinOutcome, NetworkLink, NoopLink, OutboundChannel, Server, TransportHandle,
};
use acquisition_core::config::DEFAULT_CONFIG;
use acquisition_core::step::StepInput;

mod sampler_task;
mod serve_task;
mod step_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static SHARED: SharedCell = shared_cell();
pub(super) static LATEST: LatestFrame = latest_frame();
pub(super) static EVENTS: EventChannel = EventChannel::new();
pub(super) static OUTBOUND: OutboundChannel = OutboundChannel::new();
static DRIVER: StaticCell<DriverCell<GpioBenchDriver>> = StaticCell::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA5,
        ADC1,
        ..
    } = hal::init(config);

    let timing = DEFAULT_CONFIG
        .timing()
        .expect("default circuit parameters must yield a valid timing model");

    defmt::info!(
        "boot: ssid={} tau={}us interval={}us settling={}us",
        DEFAULT_CONFIG.network.ssid,
        to_embassy(timing.time_constant()).as_micros(),
        to_embassy(timing.sampling_interval()).as_micros(),
        to_embassy(timing.settling_duration()).as_micros(),
    );

    // Acquisition waits for the network; a bench nobody can observe or
    // discharge must not start charging.
    let mut link = NoopLink;
    if link.join(&DEFAULT_CONFIG.network).await == JoinOutcome::Failed {
        defmt::error!("network join failed; halting before acquisition");
        core::future::pending::<()>().await;
    }

    let probe = SensorAdc::new(Adc::new(ADC1), PA0.degrade_adc());
    let driver: &'static DriverCell<GpioBenchDriver> =
        DRIVER.init(DriverCell::new(core::cell::RefCell::new(
            GpioBenchDriver::new(
                Output::new(PA1, Level::Low, Speed::Low),
                Output::new(PA5, Level::Low, Speed::Low),
            ),
        )));

    let sampler = Sampler::new(
        &SHARED,
        probe,
        DEFAULT_CONFIG.sensor,
        timing.sampling_interval(),
    );
    let sampler_publisher =
        TelemetryPublisher::new(TransportHandle::new(OUTBOUND.sender()), &LATEST);

    let sequencer = StepSequencer::new(
        &SHARED,
        driver,
        StepInput::new(DEFAULT_CONFIG.drive_volts),
        timing.settling_duration(),
        timing.sampling_interval(),
    );

    let discharge = DischargeSequence::new(&SHARED, driver, timing.settling_duration());
    let serve_publisher =
        TelemetryPublisher::new(TransportHandle::new(OUTBOUND.sender()), &LATEST);
    let server = Server::new(
        link,
        discharge,
        serve_publisher,
        EVENTS.receiver(),
        OUTBOUND.receiver(),
    );

    // A wire driver task plugs in with EVENTS.sender() once a radio or
    // Ethernet PHY is attached to this board.
    let _wire_events = EVENTS.sender();

    spawner
        .spawn(sampler_task::run(sampler, sampler_publisher))
        .expect("failed to spawn sampler task");
    spawner
        .spawn(step_task::run(sequencer))
        .expect("failed to spawn step task");
    spawner
        .spawn(serve_task::run(server))
        .expect("failed to spawn serve task");

    core::future::pending::<()>().await;
}
