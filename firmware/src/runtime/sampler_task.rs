use crate::acquisition::publisher::TelemetryPublisher;
use crate::acquisition::sampler::Sampler;
use crate::hw::SensorAdc;
use crate::net::TransportHandle;

#[embassy_executor::task]
pub async fn run(
    sampler: Sampler<'static, SensorAdc<'static>>,
    publisher: TelemetryPublisher<'static, TransportHandle<'static>>,
) -> ! {
    sampler.run(publisher).await
}
