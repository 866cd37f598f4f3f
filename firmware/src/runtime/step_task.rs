use crate::acquisition::step::StepSequencer;
use crate::hw::GpioBenchDriver;

#[embassy_executor::task]
pub async fn run(sequencer: StepSequencer<'static, GpioBenchDriver>) {
    sequencer.run().await;
}
