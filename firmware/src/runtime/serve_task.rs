use crate::hw::GpioBenchDriver;
use crate::net::{NoopLink, Server};

#[embassy_executor::task]
pub async fn run(server: Server<'static, NoopLink, GpioBenchDriver>) -> ! {
    server.run().await
}
