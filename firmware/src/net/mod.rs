//! Network surface: bounded queues, HTTP replies, and the serve loop.
//!
//! The wire driver is a seam. Whatever carries the bytes feeds inbound
//! activity into the event queue and drains outbound telemetry through a
//! [`NetworkLink`]; the serve loop in between owns the discharge sequence and
//! the frame re-broadcast path and never blocks on the wire.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use acquisition_core::config::NetworkCredentials;
use acquisition_core::request::{Endpoint, MalformedRequest, parse_request_line};
use acquisition_core::telemetry::{FrameBuffer, TelemetryOutlet};
use embassy_futures::select::{Either, Either3, select, select3};
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::{Instant, Timer};

use crate::acquisition::discharge::DischargeSequence;
use crate::acquisition::publisher::TelemetryPublisher;
use crate::acquisition::{BenchRawMutex, to_embassy};
use crate::hw::BenchDriver;
use crate::status;

/// Depth for inbound server events.
pub const EVENT_QUEUE_DEPTH: usize = 4;

/// Depth for outbound telemetry frames awaiting delivery.
pub const OUTBOUND_QUEUE_DEPTH: usize = 8;

/// Inbound activity reported by the wire driver.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ServerEvent {
    /// A client hit the discharge endpoint.
    DischargeRequest,
    /// An observer sent text on the telemetry channel; any text is a ping
    /// for the latest frame.
    ObserverPing,
    /// An observer joined the telemetry channel.
    ObserverJoined,
    /// An observer left the telemetry channel.
    ObserverLeft,
}

/// Channel carrying inbound server events.
pub type EventChannel = Channel<BenchRawMutex, ServerEvent, EVENT_QUEUE_DEPTH>;

/// Sender handle used by the wire driver.
pub type EventSender<'a> = Sender<'a, BenchRawMutex, ServerEvent, EVENT_QUEUE_DEPTH>;

/// Receiver handle consumed by the serve loop.
pub type EventReceiver<'a> = Receiver<'a, BenchRawMutex, ServerEvent, EVENT_QUEUE_DEPTH>;

/// Channel carrying rendered frames toward the wire driver.
pub type OutboundChannel = Channel<BenchRawMutex, FrameBuffer, OUTBOUND_QUEUE_DEPTH>;

/// Sender handle used by the telemetry publisher.
pub type OutboundSender<'a> = Sender<'a, BenchRawMutex, FrameBuffer, OUTBOUND_QUEUE_DEPTH>;

/// Receiver handle consumed by the serve loop.
pub type OutboundReceiver<'a> = Receiver<'a, BenchRawMutex, FrameBuffer, OUTBOUND_QUEUE_DEPTH>;

/// Replies the control endpoint can produce.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HttpReply {
    /// Discharge ran to completion.
    Ok,
    /// A discharge was already underway; the bench was left untouched.
    Busy,
    /// Well-formed request for a target the controller does not serve.
    NotFound,
    /// Not a request line the parser recognizes.
    BadRequest,
}

impl HttpReply {
    /// Complete response bytes, status line through body.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => {
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\nok"
            }
            Self::Busy => {
                "HTTP/1.1 409 Conflict\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\nbusy"
            }
            Self::NotFound => {
                "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n"
            }
            Self::BadRequest => {
                "HTTP/1.1 400 Bad Request\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n"
            }
        }
    }
}

/// Maps one raw request line onto a control operation.
///
/// # Errors
///
/// Returns [`MalformedRequest`] for lines the parser rejects; callers answer
/// those with [`HttpReply::BadRequest`].
pub fn classify(request: &str) -> Result<Endpoint, MalformedRequest> {
    parse_request_line(request).map(|line| line.endpoint())
}

/// Outcome of joining the network at startup.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JoinOutcome {
    Ready,
    Failed,
}

/// Delivery seam toward whatever carries the bytes.
pub trait NetworkLink {
    /// Joins the network with the configured credentials. Acquisition does
    /// not start until this reports [`JoinOutcome::Ready`].
    async fn join(&mut self, credentials: &NetworkCredentials) -> JoinOutcome;

    /// Delivers one payload to every connected observer.
    async fn deliver(&mut self, payload: &str);

    /// Sends one HTTP reply to the requesting client.
    async fn reply(&mut self, reply: HttpReply);
}

/// Link for benches without a wire attached; everything lands on the floor.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopLink;

impl NetworkLink for NoopLink {
    async fn join(&mut self, _credentials: &NetworkCredentials) -> JoinOutcome {
        JoinOutcome::Ready
    }

    async fn deliver(&mut self, _payload: &str) {}

    async fn reply(&mut self, _reply: HttpReply) {}
}

/// Publisher-facing handle over the outbound queue.
///
/// Delivery is try-send: when the wire cannot keep up the frame is dropped
/// and counted, and the sampling cadence is unaffected.
pub struct TransportHandle<'a> {
    outbound: OutboundSender<'a>,
}

impl<'a> TransportHandle<'a> {
    /// Wraps a sender for the outbound frame queue.
    #[must_use]
    pub const fn new(outbound: OutboundSender<'a>) -> Self {
        Self { outbound }
    }
}

impl TelemetryOutlet for TransportHandle<'_> {
    fn broadcast_text(&mut self, payload: &str) {
        let mut frame = FrameBuffer::new();
        if frame.push_str(payload).is_err() || self.outbound.try_send(frame).is_err() {
            status::record_dropped_frame();
        }
    }

    fn observer_count(&self) -> usize {
        status::observer_count()
    }
}

/// The serve loop: consumes inbound events and outbound frames, owns the
/// discharge sequence and the re-broadcast path.
///
/// A drain in progress is a deadline the loop schedules around, not an await
/// it disappears into: frames keep flowing to observers for the whole window,
/// and a second discharge request arriving mid-drain is answered busy.
pub struct Server<'a, L: NetworkLink, D: BenchDriver> {
    link: L,
    discharge: DischargeSequence<'a, D>,
    publisher: TelemetryPublisher<'a, TransportHandle<'a>>,
    events: EventReceiver<'a>,
    outbound: OutboundReceiver<'a>,
    drain_until: Option<Instant>,
}

impl<'a, L: NetworkLink, D: BenchDriver> Server<'a, L, D> {
    pub const fn new(
        link: L,
        discharge: DischargeSequence<'a, D>,
        publisher: TelemetryPublisher<'a, TransportHandle<'a>>,
        events: EventReceiver<'a>,
        outbound: OutboundReceiver<'a>,
    ) -> Self {
        Self {
            link,
            discharge,
            publisher,
            events,
            outbound,
            drain_until: None,
        }
    }

    /// Runs the serve loop forever.
    pub async fn run(mut self) -> ! {
        loop {
            if let Some(deadline) = self.drain_until {
                match select3(
                    self.events.receive(),
                    self.outbound.receive(),
                    Timer::at(deadline),
                )
                .await
                {
                    Either3::First(event) => self.handle(event).await,
                    Either3::Second(frame) => self.link.deliver(frame.as_str()).await,
                    Either3::Third(()) => {
                        // The requester learns the bench is idle again only
                        // when it actually is.
                        self.discharge.finish();
                        self.drain_until = None;
                        self.link.reply(HttpReply::Ok).await;
                    }
                }
            } else {
                match select(self.events.receive(), self.outbound.receive()).await {
                    Either::First(event) => self.handle(event).await,
                    Either::Second(frame) => self.link.deliver(frame.as_str()).await,
                }
            }
        }
    }

    async fn handle(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::DischargeRequest => match self.discharge.begin() {
                Ok(()) => {
                    self.drain_until = Some(Instant::now() + to_embassy(self.discharge.drain()));
                }
                Err(_) => self.link.reply(HttpReply::Busy).await,
            },
            ServerEvent::ObserverPing => self.publisher.resend_latest(),
            ServerEvent::ObserverJoined => {
                status::observer_connected();
                emit_observer_log("joined", status::observer_count());
            }
            ServerEvent::ObserverLeft => {
                status::observer_disconnected();
                emit_observer_log("left", status::observer_count());
            }
        }
    }
}

#[cfg(target_os = "none")]
fn emit_observer_log(action: &str, observers: usize) {
    defmt::info!("net:observer {} count={}", action, observers);
}

#[cfg(not(target_os = "none"))]
fn emit_observer_log(action: &str, observers: usize) {
    println!("net:observer {action} count={observers}");
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;
    use core::time::Duration;

    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::Mutex;
    use embassy_time::Duration as TickDuration;

    use super::*;
    use crate::acquisition::discharge::DischargeSequence;
    use crate::acquisition::publisher::TelemetryPublisher;
    use crate::acquisition::{SharedCell, latest_frame, shared_cell};
    use crate::hw::RecordingDriver;

    /// Link that records replies and notes whether each delivery happened
    /// while the discharge flag was up.
    struct CapturingLink<'a> {
        shared: &'a SharedCell,
        replies: &'a RefCell<Vec<HttpReply>>,
        delivered: &'a RefCell<Vec<(String, bool)>>,
    }

    impl NetworkLink for CapturingLink<'_> {
        async fn join(&mut self, _credentials: &NetworkCredentials) -> JoinOutcome {
            JoinOutcome::Ready
        }

        async fn deliver(&mut self, payload: &str) {
            let draining = self.shared.lock(|cell| cell.borrow().discharge_active);
            self.delivered
                .borrow_mut()
                .push((payload.to_string(), draining));
        }

        async fn reply(&mut self, reply: HttpReply) {
            self.replies.borrow_mut().push(reply);
        }
    }

    #[test]
    fn a_discharge_request_mid_drain_is_answered_busy() {
        let shared = shared_cell();
        let driver = Mutex::new(RefCell::new(RecordingDriver::new()));
        let latest = latest_frame();
        let events = EventChannel::new();
        let outbound = OutboundChannel::new();
        let replies = RefCell::new(Vec::new());
        let delivered = RefCell::new(Vec::new());

        let link = CapturingLink {
            shared: &shared,
            replies: &replies,
            delivered: &delivered,
        };
        let discharge = DischargeSequence::new(&shared, &driver, Duration::from_millis(200));
        let publisher = TelemetryPublisher::new(TransportHandle::new(outbound.sender()), &latest);
        let server = Server::new(
            link,
            discharge,
            publisher,
            events.receiver(),
            outbound.receiver(),
        );

        block_on(select(server.run(), async {
            events
                .sender()
                .try_send(ServerEvent::DischargeRequest)
                .unwrap();
            embassy_time::Timer::after(TickDuration::from_millis(50)).await;
            events
                .sender()
                .try_send(ServerEvent::DischargeRequest)
                .unwrap();
            embassy_time::Timer::after(TickDuration::from_millis(400)).await;
        }));

        // The second request is rejected while the first drain holds the
        // gate; the first is acknowledged only once the window elapses.
        assert_eq!(
            replies.borrow().as_slice(),
            &[HttpReply::Busy, HttpReply::Ok]
        );
        assert!(!shared.lock(|cell| cell.borrow().discharge_active));
    }

    #[test]
    fn frames_reach_observers_while_the_drain_window_runs() {
        let shared = shared_cell();
        let driver = Mutex::new(RefCell::new(RecordingDriver::new()));
        let latest = latest_frame();
        let events = EventChannel::new();
        let outbound = OutboundChannel::new();
        let replies = RefCell::new(Vec::new());
        let delivered = RefCell::new(Vec::new());

        let link = CapturingLink {
            shared: &shared,
            replies: &replies,
            delivered: &delivered,
        };
        let discharge = DischargeSequence::new(&shared, &driver, Duration::from_millis(200));
        let publisher = TelemetryPublisher::new(TransportHandle::new(outbound.sender()), &latest);
        let server = Server::new(
            link,
            discharge,
            publisher,
            events.receiver(),
            outbound.receiver(),
        );

        block_on(select(server.run(), async {
            events
                .sender()
                .try_send(ServerEvent::DischargeRequest)
                .unwrap();
            embassy_time::Timer::after(TickDuration::from_millis(50)).await;
            let mut frame = FrameBuffer::new();
            frame
                .push_str("{\"time\":\"10.10\",\"MV\":\"0.00\",\"PV\":\"1.20\"}")
                .unwrap();
            outbound.sender().try_send(frame).unwrap();
            embassy_time::Timer::after(TickDuration::from_millis(400)).await;
        }));

        let delivered = delivered.borrow();
        assert_eq!(delivered.len(), 1);
        assert!(
            delivered[0].1,
            "frame must go out while the drain is still active"
        );
        assert!(delivered[0].0.contains("\"PV\":\"1.20\""));
        assert_eq!(replies.borrow().as_slice(), &[HttpReply::Ok]);
    }

    #[test]
    fn classify_routes_the_discharge_endpoint() {
        assert_eq!(
            classify("GET /discharge HTTP/1.1\r\n"),
            Ok(Endpoint::Discharge)
        );
        assert_eq!(
            classify("POST /discharge HTTP/1.1"),
            Ok(Endpoint::Discharge)
        );
        assert_eq!(classify("GET /index.html HTTP/1.1"), Ok(Endpoint::NotFound));
        assert_eq!(classify("DELETE /discharge HTTP/1.1"), Err(MalformedRequest));
    }

    #[test]
    fn busy_reply_is_distinguishable_from_ok() {
        assert_ne!(HttpReply::Ok.as_str(), HttpReply::Busy.as_str());
        assert!(HttpReply::Ok.as_str().ends_with("ok"));
        assert!(HttpReply::Busy.as_str().contains("409"));
    }

    #[test]
    fn transport_handle_drops_frames_when_the_queue_is_full() {
        let channel = OutboundChannel::new();
        let mut handle = TransportHandle::new(channel.sender());

        let dropped_before = status::dropped_frames();
        for _ in 0..OUTBOUND_QUEUE_DEPTH {
            handle.broadcast_text("{\"time\":\"0.10\",\"MV\":\"0.00\",\"PV\":\"0.00\"}");
        }
        assert_eq!(status::dropped_frames(), dropped_before);

        handle.broadcast_text("{\"time\":\"0.20\",\"MV\":\"0.00\",\"PV\":\"0.00\"}");
        assert_eq!(status::dropped_frames(), dropped_before + 1);

        let queued = channel.try_receive().unwrap();
        assert!(queued.as_str().contains("\"time\":\"0.10\""));
    }
}
