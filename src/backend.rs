//! Network backend: owns the websocket and drives the channel handshake.
//!
//! Runs on a dedicated thread with its own Tokio runtime. The UI talks to
//! it exclusively through the [`BackendAction`]/[`UiEvent`] channels; the
//! protocol itself lives in [`Handshake`], a pure frame-in/steps-out state
//! machine so the whole handshake surface is testable without a socket.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::protocol::{BackendAction, UiEvent};
use crate::wire::{self, decode_frame, encode_frame, Frame, ReplyStatus};

/// How long a push waits for its acknowledgement before it is forgotten.
const ACK_WINDOW: Duration = Duration::from_secs(10);
/// Keepalive cadence on the reserved socket topic.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Socket read timeout so the loop keeps polling UI actions.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Chat message event on the room channel.
const EVENT_NEW_MSG: &str = "new_msg";
/// A peer entered the room.
const EVENT_CONNECTED: &str = "connected";
/// The peer left the room.
const EVENT_DISCONNECTED: &str = "disconnected";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where the handshake currently stands.
#[derive(Debug, Clone, PartialEq)]
enum Phase {
    /// No channel joined. Initial state, and the parking state after a
    /// lobby denial or a room join failure (nothing restarts the
    /// handshake from here).
    Idle,
    /// Join sent on the lobby topic, waiting for the assignment reply.
    LobbyJoinSent { join_ref: String },
    /// Join sent on the assigned room topic, waiting for the reply.
    RoomJoinSent { topic: String, join_ref: String },
    /// Room channel is live; chat events flow.
    InRoom { topic: String, join_ref: String },
}

/// One thing the I/O loop must do after feeding a frame to [`Handshake`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Step {
    /// Write this frame to the socket.
    Send(Frame),
    /// Relay this event to the UI.
    Emit(UiEvent),
}

/// The lobby/room handshake as a pure state machine.
pub(crate) struct Handshake {
    phase: Phase,
    refs: u64,
}

impl Handshake {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Idle,
            refs: 0,
        }
    }

    fn next_ref(&mut self) -> String {
        self.refs += 1;
        self.refs.to_string()
    }

    /// Begin the handshake. Returns the lobby join frame to send.
    pub(crate) fn start(&mut self) -> Frame {
        let join_ref = self.next_ref();
        self.phase = Phase::LobbyJoinSent {
            join_ref: join_ref.clone(),
        };
        Frame::join(wire::TOPIC_LOBBY, json!({}), join_ref)
    }

    pub(crate) fn is_in_room(&self) -> bool {
        matches!(self.phase, Phase::InRoom { .. })
    }

    /// Build a `new_msg` push for the room channel, if one is joined.
    pub(crate) fn push_message(&mut self, text: &str) -> Option<Frame> {
        let (topic, join_ref) = match &self.phase {
            Phase::InRoom { topic, join_ref } => (topic.clone(), join_ref.clone()),
            _ => return None,
        };
        let msg_ref = self.next_ref();
        Some(Frame::push(
            &topic,
            EVENT_NEW_MSG,
            json!({ "message": text }),
            join_ref,
            msg_ref,
        ))
    }

    /// Build a socket heartbeat push.
    pub(crate) fn heartbeat(&mut self) -> Frame {
        Frame::heartbeat(self.next_ref())
    }

    /// Advance the machine on an inbound frame.
    pub(crate) fn on_frame(&mut self, frame: &Frame) -> Vec<Step> {
        match self.phase.clone() {
            Phase::Idle => Vec::new(),
            Phase::LobbyJoinSent { join_ref } => self.on_lobby_frame(frame, &join_ref),
            Phase::RoomJoinSent { topic, join_ref } => {
                self.on_room_join_frame(frame, &topic, &join_ref)
            }
            Phase::InRoom { topic, .. } => self.on_session_frame(frame, &topic),
        }
    }

    fn on_lobby_frame(&mut self, frame: &Frame, join_ref: &str) -> Vec<Step> {
        if frame.topic != wire::TOPIC_LOBBY
            || frame.event != wire::EVENT_REPLY
            || frame.msg_ref.as_deref() != Some(join_ref)
        {
            return Vec::new();
        }
        let Some((status, response)) = frame.reply() else {
            warn!("lobby reply without a status, ignoring");
            return Vec::new();
        };

        match status {
            ReplyStatus::Ok => {
                let port = response.get("port").and_then(scalar_to_string);
                let token = response
                    .get("token")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                let (Some(port), Some(token)) = (port, token) else {
                    warn!("lobby assignment missing port or token, ignoring");
                    return Vec::new();
                };

                // The lobby is single-use: leave it and go straight for
                // the assigned room.
                let leave = Frame::leave(wire::TOPIC_LOBBY, join_ref.to_owned(), self.next_ref());
                let topic = wire::room_topic(&port);
                let room_join_ref = self.next_ref();
                let join = Frame::join(&topic, json!({ "token": token }), room_join_ref.clone());
                self.phase = Phase::RoomJoinSent {
                    topic,
                    join_ref: room_join_ref,
                };
                info!(%port, "room assigned by lobby");

                vec![
                    Step::Emit(UiEvent::RoomAssigned { port, token }),
                    Step::Send(leave),
                    Step::Send(join),
                ]
            }
            ReplyStatus::Error => {
                let reason = response
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_owned();
                warn!(%reason, "lobby join denied");
                self.phase = Phase::Idle;
                vec![Step::Emit(UiEvent::LobbyDenied { reason })]
            }
        }
    }

    fn on_room_join_frame(&mut self, frame: &Frame, topic: &str, join_ref: &str) -> Vec<Step> {
        if frame.topic != topic {
            return Vec::new();
        }
        if frame.event == wire::EVENT_REPLY && frame.msg_ref.as_deref() == Some(join_ref) {
            return match frame.reply() {
                Some((ReplyStatus::Ok, _)) => {
                    debug!(%topic, "room channel joined");
                    self.phase = Phase::InRoom {
                        topic: topic.to_owned(),
                        join_ref: join_ref.to_owned(),
                    };
                    Vec::new()
                }
                Some((ReplyStatus::Error, _)) | None => self.fail_room_join(topic, join_ref),
            };
        }
        if frame.event == wire::EVENT_ERROR || frame.event == wire::EVENT_CLOSE {
            return self.fail_room_join(topic, join_ref);
        }
        Vec::new()
    }

    fn fail_room_join(&mut self, topic: &str, join_ref: &str) -> Vec<Step> {
        warn!(%topic, "room join failed, leaving channel and dropping the assignment");
        let leave = Frame::leave(topic, join_ref.to_owned(), self.next_ref());
        self.phase = Phase::Idle;
        vec![Step::Send(leave), Step::Emit(UiEvent::RoomJoinFailed)]
    }

    fn on_session_frame(&mut self, frame: &Frame, topic: &str) -> Vec<Step> {
        if frame.topic != topic {
            return Vec::new();
        }
        match frame.event.as_str() {
            EVENT_NEW_MSG => {
                let Some(message) = frame.payload.get("message").and_then(Value::as_str) else {
                    warn!("new_msg without a message field, ignoring");
                    return Vec::new();
                };
                vec![Step::Emit(UiEvent::MessageReceived(message.to_owned()))]
            }
            EVENT_CONNECTED => vec![Step::Emit(UiEvent::PeerConnected)],
            EVENT_DISCONNECTED => vec![Step::Emit(UiEvent::PeerDisconnected)],
            wire::EVENT_ERROR => {
                // A crashed room channel after join is not surfaced; the
                // view simply goes stale.
                warn!(%topic, "room channel errored");
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

/// Outstanding pushes awaiting acknowledgement.
///
/// Replies are matched only to retire the entry; their content is never
/// inspected. Entries past their window are dropped, and a late reply to
/// a dropped entry falls through to [`Handshake::on_frame`], which
/// ignores it.
pub(crate) struct PushLedger {
    pending: HashMap<String, Instant>,
}

impl PushLedger {
    pub(crate) fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Record a push sent at `now`; its window closes [`ACK_WINDOW`] later.
    pub(crate) fn track(&mut self, msg_ref: String, now: Instant) {
        self.pending.insert(msg_ref, now + ACK_WINDOW);
    }

    /// Retire the entry for a reply ref. Returns whether one was pending.
    pub(crate) fn acknowledge(&mut self, msg_ref: &str) -> bool {
        self.pending.remove(msg_ref).is_some()
    }

    /// Drop entries whose window has closed; returns how many.
    pub(crate) fn expire(&mut self, now: Instant) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, deadline| *deadline > now);
        before - self.pending.len()
    }
}

/// Append the serializer version the endpoint expects, if absent.
pub(crate) fn ensure_vsn(url: &str) -> String {
    if url.contains("vsn=") {
        url.to_owned()
    } else if url.contains('?') {
        format!("{url}&vsn=2.0.0")
    } else {
        format!("{url}?vsn=2.0.0")
    }
}

pub fn run_backend(action_rx: Receiver<BackendAction>, event_tx: Sender<UiEvent>) {
    // Create a Tokio runtime for this thread
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            warn!(error = %e, "failed to create Tokio runtime, backend unavailable");
            return;
        }
    };

    rt.block_on(async move {
        let mut socket: Option<Socket> = None;
        let mut handshake = Handshake::new();
        let mut ledger = PushLedger::new();
        let mut last_heartbeat = Instant::now();

        loop {
            // Check for actions from the UI (non-blocking)
            while let Ok(action) = action_rx.try_recv() {
                match action {
                    BackendAction::Connect { url } => {
                        let url = ensure_vsn(&url);
                        info!(%url, "connecting");
                        match connect_async(url.as_str()).await {
                            Ok((ws, _)) => {
                                socket = Some(ws);
                                handshake = Handshake::new();
                                ledger = PushLedger::new();
                                last_heartbeat = Instant::now();
                                let join = handshake.start();
                                if let Some(ws) = socket.as_mut() {
                                    send_frame(ws, &join).await;
                                }
                            }
                            Err(e) => warn!(error = %e, "socket connect failed"),
                        }
                    }

                    BackendAction::SendMessage(text) => {
                        if !handshake.is_in_room() {
                            debug!("dropping message sent outside a room session");
                        } else if let Some(frame) = handshake.push_message(&text) {
                            if let Some(msg_ref) = frame.msg_ref.clone() {
                                ledger.track(msg_ref, Instant::now());
                            }
                            if let Some(ws) = socket.as_mut() {
                                send_frame(ws, &frame).await;
                            }
                        }
                    }

                    BackendAction::Shutdown => {
                        if let Some(mut ws) = socket.take() {
                            let _ = ws.close(None).await;
                        }
                        return;
                    }
                }
            }

            if socket.is_some() && last_heartbeat.elapsed() >= HEARTBEAT_INTERVAL {
                last_heartbeat = Instant::now();
                let beat = handshake.heartbeat();
                if let Some(msg_ref) = beat.msg_ref.clone() {
                    ledger.track(msg_ref, Instant::now());
                }
                if let Some(ws) = socket.as_mut() {
                    send_frame(ws, &beat).await;
                }
            }

            let expired = ledger.expire(Instant::now());
            if expired > 0 {
                debug!(expired, "pushes passed their acknowledgement window unanswered");
            }

            // Read from the socket (with a short timeout so we can keep
            // checking for actions)
            if let Some(ws) = socket.as_mut() {
                match timeout(READ_TIMEOUT, ws.next()).await {
                    Ok(Some(Ok(Message::Text(text)))) => match decode_frame(text.as_str()) {
                        Ok(frame) => {
                            let acked = frame.event == wire::EVENT_REPLY
                                && frame
                                    .msg_ref
                                    .as_deref()
                                    .is_some_and(|r| ledger.acknowledge(r));
                            if acked {
                                // Reply to a fire-and-forget push; unobserved.
                                debug!(msg_ref = ?frame.msg_ref, "push acknowledged");
                                continue;
                            }
                            for step in handshake.on_frame(&frame) {
                                match step {
                                    Step::Send(out) => send_frame(ws, &out).await,
                                    Step::Emit(event) => {
                                        let _ = event_tx.send(event);
                                    }
                                }
                            }
                        }
                        Err(e) => warn!(error = %e, "ignoring malformed frame"),
                    },
                    Ok(Some(Ok(Message::Ping(data)))) => {
                        let _ = ws.send(Message::Pong(data)).await;
                    }
                    Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {
                        warn!("socket closed by server");
                        socket = None;
                    }
                    Ok(Some(Ok(_))) => {
                        // Binary and pong frames carry nothing for us.
                    }
                    Ok(Some(Err(e))) => {
                        warn!(error = %e, "socket read failed");
                        socket = None;
                    }
                    Err(_) => {
                        // Read timeout, loop back for actions.
                    }
                }
            } else {
                // No connection, sleep a bit to avoid busy-looping
                tokio::time::sleep(READ_TIMEOUT).await;
            }
        }
    });
}

async fn send_frame(socket: &mut Socket, frame: &Frame) {
    debug!(topic = %frame.topic, event = %frame.event, "sending frame");
    if let Err(e) = socket.send(Message::Text(encode_frame(frame).into())).await {
        warn!(error = %e, "socket send failed");
    }
}

/// The lobby reports the assigned port as a string; accept a bare number
/// too rather than dropping the assignment.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
