//! Backend event processing: drains `UiEvent`s into the session state.

use crossbeam_channel::Receiver;
use tracing::{info, warn};

use crate::protocol::UiEvent;
use crate::state::ClientState;

/// Process all pending events from the backend.
pub fn process_events(event_rx: &Receiver<UiEvent>, state: &mut ClientState) {
    // Drain everything queued since the previous frame
    while let Ok(event) = event_rx.try_recv() {
        match event {
            UiEvent::RoomAssigned { port, token } => {
                info!(%port, "room assigned");
                state.assign_room(port, token);
            }

            UiEvent::LobbyDenied { reason } => {
                warn!(%reason, "lobby join denied");
                state.error = Some(reason);
            }

            UiEvent::RoomJoinFailed => {
                warn!("room join failed, assignment dropped");
                state.clear_room();
            }

            UiEvent::MessageReceived(text) => state.push_message(text),

            UiEvent::PeerConnected => state.peer_connected = true,

            UiEvent::PeerDisconnected => state.peer_connected = false,
        }
    }
}
