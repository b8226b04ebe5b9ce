/// Actions sent from the UI to the Backend
#[derive(Debug, Clone)]
pub enum BackendAction {
    /// Open the socket and start the lobby handshake
    Connect { url: String },
    /// Push the given text as a `new_msg` on the room channel
    SendMessage(String),
    /// Close the socket and stop the backend loop
    Shutdown,
}

/// Events sent from the Backend to the UI
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// The lobby handed out a room assignment
    RoomAssigned { port: String, token: String },
    /// The lobby refused the join; terminal for this session
    LobbyDenied { reason: String },
    /// The room channel join failed; the assignment must be dropped
    RoomJoinFailed,
    /// A chat message arrived on the room channel
    MessageReceived(String),
    /// A peer is present in the room
    PeerConnected,
    /// The peer left the room
    PeerDisconnected,
}
