//! Session state, separated from UI logic.
//!
//! `ClientState` holds all data the views render from: the room
//! assignment, the message log, the peer-presence flag, and the terminal
//! error. UI code receives it as a parameter rather than owning it.

use chrono::Local;

/// The (room identifier, access token) pair handed out by the lobby.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomAssignment {
    pub port: String,
    pub token: String,
}

/// One line of the room's message log.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    /// Local receive time, `HH:MM:SS`.
    pub timestamp: String,
    pub text: String,
}

impl ChatMessage {
    /// Stamp a message with the current local time.
    pub fn now(text: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            text,
        }
    }
}

/// Which of the three mutually exclusive views to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Connecting,
    Error,
    Session,
}

/// All session data owned by the UI thread.
#[derive(Default)]
pub struct ClientState {
    /// Active room assignment, once the lobby handshake has completed.
    pub room: Option<RoomAssignment>,

    /// Append-only message log; insertion order is display order. Grows
    /// without bound for the lifetime of the session.
    pub messages: Vec<ChatMessage>,

    /// Whether a peer is present in the room. Display hint only.
    pub peer_connected: bool,

    /// Lobby denial reason. Terminal for the session.
    pub error: Option<String>,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the view. The error wins over everything; otherwise a held
    /// assignment means the session view.
    pub fn view(&self) -> View {
        if self.error.is_some() {
            View::Error
        } else if self.room.is_some() {
            View::Session
        } else {
            View::Connecting
        }
    }

    pub fn assign_room(&mut self, port: String, token: String) {
        self.room = Some(RoomAssignment { port, token });
    }

    /// Drop the assignment after a failed room join. The peer flag resets
    /// with it; the message log stays.
    pub fn clear_room(&mut self) {
        self.room = None;
        self.peer_connected = false;
    }

    pub fn push_message(&mut self, text: String) {
        self.messages.push(ChatMessage::now(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_connecting() {
        let state = ClientState::new();
        assert_eq!(state.view(), View::Connecting);
        assert!(state.room.is_none());
        assert!(state.messages.is_empty());
        assert!(!state.peer_connected);
    }

    #[test]
    fn test_assignment_selects_session_view() {
        let mut state = ClientState::new();
        state.assign_room("4000".into(), "abc".into());
        assert_eq!(state.view(), View::Session);
        assert_eq!(state.room.as_ref().unwrap().port, "4000");
    }

    #[test]
    fn test_error_view_wins_over_assignment() {
        let mut state = ClientState::new();
        state.assign_room("4000".into(), "abc".into());
        state.error = Some("full".into());
        assert_eq!(state.view(), View::Error);
    }

    #[test]
    fn test_clear_room_returns_to_connecting_and_keeps_log() {
        let mut state = ClientState::new();
        state.assign_room("4000".into(), "abc".into());
        state.peer_connected = true;
        state.push_message("hi".into());

        state.clear_room();
        assert_eq!(state.view(), View::Connecting);
        assert!(!state.peer_connected);
        assert_eq!(state.messages.len(), 1);
    }

    #[test]
    fn test_message_log_preserves_order() {
        let mut state = ClientState::new();
        for i in 0..5 {
            state.push_message(format!("msg{i}"));
        }
        let texts: Vec<&str> = state.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["msg0", "msg1", "msg2", "msg3", "msg4"]);
    }
}
