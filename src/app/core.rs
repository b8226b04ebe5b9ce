//! Core ChatApp struct definition and initialization

use crossbeam_channel::{unbounded, Receiver, Sender};
use eframe::egui;
use std::thread;
use tracing::warn;

use crate::backend::run_backend;
use crate::config::{load_settings, save_settings, Settings, DEFAULT_SOCKET_URL};
use crate::input_state::InputState;
use crate::protocol::{BackendAction, UiEvent};
use crate::state::ClientState;
use crate::validation::validate_socket_url;

pub struct ChatApp {
    // Session state (assignment, message log, peer flag, error)
    pub state: ClientState,

    // Input state (draft composition and history)
    pub input: InputState,

    // Persisted settings
    pub settings: Settings,

    // Channels for backend communication
    pub action_tx: Sender<BackendAction>,
    pub event_rx: Receiver<UiEvent>,
}

impl ChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Create channels for UI <-> Backend
        let (action_tx, action_rx) = unbounded::<BackendAction>();
        let (event_tx, event_rx) = unbounded::<UiEvent>();

        // Spawn the backend thread
        thread::spawn(move || {
            run_backend(action_rx, event_tx);
        });

        let mut settings = load_settings().unwrap_or_default();
        if let Err(reason) = validate_socket_url(&settings.socket_url) {
            warn!(%reason, "configured socket URL rejected, using the default");
            settings.socket_url = DEFAULT_SOCKET_URL.to_string();
        }

        match settings.theme.as_str() {
            "light" => cc.egui_ctx.set_visuals(egui::Visuals::light()),
            _ => cc.egui_ctx.set_visuals(egui::Visuals::dark()),
        }

        let app = Self {
            state: ClientState::new(),
            input: InputState::new(),
            settings,
            action_tx,
            event_rx,
        };

        // Kick off the lobby handshake. This is the only automatic
        // connect; nothing re-runs it later in the session.
        let _ = app.action_tx.send(BackendAction::Connect {
            url: app.settings.socket_url.clone(),
        });

        app
    }

    pub(super) fn process_events(&mut self) {
        crate::events::process_events(&self.event_rx, &mut self.state);
    }

    /// Submit the compose form: the draft is cleared up front and pushed
    /// to the room without waiting on the acknowledgement.
    pub(super) fn send_draft(&mut self) {
        if let Some(text) = self.input.take_draft() {
            let _ = self.action_tx.send(BackendAction::SendMessage(text));
        }
    }
}

impl Drop for ChatApp {
    fn drop(&mut self) {
        let _ = self.action_tx.send(BackendAction::Shutdown);
        if let Err(e) = save_settings(&self.settings) {
            warn!(error = %e, "failed to save settings");
        }
    }
}
