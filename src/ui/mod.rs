//! The three views: connecting, error, and the active room session.

use eframe::egui;

use crate::input_state::InputState;
use crate::state::ClientState;

/// Indicator shown in the session view while no peer is present.
pub const WAITING_LABEL: &str = "Waiting for a client...";

/// Header line of the session view.
pub fn session_header(port: &str) -> String {
    format!("Listening on port: {port}")
}

/// Body of the error view.
pub fn error_label(reason: &str) -> String {
    format!("Error: {reason}")
}

/// Shown while no room assignment is held.
pub fn render_connecting(ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.4);
            ui.spinner();
            ui.label("Connecting...");
        });
    });
}

/// Shown after the lobby denied the join.
pub fn render_error(ctx: &egui::Context, reason: &str) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.4);
            ui.colored_label(egui::Color32::LIGHT_RED, error_label(reason));
        });
    });
}

/// Active session: header, message log, peer indicator, compose row.
/// Returns true when the compose form was submitted.
pub fn render_session(ctx: &egui::Context, state: &ClientState, input: &mut InputState) -> bool {
    let mut submitted = false;

    let port = state.room.as_ref().map(|r| r.port.as_str()).unwrap_or("");

    egui::TopBottomPanel::top("session_header").show(ctx, |ui| {
        ui.label(session_header(port));
    });

    // Bottom panel: compose row
    egui::TopBottomPanel::bottom("compose_panel").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut input.draft)
                    .desired_width(ui.available_width() - 60.0)
                    .hint_text("Type a message..."),
            );

            // History recall with Up/Down while the field has focus
            if response.has_focus() {
                ui.input(|i| {
                    if i.key_pressed(egui::Key::ArrowUp) {
                        input.history_prev();
                    }
                    if i.key_pressed(egui::Key::ArrowDown) {
                        input.history_next();
                    }
                });
            }

            let send_clicked = ui.button("Send").clicked();
            let enter_pressed =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            if send_clicked || enter_pressed {
                submitted = true;
                response.request_focus();
            }
        });
    });

    // Central panel: message log
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for msg in &state.messages {
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(msg.timestamp.as_str()).weak().monospace());
                        ui.label(&msg.text);
                    });
                }
                if !state.peer_connected {
                    ui.label(egui::RichText::new(WAITING_LABEL).italics().weak());
                }
            });
    });

    submitted
}
