//! Main update loop: event draining and view dispatch

use eframe::egui;
use std::time::Duration;

use super::ChatApp;
use crate::state::View;
use crate::ui;

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process network events
        self.process_events();

        // Request repaint to keep draining backend events
        ctx.request_repaint_after(Duration::from_millis(100));

        match self.state.view() {
            View::Connecting => ui::render_connecting(ctx),
            View::Error => {
                ui::render_error(ctx, self.state.error.as_deref().unwrap_or("unknown"));
            }
            View::Session => {
                let submitted = ui::render_session(ctx, &self.state, &mut self.input);
                if submitted {
                    self.send_draft();
                }
            }
        }
    }
}
