//! Draft composition and submit history for the compose row.

use crate::validation::sanitize_message;

/// Input state for the compose field.
#[derive(Default)]
pub struct InputState {
    /// Message being composed
    pub draft: String,

    /// Previously submitted messages, oldest first
    pub history: Vec<String>,

    /// Position while navigating history (None = not navigating)
    history_pos: Option<usize>,

    /// Draft saved when history navigation begins
    saved_draft: Option<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the draft for sending. The field is cleared unconditionally;
    /// blank drafts return None and are not recorded in history.
    pub fn take_draft(&mut self) -> Option<String> {
        let text = sanitize_message(&self.draft);
        self.draft.clear();
        self.history_pos = None;
        self.saved_draft = None;

        if text.trim().is_empty() {
            return None;
        }
        if self.history.last() != Some(&text) {
            self.history.push(text.clone());
        }
        Some(text)
    }

    /// Recall the previous history entry into the draft.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => {
                self.saved_draft = Some(self.draft.clone());
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(p) => p - 1,
        };
        self.history_pos = Some(pos);
        self.draft = self.history[pos].clone();
    }

    /// Move forward in history, restoring the saved draft past the end.
    pub fn history_next(&mut self) {
        match self.history_pos {
            None => {}
            Some(p) if p + 1 < self.history.len() => {
                self.history_pos = Some(p + 1);
                self.draft = self.history[p + 1].clone();
            }
            Some(_) => {
                self.history_pos = None;
                self.draft = self.saved_draft.take().unwrap_or_default();
            }
        }
    }
}
