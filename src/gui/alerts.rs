//! Modal alerts raised by background work.

use crate::export::Alerter;
use egui::RichText;
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

/// Sending half: usable from any thread.
pub struct AlertQueue {
    tx: Mutex<Sender<String>>,
    ctx: Mutex<Option<egui::Context>>,
}

/// Receiving half, owned by the app and drawn each frame.
pub struct AlertModal {
    rx: Receiver<String>,
    pending: VecDeque<String>,
}

impl AlertQueue {
    pub fn new() -> (Self, AlertModal) {
        let (tx, rx) = channel();
        (
            Self {
                tx: Mutex::new(tx),
                ctx: Mutex::new(None),
            },
            AlertModal {
                rx,
                pending: VecDeque::new(),
            },
        )
    }

    /// Repaint this context whenever an alert arrives.
    pub fn with_repaint(self, ctx: egui::Context) -> Self {
        *self.ctx.lock().unwrap_or_else(|p| p.into_inner()) = Some(ctx);
        self
    }
}

impl Alerter for AlertQueue {
    fn alert(&self, message: &str) {
        tracing::info!(message, "alert");
        let sent = self
            .tx
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .send(message.to_string());
        if sent.is_err() {
            tracing::warn!(message, "alert window closed, message dropped");
            return;
        }
        if let Some(ctx) = self.ctx.lock().unwrap_or_else(|p| p.into_inner()).as_ref() {
            ctx.request_repaint();
        }
    }
}

impl AlertModal {
    /// Message currently awaiting acknowledgement.
    pub fn current(&mut self) -> Option<&str> {
        self.pending.extend(self.rx.try_iter());
        self.pending.front().map(String::as_str)
    }

    pub fn acknowledge(&mut self) {
        self.pending.pop_front();
    }

    /// Draw the front alert as a modal, one at a time.
    ///
    /// The rest of the window takes no input until the alert is acknowledged
    /// with OK or Escape.
    pub fn show(&mut self, ctx: &egui::Context) {
        let Some(message) = self.current().map(str::to_string) else {
            return;
        };

        let response = egui::Modal::new(egui::Id::new("alert_modal")).show(ctx, |ui| {
            ui.set_width(320.0);
            ui.label(RichText::new("Notice").size(16.0).strong());
            ui.add_space(6.0);
            ui.label(RichText::new(&message).size(14.0));
            ui.add_space(10.0);
            ui.vertical_centered(|ui| ui.button("OK").clicked()).inner
        });

        if response.inner || response.should_close() {
            self.acknowledge();
        }
    }
}
