//! Spinner shown while the chat service is working

use colored::Colorize;
use empathy_application::ChatProgress;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Shows one spinner per pending request
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
    draw_target: fn() -> ProgressDrawTarget,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
            draw_target: ProgressDrawTarget::stderr,
        }
    }

    /// Reporter that tracks state but draws nothing
    pub fn hidden() -> Self {
        Self {
            spinner: Mutex::new(None),
            draw_target: ProgressDrawTarget::hidden,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn label(operation: &str) -> &'static str {
        match operation {
            "send_message" => "Thinking...",
            "fetch_conversation" => "Opening conversation...",
            "fetch_history" => "Refreshing history...",
            "login" => "Signing in...",
            "signup" => "Creating account...",
            _ => "Working...",
        }
    }

    pub fn is_active(&self) -> bool {
        self.spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatProgress for ProgressReporter {
    fn on_request_start(&self, operation: &'static str) {
        let pb = ProgressBar::with_draw_target(None, (self.draw_target)());
        pb.set_style(Self::spinner_style());
        pb.set_message(Self::label(operation).dimmed().to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        let previous = self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(pb);
        if let Some(previous) = previous {
            previous.finish_and_clear();
        }
    }

    fn on_request_end(&self, _operation: &'static str, _success: bool) {
        if let Some(pb) = self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_and_clear();
        }
    }
}
