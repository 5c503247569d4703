//! Progress notification port
//!
//! Lets the presentation layer show activity while a request is waiting on
//! the network.

/// Callback for request progress
///
/// Implementations live in the presentation layer (spinner, status line).
pub trait ChatProgress: Send + Sync {
    /// Called right before a request is issued
    fn on_request_start(&self, operation: &'static str);

    /// Called once the request resolved, successfully or not
    fn on_request_end(&self, operation: &'static str, success: bool);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ChatProgress for NoProgress {
    fn on_request_start(&self, _operation: &'static str) {}
    fn on_request_end(&self, _operation: &'static str, _success: bool) {}
}
