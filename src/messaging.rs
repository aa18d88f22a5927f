//! Messaging collaborator interface.
//!
//! The wire protocol of the provider is out of scope: the scheduler only
//! needs `send(recipient, display_name, body) -> bool`. A timeout inside the
//! provider surfaces as `false` and is treated like any other delivery
//! failure.

use async_trait::async_trait;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Deliver `body` to `recipient`. Returns false on failure; no partial
    /// delivery state is exposed.
    async fn send(&self, recipient: &str, display_name: &str, body: &str) -> bool;
}

/// Simulation sender: logs the rendered message and reports success. Used
/// in demo mode where no real provider is configured.
#[derive(Debug, Default)]
pub struct ConsoleSender;

#[async_trait]
impl MessageSender for ConsoleSender {
    async fn send(&self, recipient: &str, display_name: &str, body: &str) -> bool {
        info!("message to {display_name} <{recipient}>:\n{body}");
        true
    }
}

/// A message captured by [`RecordingSender`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub recipient: String,
    pub display_name: String,
    pub body: String,
}

/// Test double that records every send and can be switched to fail.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl RecordingSender {
    pub fn new() -> Self {
        RecordingSender::default()
    }

    /// Make subsequent sends report failure (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, recipient: &str, display_name: &str, body: &str) -> bool {
        if self.failing.load(Ordering::Relaxed) {
            return false;
        }
        self.sent.lock().unwrap().push(SentMessage {
            recipient: recipient.to_string(),
            display_name: display_name.to_string(),
            body: body.to_string(),
        });
        true
    }
}
