// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Drift notifications.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::MonitorError;

/// A message published when a run detects drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub topic: String,
    /// The drift report as JSON.
    pub body: String,
}

/// Publishes drift notifications.
///
/// Delivery guarantees and retries belong to the implementation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, message: NotificationMessage) -> Result<(), MonitorError>;

    fn name(&self) -> &str;
}

/// Sends messages over a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<NotificationMessage>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::Sender<NotificationMessage>) -> Self {
        Self { sender }
    }

    /// A notifier and the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NotificationMessage>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn publish(&self, message: NotificationMessage) -> Result<(), MonitorError> {
        self.sender
            .send(message)
            .await
            .map_err(|e| MonitorError::Notification(e.to_string()))
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// Writes messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, message: NotificationMessage) -> Result<(), MonitorError> {
        warn!(topic = %message.topic, "drift detected");
        info!(topic = %message.topic, body = %message.body, "drift notification");
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> NotificationMessage {
        NotificationMessage {
            topic: "drift-alerts".to_string(),
            body: r#"{"any_drift":true}"#.to_string(),
        }
    }

    #[tokio::test]
    async fn test_channel_notifier_delivers() {
        let (notifier, mut receiver) = ChannelNotifier::channel(4);
        notifier.publish(message()).await.unwrap();
        assert_eq!(receiver.recv().await, Some(message()));
    }

    #[tokio::test]
    async fn test_channel_notifier_closed_receiver() {
        let (notifier, receiver) = ChannelNotifier::channel(1);
        drop(receiver);
        let err = notifier.publish(message()).await.unwrap_err();
        assert!(matches!(err, MonitorError::Notification(_)));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        assert!(LogNotifier.publish(message()).await.is_ok());
        assert_eq!(LogNotifier.name(), "log");
    }
}
