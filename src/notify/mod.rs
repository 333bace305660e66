//! Operator notifications

pub mod telegram;

use crate::core::config::TelegramSettings;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub use telegram::TelegramNotifier;

/// Error types for sending notifications
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram rejected message for chat {chat_id}: {description}")]
    Api { chat_id: i64, description: String },

    #[error("{failed} of {total} chats were not notified: {first}")]
    Partial {
        failed: usize,
        total: usize,
        #[source]
        first: Box<NotifyError>,
    },
}

/// Sends a rendered message to whoever should hear about deployments
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// Notifier used when no bot token or chat is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        info!("Notifications disabled, not sending: {}", text);
        Ok(())
    }
}

/// Pick the notifier for the configured Telegram settings
pub fn from_settings(settings: &TelegramSettings) -> Result<Arc<dyn Notifier>, NotifyError> {
    match TelegramNotifier::from_settings(settings)? {
        Some(notifier) => Ok(Arc::new(notifier)),
        None => Ok(Arc::new(DisabledNotifier)),
    }
}
