//! Telegram Bot API notifier

use crate::core::config::TelegramSettings;
use crate::notify::{NotifyError, Notifier};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends messages with `sendMessage` to every configured chat
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_ids: Vec<i64>,
    parse_mode: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(
        api_url: &str,
        bot_token: &str,
        chat_ids: Vec<i64>,
        parse_mode: Option<String>,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_url.trim_end_matches('/'), bot_token),
            chat_ids,
            parse_mode,
        })
    }

    /// `None` when there is no token or no chat to notify
    pub fn from_settings(settings: &TelegramSettings) -> Result<Option<Self>, NotifyError> {
        match &settings.bot_token {
            Some(token) if !settings.chat_ids.is_empty() => Ok(Some(Self::new(
                &settings.api_url,
                token,
                settings.chat_ids.clone(),
                settings.parse_mode.clone(),
            )?)),
            _ => Ok(None),
        }
    }

    async fn send(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: self.parse_mode.as_deref(),
        };

        // The endpoint embeds the bot token; keep it out of error messages
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = response.status();
        let reply = response.json::<TelegramResponse>().await;

        match reply {
            Ok(reply) if reply.ok && status.is_success() => {
                debug!("Message delivered to chat {}", chat_id);
                Ok(())
            }
            Ok(reply) => Err(NotifyError::Api {
                chat_id,
                description: reply
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status)),
            }),
            Err(_) => Err(NotifyError::Api {
                chat_id,
                description: format!("HTTP {} with an unreadable body", status),
            }),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// Send to every chat; one failing chat does not stop the others
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let mut errors = Vec::new();

        for &chat_id in &self.chat_ids {
            if let Err(e) = self.send(chat_id, text).await {
                warn!("Failed to notify chat {}: {}", chat_id, e);
                errors.push(e);
            }
        }

        let failed = errors.len();
        match errors.into_iter().next() {
            None => Ok(()),
            Some(first) if self.chat_ids.len() == 1 => Err(first),
            Some(first) => Err(NotifyError::Partial {
                failed,
                total: self.chat_ids.len(),
                first: Box::new(first),
            }),
        }
    }
}
