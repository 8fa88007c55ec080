//! REST adapter for the remote platform's delete-message operation

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{DeleteError, MessageDeleter, Result};

/// REST client configuration
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub api_base: String,
    pub bot_token: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            api_base: "https://discord.com/api/v10".to_string(),
            bot_token: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: "lethe/0.1.0".to_string(),
        }
    }
}

/// Deletes messages through the platform's HTTP API. No retry: the tick
/// runner treats any failure as terminal for the entry.
pub struct RestDeleter {
    client: Client,
    config: RestConfig,
}

impl RestDeleter {
    pub fn new(config: RestConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DeleteError::Request(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn delete_url(&self, channel_id: &str, message_id: &str) -> String {
        format!(
            "{}/channels/{}/messages/{}",
            self.config.api_base.trim_end_matches('/'),
            channel_id,
            message_id
        )
    }
}

#[async_trait]
impl MessageDeleter for RestDeleter {
    async fn delete(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let url = self.delete_url(channel_id, message_id);
        debug!(channel_id, message_id, "Issuing remote delete");

        let response = self
            .client
            .delete(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bot {}", self.config.bot_token),
            )
            .send()
            .await
            .map_err(|e| DeleteError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body: Bytes = response.bytes().await.unwrap_or_default();
        Err(DeleteError::Rejected {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_url_joins_path_segments() {
        let deleter = RestDeleter::new(RestConfig::default()).unwrap();
        assert_eq!(
            deleter.delete_url("c1", "m1"),
            "https://discord.com/api/v10/channels/c1/messages/m1"
        );
    }

    #[test]
    fn delete_url_tolerates_trailing_slash() {
        let config = RestConfig {
            api_base: "http://localhost:9999/api/".to_string(),
            ..RestConfig::default()
        };
        let deleter = RestDeleter::new(config).unwrap();
        assert_eq!(
            deleter.delete_url("c1", "m1"),
            "http://localhost:9999/api/channels/c1/messages/m1"
        );
    }
}
