//! Discord REST delivery.

use super::{ChannelDirectory, ChannelRef, Gateway};
use crate::error::GatewayError;
use crate::models::Report;
use crate::report::generate_embed;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Posts messages through the Discord HTTP API.
#[derive(Debug, Clone)]
pub struct DiscordRest {
    client: reqwest::Client,
    rest_url: String,
    token: String,
    channels: ChannelDirectory,
}

impl DiscordRest {
    pub fn new(
        rest_url: &str,
        token: &str,
        channels: ChannelDirectory,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!(
                "DiscordBot (https://github.com/seafbot/seafbot, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;

        Ok(Self {
            client,
            rest_url: rest_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            channels,
        })
    }

    fn messages_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{}/messages", self.rest_url, channel_id)
    }

    async fn post_message(&self, channel: &ChannelRef, body: Value) -> Result<(), GatewayError> {
        let channel_id = self.channels.resolve(channel)?;
        debug!("Posting message to channel {}", channel_id);

        let response = self
            .client
            .post(self.messages_url(&channel_id))
            .header("Authorization", format!("Bot {}", self.token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, body });
        }

        Ok(())
    }
}

/// Message body carrying a single embed.
pub fn embed_message(report: &Report) -> Value {
    json!({ "embeds": [generate_embed(report)] })
}

/// Message body carrying plain text.
pub fn text_message(text: &str) -> Value {
    json!({ "content": text })
}

impl Gateway for DiscordRest {
    async fn send_report(&self, channel: &ChannelRef, report: &Report) -> Result<(), GatewayError> {
        self.post_message(channel, embed_message(report)).await
    }

    async fn send_text(&self, channel: &ChannelRef, text: &str) -> Result<(), GatewayError> {
        self.post_message(channel, text_message(text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportLine;
    use chrono::Utc;

    #[test]
    fn test_messages_url() {
        let rest = DiscordRest::new(
            "https://discord.com/api/v10/",
            "token",
            ChannelDirectory::default(),
        )
        .unwrap();
        assert_eq!(
            rest.messages_url("1001"),
            "https://discord.com/api/v10/channels/1001/messages"
        );
    }

    #[test]
    fn test_message_bodies() {
        let report = Report {
            title: "SEAF Combat Report".to_string(),
            lines: vec![ReportLine {
                title: "Other Planets*".to_string(),
                body: "0 Helldivers taking on various missions across varied sectors."
                    .to_string(),
            }],
            timestamp: Utc::now(),
            footer: "footer".to_string(),
            color: 0x00eaff,
        };

        let body = embed_message(&report);
        assert_eq!(body["embeds"][0]["title"], "SEAF Combat Report");
        assert!(body.get("content").is_none());

        let body = text_message("hi");
        assert_eq!(body["content"], "hi");
    }

    #[tokio::test]
    async fn test_unknown_channel_name_fails_before_request() {
        let rest = DiscordRest::new(
            "http://127.0.0.1:9",
            "token",
            ChannelDirectory::default(),
        )
        .unwrap();

        let err = rest
            .send_text(&ChannelRef::Name("galactic-war-effort".to_string()), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnknownChannel(_)));
    }
}
