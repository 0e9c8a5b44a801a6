//! Discord webhook notifier.
//!
//! One webhook per channel. A channel with no webhook is not accepted, so
//! the router skips it instead of counting it as delivered.

use async_trait::async_trait;
use serde::Serialize;

use super::truncate_chars;
use crate::config::DiscordConfig;
use crate::routing::{NotificationSink, NotifyChannel, RoutingPayload};

/// Discord rejects embed field values longer than this.
const FIELD_VALUE_LIMIT: usize = 1024;
const TITLE_LIMIT: usize = 256;

const LOG_COLOR: u32 = 0x00cc99;
const ALERT_COLOR: u32 = 0xff3333;

// ── Wire format ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct WebhookMessage {
    pub content: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &'static str, value: &str, inline: bool) -> Self {
        let value = if value.trim().is_empty() { "—" } else { value };
        Self {
            name,
            value: truncate_chars(value, FIELD_VALUE_LIMIT),
            inline,
        }
    }
}

/// Build the webhook message for one channel.
pub fn format_message(channel: NotifyChannel, payload: &RoutingPayload) -> WebhookMessage {
    let d = &payload.distillation;
    let (content, color) = match channel {
        NotifyChannel::Global => ("🧠 Posted in `#🧠-logs-global`", LOG_COLOR),
        NotifyChannel::Alert => ("🔔 Posted in `#🚨-alerts`", ALERT_COLOR),
    };

    let mut fields = vec![
        EmbedField::new("Type", d.entry_type.label(), true),
        EmbedField::new("Tags", &d.tags.join(", "), true),
        EmbedField::new("Confidence", d.confidence.capitalized(), true),
    ];
    if let Some(note) = &d.confidence_note {
        fields.push(EmbedField::new("Confidence Note", note, false));
    }
    let local = payload.timestamp.with_timezone(&chrono::Local);
    fields.push(EmbedField::new("Source", &payload.source, true));
    fields.push(EmbedField::new(
        "Timestamp",
        &local.format("%Y-%m-%d %H:%M:%S").to_string(),
        false,
    ));
    fields.push(EmbedField::new("Raw Input", &payload.raw_input, false));

    WebhookMessage {
        content: content.to_string(),
        embeds: vec![Embed {
            title: truncate_chars(payload.title(), TITLE_LIMIT),
            color,
            fields,
        }],
    }
}

// ── Notifier ─────────────────────────────────────────────────────

pub struct DiscordNotifier {
    global_webhook: Option<String>,
    alert_webhook: Option<String>,
    http: reqwest::Client,
}

impl DiscordNotifier {
    pub fn from_config(config: &DiscordConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            global_webhook: config.global_webhook.clone(),
            alert_webhook: config.alert_webhook.clone(),
            http,
        })
    }

    fn webhook_for(&self, channel: NotifyChannel) -> Option<&str> {
        match channel {
            NotifyChannel::Global => self.global_webhook.as_deref(),
            NotifyChannel::Alert => self.alert_webhook.as_deref(),
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    fn accepts(&self, channel: NotifyChannel) -> bool {
        self.webhook_for(channel).is_some()
    }

    async fn notify(&self, channel: NotifyChannel, payload: &RoutingPayload) -> anyhow::Result<()> {
        let Some(url) = self.webhook_for(channel) else {
            anyhow::bail!("No Discord webhook configured for the {} channel", channel.label());
        };

        let resp = self
            .http
            .post(url)
            .json(&format_message(channel, payload))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Discord webhook failed ({status}): {body}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distill::Confidence;
    use crate::routing::testing::payload_with;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn field<'a>(message: &'a WebhookMessage, name: &str) -> Option<&'a EmbedField> {
        message.embeds[0].fields.iter().find(|f| f.name == name)
    }

    #[test]
    fn global_message_layout() {
        let message = format_message(NotifyChannel::Global, &payload_with(Confidence::High));
        assert!(message.content.contains("logs-global"));
        let embed = &message.embeds[0];
        assert_eq!(embed.title, "He wants to learn the cello.");
        assert_eq!(embed.color, 0x00cc99);
        assert_eq!(field(&message, "Type").unwrap().value, "Goal");
        assert_eq!(field(&message, "Tags").unwrap().value, "Music, Cello");
        assert_eq!(field(&message, "Confidence").unwrap().value, "High");
        assert!(field(&message, "Confidence Note").is_none());
        assert_eq!(field(&message, "Source").unwrap().value, "CLI");
        assert!(field(&message, "Timestamp").is_some());
        assert_eq!(
            field(&message, "Raw Input").unwrap().value,
            "I kind of want to learn cello"
        );
    }

    #[test]
    fn alert_message_carries_note_and_alert_color() {
        let message = format_message(NotifyChannel::Alert, &payload_with(Confidence::Low));
        assert!(message.content.contains("alerts"));
        assert_eq!(message.embeds[0].color, 0xff3333);
        assert_eq!(field(&message, "Confidence").unwrap().value, "Low");
        assert_eq!(field(&message, "Confidence Note").unwrap().value, "Tentative.");
    }

    #[test]
    fn long_raw_input_is_truncated() {
        let mut payload = payload_with(Confidence::High);
        payload.raw_input = "y".repeat(3000);
        let message = format_message(NotifyChannel::Global, &payload);
        assert_eq!(
            field(&message, "Raw Input").unwrap().value.chars().count(),
            FIELD_VALUE_LIMIT
        );
    }

    #[tokio::test]
    async fn posts_to_channel_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/alerts"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::from_config(&DiscordConfig {
            global_webhook: Some(format!("{}/global", server.uri())),
            alert_webhook: Some(format!("{}/alerts", server.uri())),
        })
        .unwrap();
        notifier
            .notify(NotifyChannel::Alert, &payload_with(Confidence::Medium))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["embeds"][0]["color"], 0xff3333);
        assert_eq!(body["embeds"][0]["fields"][0]["inline"], true);
    }

    #[tokio::test]
    async fn webhook_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let notifier = DiscordNotifier::from_config(&DiscordConfig {
            global_webhook: Some(server.uri()),
            alert_webhook: None,
        })
        .unwrap();
        let err = notifier
            .notify(NotifyChannel::Global, &payload_with(Confidence::High))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("429"));
    }

    #[tokio::test]
    async fn unconfigured_webhook_is_not_accepted() {
        let notifier = DiscordNotifier::from_config(&DiscordConfig {
            global_webhook: Some("https://discord.test/global".into()),
            alert_webhook: None,
        })
        .unwrap();
        assert!(notifier.accepts(NotifyChannel::Global));
        assert!(!notifier.accepts(NotifyChannel::Alert));
        assert!(notifier
            .notify(NotifyChannel::Alert, &payload_with(Confidence::Low))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn router_reports_unconfigured_webhooks_as_skipped() {
        use crate::routing::testing::RecordingDocuments;
        use crate::routing::{Delivery, Router};
        use std::sync::Arc;

        let router = Router::new(
            Arc::new(RecordingDocuments::default()),
            Arc::new(DiscordNotifier::from_config(&DiscordConfig::default()).unwrap()),
        );
        let report = router.route(&payload_with(Confidence::Low)).await.unwrap();
        assert_eq!(report.global, Delivery::Skipped);
        assert_eq!(report.alert, Delivery::Skipped);
    }
}
