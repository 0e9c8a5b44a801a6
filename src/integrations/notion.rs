//! Notion database sink.
//!
//! Each distillation becomes one page in the configured database. The
//! database needs these properties: Name (title), Raw Input (text),
//! Confidence (select), Confidence Notes (text), Type (select),
//! Tags (multi-select), Source (select), Timestamp (date).

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::truncate_chars;
use crate::config::NotionConfig;
use crate::routing::{DocumentSink, RoutingPayload};

/// Notion caps a single rich-text object at 2000 characters.
const RICH_TEXT_LIMIT: usize = 2000;

pub struct NotionSink {
    api_base: String,
    version: String,
    secret: String,
    database_id: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct CreatedPage {
    id: String,
}

impl NotionSink {
    pub fn from_config(config: &NotionConfig) -> anyhow::Result<Self> {
        let secret = config
            .secret
            .clone()
            .context("NOTION_SECRET is not configured")?;
        let database_id = config
            .database_id
            .clone()
            .context("NOTION_DATABASE_ID is not configured")?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            secret,
            database_id,
            http,
        })
    }

    fn pages_url(&self) -> String {
        format!("{}/pages", self.api_base)
    }

    /// Request body for `POST /pages`.
    pub fn page_body(&self, payload: &RoutingPayload) -> Value {
        let d = &payload.distillation;
        let notes = match &d.confidence_note {
            Some(note) => vec![text_object(note)],
            None => Vec::new(),
        };
        let tags: Vec<Value> = d.tags.iter().map(|t| json!({ "name": t })).collect();

        json!({
            "parent": { "database_id": self.database_id },
            "properties": {
                "Name": { "title": [text_object(payload.title())] },
                "Raw Input": { "rich_text": [text_object(&payload.raw_input)] },
                "Confidence": { "select": { "name": d.confidence.capitalized() } },
                "Confidence Notes": { "rich_text": notes },
                "Type": { "select": { "name": d.entry_type.label() } },
                "Tags": { "multi_select": tags },
                "Source": { "select": { "name": payload.source } },
                "Timestamp": { "date": { "start": payload.timestamp_iso() } },
            }
        })
    }
}

fn text_object(content: &str) -> Value {
    json!({ "text": { "content": truncate_chars(content, RICH_TEXT_LIMIT) } })
}

#[async_trait]
impl DocumentSink for NotionSink {
    fn name(&self) -> &str {
        "notion"
    }

    async fn create(&self, payload: &RoutingPayload) -> anyhow::Result<String> {
        let resp = self
            .http
            .post(self.pages_url())
            .bearer_auth(&self.secret)
            .header("Notion-Version", &self.version)
            .json(&self.page_body(payload))
            .send()
            .await
            .context("Notion request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Notion API error ({status}): {body}");
        }

        let page: CreatedPage = resp.json().await.context("Unexpected Notion response")?;
        Ok(page.id)
    }
}
