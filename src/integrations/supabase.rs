//! Supabase-backed work queue.
//!
//! Talks to the queue table through PostgREST:
//! - `GET  /rest/v1/<table>?status=eq.pending&order=created_at.asc&limit=1`
//! - `PATCH /rest/v1/<table>?id=eq.<id>&status=eq.pending` to claim
//! - `PATCH /rest/v1/<table>?id=eq.<id>` for terminal states
//!
//! The claim is conditional on the row still being `pending` and asks for
//! the updated rows back, so two workers racing on one row cannot both win.

use anyhow::Context;
use async_trait::async_trait;

use crate::config::SupabaseConfig;
use crate::queue::{EntryId, QueueEntry, QueueStatus, QueueStore};

/// PostgREST client for the queue table.
pub struct SupabaseQueue {
    url: String,
    service_key: String,
    table: String,
    http: reqwest::Client,
}

impl SupabaseQueue {
    pub fn from_config(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let url = config
            .url
            .clone()
            .context("SUPABASE_URL is not configured")?;
        let service_key = config
            .service_key
            .clone()
            .context("SUPABASE_SERVICE_ROLE_KEY is not configured")?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            service_key,
            table: config.table.clone(),
            http,
        })
    }

    /// Build the PostgREST URL for the queue table.
    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    /// Get the base headers for authenticated requests.
    fn auth_headers(&self) -> Vec<(&str, String)> {
        vec![
            ("apikey", self.service_key.clone()),
            ("Authorization", format!("Bearer {}", self.service_key)),
        ]
    }

    fn with_auth(&self, mut request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        for (key, value) in self.auth_headers() {
            request = request.header(key, value);
        }
        request
    }

    async fn patch(
        &self,
        filters: &[(&str, String)],
        body: serde_json::Value,
        what: &str,
    ) -> anyhow::Result<Vec<serde_json::Value>> {
        let request = self
            .http
            .patch(self.table_url())
            .query(filters)
            .header("Prefer", "return=representation")
            .json(&body);

        let resp = self.with_auth(request).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Failed to {what} ({status}): {body}");
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl QueueStore for SupabaseQueue {
    async fn oldest_pending(&self) -> anyhow::Result<Option<QueueEntry>> {
        let request = self.http.get(self.table_url()).query(&[
            ("select", "*"),
            ("status", "eq.pending"),
            ("order", "created_at.asc"),
            ("limit", "1"),
        ]);

        let resp = self.with_auth(request).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Failed to fetch pending entries ({status}): {body}");
        }

        let entries: Vec<QueueEntry> = resp.json().await?;
        Ok(entries.into_iter().next())
    }

    async fn claim(&self, id: &EntryId) -> anyhow::Result<bool> {
        let updated = self
            .patch(
                &[
                    ("id", format!("eq.{id}")),
                    ("status", format!("eq.{}", QueueStatus::Pending)),
                ],
                serde_json::json!({ "status": QueueStatus::Processing }),
                "claim entry",
            )
            .await?;
        Ok(!updated.is_empty())
    }

    async fn complete(&self, id: &EntryId, summary: &str, tags: &[String]) -> anyhow::Result<()> {
        self.patch(
            &[("id", format!("eq.{id}"))],
            serde_json::json!({
                "status": QueueStatus::Complete,
                "summary": summary,
                "tags": tags,
            }),
            "mark entry complete",
        )
        .await?;
        Ok(())
    }

    async fn fail(&self, id: &EntryId) -> anyhow::Result<()> {
        self.patch(
            &[("id", format!("eq.{id}"))],
            serde_json::json!({ "status": QueueStatus::Failed }),
            "mark entry failed",
        )
        .await?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str) -> SupabaseConfig {
        SupabaseConfig {
            url: Some(url.into()),
            service_key: Some("test-service-key".into()),
            table: "agent20_queue".into(),
        }
    }

    #[test]
    fn table_url_construction() {
        let queue = SupabaseQueue::from_config(&test_config("https://test-project.supabase.co/")).unwrap();
        assert_eq!(
            queue.table_url(),
            "https://test-project.supabase.co/rest/v1/agent20_queue"
        );
    }

    #[test]
    fn auth_headers_contain_key() {
        let queue = SupabaseQueue::from_config(&test_config("https://x.supabase.co")).unwrap();
        let headers = queue.auth_headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].0, "apikey");
        assert_eq!(headers[0].1, "test-service-key");
        assert!(headers[1].1.starts_with("Bearer "));
    }

    #[test]
    fn missing_url_is_a_config_error() {
        let config = SupabaseConfig {
            url: None,
            ..test_config("unused")
        };
        assert!(SupabaseQueue::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn oldest_pending_queries_by_status_and_age() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/agent20_queue"))
            .and(query_param("status", "eq.pending"))
            .and(query_param("order", "created_at.asc"))
            .and(query_param("limit", "1"))
            .and(header("apikey", "test-service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": 7,
                "raw_text": "buy a kettle",
                "metadata": null,
                "status": "pending",
                "created_at": "2024-05-01T12:00:00+00:00",
                "summary": null,
                "tags": null
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let queue = SupabaseQueue::from_config(&test_config(&server.uri())).unwrap();
        let entry = queue.oldest_pending().await.unwrap().unwrap();
        assert_eq!(entry.id, EntryId::Int(7));
        assert_eq!(entry.raw_text, "buy a kettle");
    }

    #[tokio::test]
    async fn empty_queue_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/agent20_queue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let queue = SupabaseQueue::from_config(&test_config(&server.uri())).unwrap();
        assert!(queue.oldest_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claim_is_conditional_on_pending() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/agent20_queue"))
            .and(query_param("id", "eq.7"))
            .and(query_param("status", "eq.pending"))
            .and(body_json(serde_json::json!({ "status": "processing" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "id": 7, "status": "processing" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let queue = SupabaseQueue::from_config(&test_config(&server.uri())).unwrap();
        assert!(queue.claim(&EntryId::Int(7)).await.unwrap());
    }

    #[tokio::test]
    async fn lost_claim_returns_false() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/agent20_queue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let queue = SupabaseQueue::from_config(&test_config(&server.uri())).unwrap();
        assert!(!queue.claim(&EntryId::Int(7)).await.unwrap());
    }

    #[tokio::test]
    async fn complete_writes_status_summary_and_tags() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/agent20_queue"))
            .and(query_param("id", "eq.abc"))
            .and(body_json(serde_json::json!({
                "status": "complete",
                "summary": "He wants a kettle.",
                "tags": ["Kitchen", "Shopping"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{}])))
            .expect(1)
            .mount(&server)
            .await;

        let queue = SupabaseQueue::from_config(&test_config(&server.uri())).unwrap();
        queue
            .complete(
                &EntryId::Text("abc".into()),
                "He wants a kettle.",
                &["Kitchen".to_string(), "Shopping".to_string()],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fail_writes_status_only_and_surfaces_errors() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/agent20_queue"))
            .and(body_json(serde_json::json!({ "status": "failed" })))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let queue = SupabaseQueue::from_config(&test_config(&server.uri())).unwrap();
        let err = queue.fail(&EntryId::Int(1)).await.unwrap_err().to_string();
        assert!(err.contains("503"));
        assert!(err.contains("down"));
    }
}
