use serde::{Deserialize, Serialize};

// ── LLM ──────────────────────────────────────────────────────────

/// OpenAI-compatible completion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Base URL up to and including `/v1`.
    pub base_url: String,
    /// Model used for the split yes/no gate.
    pub fast_model: String,
    /// Model used for summarizing, splitting and classifying.
    pub quality_model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            fast_model: "gpt-3.5-turbo".into(),
            quality_model: "gpt-4o".into(),
            timeout_secs: 60,
        }
    }
}

// ── Notion ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    pub secret: Option<String>,
    pub database_id: Option<String>,
    pub api_base: String,
    /// Value of the `Notion-Version` header.
    pub version: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            database_id: None,
            api_base: "https://api.notion.com/v1".into(),
            version: "2022-06-28".into(),
        }
    }
}

// ── Discord ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Webhook receiving every distillation.
    pub global_webhook: Option<String>,
    /// Webhook receiving medium/low confidence distillations.
    pub alert_webhook: Option<String>,
}

// ── Supabase queue ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    /// Supabase project URL (e.g., https://xxxx.supabase.co).
    pub url: Option<String>,
    /// Service role key (server-side only).
    pub service_key: Option<String>,
    pub table: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            table: "agent20_queue".into(),
        }
    }
}

// ── Agent ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Source label for interactive entries.
    pub source: String,
    /// Source label for queue entries whose metadata carries none.
    pub queue_source: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            source: "CLI".into(),
            queue_source: "Queue".into(),
        }
    }
}

// ── Root ─────────────────────────────────────────────────────────

/// Process-wide configuration, resolved once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub notion: NotionConfig,
    pub discord: DiscordConfig,
    pub supabase: SupabaseConfig,
    pub agent: AgentConfig,
}
