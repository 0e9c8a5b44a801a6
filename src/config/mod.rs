//! Configuration loading.
//!
//! A [`Config`] is built once in `main` from an optional TOML file plus
//! environment overrides, then handed by reference to every component
//! constructor. Nothing below this module reads the environment.

pub mod schema;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::{AgentConfig, Config, DiscordConfig, LlmConfig, NotionConfig, SupabaseConfig};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config file location (`<platform config dir>/agent20/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "agent20")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl Config {
    /// Load the config file (explicit path must exist; the default may be
    /// absent) and apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay environment variables onto the file values.
    ///
    /// Takes a lookup function so tests can inject variables without
    /// touching the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = get("NOTION_SECRET") {
            self.notion.secret = Some(v);
        }
        if let Some(v) = get("NOTION_DATABASE_ID") {
            self.notion.database_id = Some(v);
        }
        if let Some(v) = get("DISCORD_WEBHOOK_GLOBAL") {
            self.discord.global_webhook = Some(v);
        }
        if let Some(v) = get("DISCORD_WEBHOOK_ALERTS") {
            self.discord.alert_webhook = Some(v);
        }
        if let Some(v) = get("SUPABASE_URL") {
            self.supabase.url = Some(v);
        }
        if let Some(v) = get("SUPABASE_SERVICE_ROLE_KEY") {
            self.supabase.service_key = Some(v);
        }
        if let Some(v) = get("AGENT20_QUEUE_TABLE") {
            self.supabase.table = v;
        }
    }

    /// Keys the interactive pipeline cannot run without.
    ///
    /// Discord webhooks are optional: an unset webhook is logged and skipped.
    pub fn missing_for_interactive(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.notion.secret.is_none() {
            missing.push("NOTION_SECRET");
        }
        if self.notion.database_id.is_none() {
            missing.push("NOTION_DATABASE_ID");
        }
        missing
    }

    pub fn missing_for_queue(&self) -> Vec<&'static str> {
        let mut missing = self.missing_for_interactive();
        if self.supabase.url.is_none() {
            missing.push("SUPABASE_URL");
        }
        if self.supabase.service_key.is_none() {
            missing.push("SUPABASE_SERVICE_ROLE_KEY");
        }
        missing
    }

    pub fn validate_for_interactive(&self) -> Result<()> {
        ensure_present(&self.missing_for_interactive())
    }

    pub fn validate_for_queue(&self) -> Result<()> {
        ensure_present(&self.missing_for_queue())
    }
}

fn ensure_present(missing: &[&str]) -> Result<()> {
    if missing.is_empty() {
        return Ok(());
    }
    anyhow::bail!("Missing required configuration: {}", missing.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_cover_models_and_table() {
        let config = Config::default();
        assert_eq!(config.llm.fast_model, "gpt-3.5-turbo");
        assert_eq!(config.llm.quality_model, "gpt-4o");
        assert_eq!(config.notion.version, "2022-06-28");
        assert_eq!(config.supabase.table, "agent20_queue");
        assert_eq!(config.agent.source, "CLI");
    }

    #[test]
    fn partial_toml_keeps_section_defaults() {
        let config = Config::from_toml(
            r#"
            [llm]
            quality_model = "gpt-4.1"

            [discord]
            global_webhook = "https://discord.test/global"
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.quality_model, "gpt-4.1");
        assert_eq!(config.llm.fast_model, "gpt-3.5-turbo");
        assert_eq!(
            config.discord.global_webhook.as_deref(),
            Some("https://discord.test/global")
        );
        assert!(config.discord.alert_webhook.is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::from_toml("[notion]\nsecret = \"from-file\"\n").unwrap();
        config.apply_env_overrides(env(&[
            ("NOTION_SECRET", "from-env"),
            ("OPENAI_API_KEY", "sk-test"),
            ("AGENT20_QUEUE_TABLE", "thoughts"),
        ]));
        assert_eq!(config.notion.secret.as_deref(), Some("from-env"));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.supabase.table, "thoughts");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[("NOTION_SECRET", "   ")]));
        assert!(config.notion.secret.is_none());
    }

    #[test]
    fn validation_reports_missing_keys() {
        let config = Config::default();
        let err = config.validate_for_queue().unwrap_err().to_string();
        assert!(err.contains("NOTION_SECRET"));
        assert!(err.contains("SUPABASE_URL"));

        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("NOTION_SECRET", "s"),
            ("NOTION_DATABASE_ID", "db"),
        ]));
        assert!(config.validate_for_interactive().is_ok());
        assert!(config.validate_for_queue().is_err());
    }

    #[test]
    fn load_reads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent]\nsource = \"Shortcut\"").unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.agent.source, "Shortcut");
    }

    #[test]
    fn load_fails_for_missing_explicit_file() {
        let result = Config::from_file(Path::new("/nonexistent/agent20.toml"));
        assert!(result.is_err());
    }
}
