//! Optional TOML configuration file.
//!
//! All fields are optional; missing ones fall back to CLI values or
//! built-in defaults during [`AppConfig::resolve`](super::AppConfig::resolve).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub agent: Option<AgentConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub enabled: Option<bool>,
    pub max_iterations: Option<usize>,
    pub llm: Option<AgentLlmConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentLlmConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse config file {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            db_dir = "/data"
            port = 8080
            logging_level = "headers"
            frontend_dir_path = "/srv/frontend"

            [agent]
            enabled = true
            max_iterations = 10

            [agent.llm]
            base_url = "http://ollama:11434"
            model = "llama3.1:8b"
            temperature = 0.1
            timeout_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.db_dir.as_deref(), Some("/data"));
        assert_eq!(config.port, Some(8080));
        let agent = config.agent.unwrap();
        assert_eq!(agent.enabled, Some(true));
        assert_eq!(agent.llm.unwrap().model.as_deref(), Some("llama3.1:8b"));
    }

    #[test]
    fn empty_config_is_valid() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.db_dir.is_none());
        assert!(config.agent.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<FileConfig>("no_such_field = 1").is_err());
    }
}
