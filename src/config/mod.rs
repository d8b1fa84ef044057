mod file_config;

pub use file_config::{AgentConfig, AgentLlmConfig, FileConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that take part in config resolution. Mirrors the subset of
/// flags a TOML config file can override.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub agent: AgentSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and an optional TOML file.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let agent_file = file.agent.unwrap_or_default();
        let agent_llm_file = agent_file.llm.unwrap_or_default();
        let agent_llm_defaults = AgentLlmSettings::default();
        let agent = AgentSettings {
            enabled: agent_file.enabled.unwrap_or(false),
            max_iterations: agent_file.max_iterations.unwrap_or(20),
            llm: AgentLlmSettings {
                base_url: agent_llm_file
                    .base_url
                    .unwrap_or(agent_llm_defaults.base_url),
                model: agent_llm_file.model.unwrap_or(agent_llm_defaults.model),
                temperature: agent_llm_file
                    .temperature
                    .unwrap_or(agent_llm_defaults.temperature),
                timeout_secs: agent_llm_file
                    .timeout_secs
                    .unwrap_or(agent_llm_defaults.timeout_secs),
            },
        };

        Ok(Self {
            db_dir,
            port,
            logging_level,
            frontend_dir_path,
            agent,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }
}

/// Settings for the assistant.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub enabled: bool,
    pub max_iterations: usize,
    pub llm: AgentLlmSettings,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_iterations: 20,
            llm: AgentLlmSettings::default(),
        }
    }
}

/// Settings for the assistant's LLM backend.
#[derive(Debug, Clone)]
pub struct AgentLlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for AgentLlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
