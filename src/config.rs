use crate::providers::{EnvReader, SystemEnv};
use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Environment variable holding the endpoint API key.
pub const API_KEY_VAR: &str = "OPENAI_KEY";
/// Environment variable holding the chat-completion endpoint URL.
pub const ENDPOINT_VAR: &str = "OPENAI_ENDPOINT";

/// Defaults compiled into the binary.
const PACKAGED_ENV: &str = include_str!("../assets/default.env");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub openai_key: Option<String>,
    #[serde(default)]
    pub openai_endpoint: Option<String>,
}

impl Config {
    /// Load configuration from packaged defaults, the config file and
    /// environment variables, in increasing order of precedence.
    pub fn load() -> Result<Self> {
        let file = Self::load_from_file().unwrap_or_else(|e| {
            debug!("No usable config file: {}", e);
            None
        });
        Ok(Self::resolve(PACKAGED_ENV, file, &SystemEnv))
    }

    /// Merges the three configuration sources.
    pub fn resolve(packaged: &str, file: Option<Config>, env: &dyn EnvReader) -> Self {
        let mut config = Self::from_env_file(packaged);

        if let Some(file) = file {
            if file.openai_key.is_some() {
                config.openai_key = file.openai_key;
            }
            if file.openai_endpoint.is_some() {
                config.openai_endpoint = file.openai_endpoint;
            }
        }

        // Environment variables override everything else
        if let Some(key) = non_empty(env.var(API_KEY_VAR)) {
            config.openai_key = Some(key);
        }
        if let Some(endpoint) = non_empty(env.var(ENDPOINT_VAR)) {
            config.openai_endpoint = Some(endpoint);
        }

        config
    }

    /// Parses `KEY=value` lines, skipping blanks and `#` comments.
    pub fn from_env_file(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = non_empty(Some(value.replace('"', "")));
            match key.trim() {
                API_KEY_VAR => config.openai_key = value,
                ENDPOINT_VAR => config.openai_endpoint = value,
                other => debug!("Ignoring unknown packaged setting {}", other),
            }
        }

        config
    }

    fn load_from_file() -> Result<Option<Self>> {
        let config_path = Self::get_config_path()?;
        if !config_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from: {}", config_path.display());
        Ok(Some(config))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;
        info!("Saved config to: {}", config_path.display());
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".conjure"))
    }

    /// Update the stored API key. Only the config file is touched; packaged
    /// defaults and environment variables are left alone.
    pub fn set_api_key(api_key: String) -> Result<()> {
        let mut stored = Self::load_from_file()?.unwrap_or_default();
        stored.openai_key = Some(api_key);
        stored.save()
    }

    /// Update the stored endpoint URL.
    pub fn set_endpoint(endpoint: String) -> Result<()> {
        let mut stored = Self::load_from_file()?.unwrap_or_default();
        stored.openai_endpoint = Some(endpoint);
        stored.save()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.openai_key.as_deref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.openai_endpoint.as_deref()
    }

    pub fn show_config_info() -> Result<()> {
        let config_path = Self::get_config_path()?;
        println!("Configuration file: {}", config_path.display());
        println!(
            "Status: {}",
            if config_path.exists() { "Found" } else { "Not found" }
        );

        let config = Self::load()?;
        println!("API Key: {}", if config.api_key().is_some() { "Set" } else { "Not set" });
        println!("Endpoint: {}", config.endpoint().unwrap_or("Not set"));

        println!("\nTo configure:");
        println!("  conjure --set-api-key <your-key>");
        println!("  conjure --set-endpoint <chat-completions-url>");
        println!("\nOr set environment variables:");
        println!("  export {}=<your-key>", API_KEY_VAR);
        println!("  export {}=<chat-completions-url>", ENDPOINT_VAR);

        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
