//! Configuration file support

use deepchat_session::ChatMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Chat API used when neither the config nor the command line names one
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api";

/// Configuration for deepchat
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL exposing `/chat` and `/chat/stream`
    pub api_url: Option<String>,
    /// Default request mode
    pub mode: Option<ChatMode>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// Model label shown when the backend names none
    pub model_label: Option<String>,
    /// Starter prompts offered on the welcome screen and with Ctrl+S
    pub suggestions: Option<Vec<String>>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deepchat")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("DEEPCHAT_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a file, falling back to defaults when it is missing or invalid
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            api_url: Some(DEFAULT_API_URL.to_string()),
            mode: Some(ChatMode::Stream),
            tui: Some(true),
            model_label: None,
            suggestions: Some(default_suggestions()),
        };

        default_config.save()?;
        Ok(path)
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.suggestions.clone().unwrap_or_else(default_suggestions)
    }
}

/// Starter prompts shipped with the client
pub fn default_suggestions() -> Vec<String> {
    [
        "Explain how HTTP streaming works",
        "Write a short poem about the sea",
        "Summarize the plot of Hamlet in three sentences",
        "What are some tips for learning a new language?",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# deepchat configuration file
# Place at ~/.config/deepchat/config.toml (Linux) or set DEEPCHAT_CONFIG_PATH

# Base URL of the chat API (the proxy's /api prefix, or the backend itself)
api_url = "http://127.0.0.1:3000/api"

# Request mode: "stream" (incremental reply) or "sync" (wait for the full reply)
mode = "stream"

# Whether to use TUI mode by default (true by default)
# Set to false for simple stdin/stdout mode
tui = true

# Label shown for replies whose backend names no model (optional)
# model_label = "DeepSeek V3"

# Starter prompts shown on the welcome screen and with Ctrl+S
suggestions = [
    "Explain how HTTP streaming works",
    "Write a short poem about the sea",
]
"#
}
