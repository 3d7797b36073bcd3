use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    /// Backend origin without a trailing slash
    pub backend_url: String,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    backend: BackendSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BackendSection {
    #[serde(default = "default_backend_url")]
    url: String,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backend_url: default_backend_url(),
        }
    }
}

impl ProxyConfig {
    /// Load from `DEEPCHAT_PROXY_CONFIG` or `./proxy.toml`, falling back to the environment
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Ok(Self::from_file_config(file_config));
        }

        Ok(Self::from_env())
    }

    /// Parse a TOML document with `[server]` and `[backend]` tables
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let file_config: FileConfig = toml::from_str(content)?;
        Ok(Self::from_file_config(file_config))
    }

    fn from_file_config(file_config: FileConfig) -> Self {
        Self {
            host: file_config.server.host,
            port: file_config.server.port,
            backend_url: normalize_url(&file_config.backend.url),
        }
    }

    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("DEEPCHAT_PROXY_HOST").unwrap_or_else(default_host);
        let port = lookup("DEEPCHAT_PROXY_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let backend_url = lookup("BACKEND_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(default_backend_url);

        Self {
            host,
            port,
            backend_url: normalize_url(&backend_url),
        }
    }

    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        backend_url: Option<String>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(url) = backend_url {
            self.backend_url = normalize_url(&url);
        }
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("DEEPCHAT_PROXY_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("proxy.toml").exists() {
        Some("proxy.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read proxy config {}: {}", path, e))?;
    let config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse proxy config {}: {}", path, e))?;
    Ok(Some(config))
}
