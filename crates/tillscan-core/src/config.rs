//! Layered configuration
//!
//! Settings are resolved in three layers, later layers winning:
//! 1. Embedded defaults (`config/tillscan.toml`, compiled into the binary)
//! 2. An override file: an explicit path, else
//!    `~/.local/share/tillscan/config.toml` when it exists
//! 3. Environment variables
//!
//! Override files only need the keys they change.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

const DEFAULT_CONFIG: &str = include_str!("../../../config/tillscan.toml");

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub ledger: LedgerConfig,
    pub ai: AiConfig,
    pub ocr: OcrConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// CSV file holding confirmed expenses
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    /// Backend name (ollama, openai_compatible, mock, none)
    pub backend: String,
    pub host: Option<String>,
    /// Model name; each backend has its own default
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Per-request timeout for classification calls
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrConfig {
    pub enabled: bool,
    /// Tesseract executable
    pub command: String,
    pub language: String,
    pub primary_psm: u8,
    pub fallback_psm: u8,
    /// Phrase that makes the primary pass win over the fallback pass
    pub preferred_anchor: String,
    /// Timeout for each OCR pass
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served for non-API paths
    pub static_dir: Option<PathBuf>,
    /// Bearer keys accepted by the API; empty disables auth
    pub api_keys: Vec<String>,
    /// CORS origins; empty allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig {
                path: default_ledger_path(),
            },
            ai: AiConfig {
                backend: "ollama".to_string(),
                host: None,
                model: None,
                api_key: None,
                timeout: Duration::from_secs(30),
            },
            ocr: OcrConfig {
                enabled: true,
                command: "tesseract".to_string(),
                language: "eng".to_string(),
                primary_psm: 6,
                fallback_psm: 11,
                preferred_anchor: "STAND FEE".to_string(),
                timeout: Duration::from_secs(60),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                static_dir: Some(PathBuf::from("static")),
                api_keys: Vec::new(),
                allowed_origins: Vec::new(),
            },
        }
    }
}

impl Config {
    /// Load configuration from all layers, reading the process environment
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(explicit_path, |key| std::env::var(key).ok())
    }

    /// Load configuration with a custom environment lookup
    pub fn load_with_env<F>(explicit_path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::embedded()?;

        let override_path = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => default_config_path().filter(|p| p.exists()),
        };

        if let Some(path) = override_path {
            debug!(path = %path.display(), "Loading config override");
            let content = fs::read_to_string(&path)?;
            config.apply_toml(&content)?;
        }

        config.apply_env(env)?;
        Ok(config)
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        let mut config = Self::default();
        config.apply_toml(DEFAULT_CONFIG)?;
        Ok(config)
    }

    /// Overlay the keys present in a TOML document
    pub fn apply_toml(&mut self, content: &str) -> Result<()> {
        let raw: RawConfig = toml::from_str(content)?;

        if let Some(ledger) = raw.ledger {
            if let Some(path) = ledger.path {
                self.ledger.path = path;
            }
        }

        if let Some(ai) = raw.ai {
            if let Some(backend) = ai.backend {
                self.ai.backend = backend;
            }
            if ai.host.is_some() {
                self.ai.host = ai.host;
            }
            if ai.model.is_some() {
                self.ai.model = ai.model;
            }
            if ai.api_key.is_some() {
                self.ai.api_key = ai.api_key.filter(|k| !k.is_empty());
            }
            if let Some(secs) = ai.timeout_secs {
                self.ai.timeout = Duration::from_secs(secs);
            }
        }

        if let Some(ocr) = raw.ocr {
            if let Some(enabled) = ocr.enabled {
                self.ocr.enabled = enabled;
            }
            if let Some(command) = ocr.command {
                self.ocr.command = command;
            }
            if let Some(language) = ocr.language {
                self.ocr.language = language;
            }
            if let Some(psm) = ocr.primary_psm {
                self.ocr.primary_psm = psm;
            }
            if let Some(psm) = ocr.fallback_psm {
                self.ocr.fallback_psm = psm;
            }
            if let Some(anchor) = ocr.preferred_anchor {
                self.ocr.preferred_anchor = anchor;
            }
            if let Some(secs) = ocr.timeout_secs {
                self.ocr.timeout = Duration::from_secs(secs);
            }
        }

        if let Some(server) = raw.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if server.static_dir.is_some() {
                self.server.static_dir = server.static_dir;
            }
            if let Some(keys) = server.api_keys {
                self.server.api_keys = keys;
            }
            if let Some(origins) = server.allowed_origins {
                self.server.allowed_origins = origins;
            }
        }

        Ok(())
    }

    /// Overlay environment variables
    pub fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = var("TILLSCAN_LEDGER") {
            self.ledger.path = PathBuf::from(path);
        }

        if let Some(backend) = var("AI_BACKEND") {
            self.ai.backend = backend;
        }
        let (host_var, model_var) = if is_openai_family(&self.ai.backend) {
            if let Some(key) = var("OPENAI_COMPATIBLE_API_KEY") {
                self.ai.api_key = Some(key);
            }
            ("OPENAI_COMPATIBLE_HOST", "OPENAI_COMPATIBLE_MODEL")
        } else {
            ("OLLAMA_HOST", "OLLAMA_MODEL")
        };
        if let Some(host) = var(host_var) {
            self.ai.host = Some(host);
        }
        if let Some(model) = var(model_var) {
            self.ai.model = Some(model);
        }
        if let Some(secs) = var("TILLSCAN_AI_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!("TILLSCAN_AI_TIMEOUT_SECS must be seconds: {}", secs))
            })?;
            self.ai.timeout = Duration::from_secs(secs);
        }

        if let Some(command) = var("TESSERACT_CMD") {
            self.ocr.command = command;
        }

        if let Some(keys) = var("TILLSCAN_API_KEYS") {
            self.server.api_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(())
    }
}

fn is_openai_family(backend: &str) -> bool {
    matches!(
        backend.to_lowercase().as_str(),
        "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp"
    )
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tillscan").join("config.toml"))
}

/// Default ledger location
pub fn default_ledger_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tillscan").join("expenses.csv"))
        .unwrap_or_else(|| PathBuf::from("expenses.csv"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    ledger: Option<RawLedger>,
    ai: Option<RawAi>,
    ocr: Option<RawOcr>,
    server: Option<RawServer>,
}

#[derive(Debug, Deserialize)]
struct RawLedger {
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawAi {
    backend: Option<String>,
    host: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawOcr {
    enabled: Option<bool>,
    command: Option<String>,
    language: Option<String>,
    primary_psm: Option<u8>,
    fallback_psm: Option<u8>,
    preferred_anchor: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
    api_keys: Option<Vec<String>>,
    allowed_origins: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_embedded_matches_defaults() {
        let embedded = Config::embedded().unwrap();
        assert_eq!(embedded, Config::default());
        assert_eq!(embedded.ai.timeout, Duration::from_secs(30));
        assert_eq!(embedded.ocr.timeout, Duration::from_secs(60));
        assert_eq!(embedded.ocr.preferred_anchor, "STAND FEE");
        assert_eq!(embedded.server.static_dir, Some(PathBuf::from("static")));
    }

    #[test]
    fn test_override_file_changes_only_named_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[ai]\nhost = \"http://gpu-box:11434\"\n\n[server]\nport = 8080\n",
        )
        .unwrap();

        let config = Config::load_with_env(Some(&path), env_from(&[])).unwrap();
        assert_eq!(config.ai.host.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.ai.backend, "ollama");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_with_env(Some(&dir.path().join("nope.toml")), env_from(&[]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let mut config = Config::default();
        assert!(config.apply_toml("[mystery]\nkey = 1\n").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ai]\nmodel = \"from-file\"\n").unwrap();

        let env = env_from(&[
            ("OLLAMA_HOST", "http://localhost:11434"),
            ("OLLAMA_MODEL", "from-env"),
            ("TILLSCAN_LEDGER", "/tmp/ledger.csv"),
            ("TESSERACT_CMD", "/opt/tesseract"),
            ("TILLSCAN_API_KEYS", "alpha, beta,,"),
            ("TILLSCAN_AI_TIMEOUT_SECS", "5"),
        ]);
        let config = Config::load_with_env(Some(&path), env).unwrap();
        assert_eq!(config.ai.model.as_deref(), Some("from-env"));
        assert_eq!(config.ai.host.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.ai.timeout, Duration::from_secs(5));
        assert_eq!(config.ledger.path, PathBuf::from("/tmp/ledger.csv"));
        assert_eq!(config.ocr.command, "/opt/tesseract");
        assert_eq!(config.server.api_keys, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_openai_backend_reads_its_own_vars() {
        let env = env_from(&[
            ("AI_BACKEND", "openai_compatible"),
            ("OLLAMA_HOST", "http://ignored:11434"),
            ("OPENAI_COMPATIBLE_HOST", "http://localhost:8000"),
            ("OPENAI_COMPATIBLE_MODEL", "llama-3.2-3b"),
            ("OPENAI_COMPATIBLE_API_KEY", "sk-local"),
        ]);
        let mut config = Config::default();
        config.apply_env(env).unwrap();
        assert_eq!(config.ai.backend, "openai_compatible");
        assert_eq!(config.ai.host.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.ai.model.as_deref(), Some("llama-3.2-3b"));
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-local"));
    }

    #[test]
    fn test_bad_timeout_env_is_error() {
        let mut config = Config::default();
        let result = config.apply_env(env_from(&[("TILLSCAN_AI_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut config = Config::default();
        config
            .apply_env(env_from(&[("OLLAMA_HOST", "  "), ("AI_BACKEND", "")]))
            .unwrap();
        assert!(config.ai.host.is_none());
        assert_eq!(config.ai.backend, "ollama");
    }
}
