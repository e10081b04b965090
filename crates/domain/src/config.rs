use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub genai: GenAiConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_8787")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8787,
            host: "127.0.0.1".into(),
            cors: CorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed for CORS. Use `["*"]` for permissive (NOT recommended).
    /// Defaults to localhost-only.
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for persisted documents (`diagnoses/`, `diseases/`).
    #[serde(default = "d_data_path")]
    pub data_path: PathBuf,
    /// Base URL image paths are resolved against when a request carries
    /// `imagePath` instead of a full `imageUrl`.
    #[serde(default)]
    pub bucket_base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./data"),
            bucket_base_url: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generative model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenAiConfig {
    #[serde(default = "d_genai_url")]
    pub base_url: String,
    #[serde(default = "d_genai_model")]
    pub model: String,
    /// Plaintext API key. Prefer `api_key_env`; a key here logs a warning.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable to read the API key from.
    #[serde(default = "d_genai_key_env")]
    pub api_key_env: String,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    #[serde(default = "d_500")]
    pub max_output_tokens: u32,
    #[serde(default = "d_30000")]
    pub timeout_ms: u64,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            base_url: d_genai_url(),
            model: d_genai_model(),
            api_key: None,
            api_key_env: d_genai_key_env(),
            temperature: d_temperature(),
            max_output_tokens: 500,
            timeout_ms: 30_000,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat behavior
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// How many recent transcript messages go into the model context.
    /// Older messages fall out of the window; accepted tradeoff.
    #[serde(default = "d_10")]
    pub history_limit: usize,
    /// Name the assistant introduces itself with in the persona priming.
    #[serde(default = "d_assistant_name")]
    pub assistant_name: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            assistant_name: d_assistant_name(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_8787() -> u16 {
    8787
}

fn d_host() -> String {
    "127.0.0.1".into()
}

fn d_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:*".into(),
        "http://127.0.0.1:*".into(),
    ]
}

fn d_data_path() -> PathBuf {
    PathBuf::from("./data")
}

fn d_genai_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}

fn d_genai_model() -> String {
    "gemini-1.5-flash".into()
}

fn d_genai_key_env() -> String {
    "GEMINI_APIKEY".into()
}

fn d_temperature() -> f32 {
    0.7
}

fn d_500() -> u32 {
    500
}

fn d_30000() -> u64 {
    30_000
}

fn d_10() -> usize {
    10
}

fn d_assistant_name() -> String {
    "LeafLyzer".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.chat.history_limit, 10);
        assert_eq!(config.chat.assistant_name, "LeafLyzer");
        assert_eq!(config.genai.model, "gemini-1.5-flash");
        assert_eq!(config.genai.api_key_env, "GEMINI_APIKEY");
        assert_eq!(config.genai.max_output_tokens, 500);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [genai]
            model = "gemini-2.0-flash"

            [chat]
            history_limit = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.genai.model, "gemini-2.0-flash");
        assert_eq!(config.genai.base_url, d_genai_url());
        assert_eq!(config.chat.history_limit, 4);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn storage_paths_deserialize() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            data_path = "/var/lib/leaflyzer"
            bucket_base_url = "https://storage.example.com/v0/b/crops/o"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.storage.data_path,
            PathBuf::from("/var/lib/leaflyzer")
        );
        assert!(config.storage.bucket_base_url.is_some());
    }
}
