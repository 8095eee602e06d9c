use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration, read once at startup and treated as
/// read-only for the life of the process.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub openai: OpenAiConfig,
    pub access: AccessConfig,
    pub server: ServerConfig,
}

/// Telegram bot credentials and webhook addressing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TelegramConfig {
    pub token: String,
    /// Public hostname Telegram calls back, scheme-less (e.g. "bot.example.com").
    pub webhook_domain: String,
}

/// Completion API credentials and model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Override for OpenAI-compatible endpoints; defaults to api.openai.com.
    pub api_base: Option<String>,
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: "gpt-3.5-turbo".to_string(),
        }
    }
}

/// Who may talk to the bot.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessConfig {
    /// Conversation identifiers permitted when `open_access` is off.
    /// An empty list with `open_access` off admits nobody.
    pub allow_from: Vec<String>,
    /// Disable the allowlist entirely.
    pub open_access: bool,
}

impl AccessConfig {
    /// Whether a conversation may use the bot.
    pub fn permits(&self, conversation_id: &str) -> bool {
        self.open_access || self.allow_from.iter().any(|id| id == conversation_id)
    }
}

/// Bind address for the local server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
        }
    }
}

/// Data directory for the file-backed store.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RELAYBOT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relaybot")
}

/// Build configuration from the environment.
///
/// `RELAYBOT_CONFIG` may hold a full JSON config; individual variables
/// override whatever it set. A malformed `RELAYBOT_CONFIG` is logged and
/// ignored rather than aborting startup.
pub fn load_from_env() -> AppConfig {
    let mut config = if let Ok(json) = std::env::var("RELAYBOT_CONFIG") {
        match serde_json::from_str(&json) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to parse RELAYBOT_CONFIG: {}", e);
                AppConfig::default()
            }
        }
    } else {
        AppConfig::default()
    };

    if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
        config.telegram.token = token;
    }
    if let Ok(domain) = std::env::var("TELEGRAM_WEBHOOK_DOMAIN") {
        config.telegram.webhook_domain = domain;
    }
    if let Ok(allow) = std::env::var("TELEGRAM_ALLOW_FROM") {
        config.access.allow_from = allow
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Ok(open) = std::env::var("RELAYBOT_OPEN_ACCESS") {
        config.access.open_access = open == "true";
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        config.openai.api_key = key;
    }
    if let Ok(base) = std::env::var("OPENAI_API_BASE") {
        config.openai.api_base = Some(base);
    }
    if let Ok(model) = std::env::var("RELAYBOT_MODEL") {
        config.openai.model = model;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.telegram.token.is_empty());
        assert_eq!(config.openai.model, "gpt-3.5-turbo");
        assert!(config.openai.api_base.is_none());
        assert!(!config.access.open_access);
        assert!(config.access.allow_from.is_empty());
        assert_eq!(config.server.port, 8787);
    }

    #[test]
    fn test_config_json_field_names() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"webhookDomain\""));
        assert!(json.contains("\"apiKey\""));
        assert!(json.contains("\"allowFrom\""));
        assert!(json.contains("\"openAccess\""));
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{"access": {"allowFrom": ["100", "200"]}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.access.allow_from, vec!["100", "200"]);
        // untouched sections keep their defaults
        assert_eq!(config.openai.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_access_permits() {
        let access = AccessConfig {
            allow_from: vec!["100".to_string(), "-200".to_string()],
            open_access: false,
        };
        assert!(access.permits("100"));
        assert!(access.permits("-200"));
        assert!(!access.permits("999"));

        let open = AccessConfig {
            allow_from: vec![],
            open_access: true,
        };
        assert!(open.permits("anyone"));

        let closed = AccessConfig::default();
        assert!(!closed.permits("100"));
    }

    #[test]
    fn test_load_from_env() {
        std::env::set_var(
            "RELAYBOT_CONFIG",
            r#"{"openai": {"model": "base-model"}, "telegram": {"token": "base-token"}}"#,
        );
        std::env::set_var("TELEGRAM_BOT_TOKEN", "123:abc");
        std::env::set_var("TELEGRAM_ALLOW_FROM", "100, 200 ,,300");
        std::env::set_var("RELAYBOT_OPEN_ACCESS", "true");

        let config = load_from_env();
        // individual vars override the JSON blob
        assert_eq!(config.telegram.token, "123:abc");
        assert_eq!(config.openai.model, "base-model");
        assert_eq!(config.access.allow_from, vec!["100", "200", "300"]);
        assert!(config.access.open_access);

        std::env::remove_var("RELAYBOT_CONFIG");
        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        std::env::remove_var("TELEGRAM_ALLOW_FROM");
        std::env::remove_var("RELAYBOT_OPEN_ACCESS");
    }
}
