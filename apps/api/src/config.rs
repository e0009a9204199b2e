use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::assessment::interpreter::ParseMode;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_HISTORY_TABLE: &str = "user_history";

/// Columns the `HISTORY_TABLE` must carry for inserts to succeed. `id` and
/// `created_at default now()` are owned by the service.
pub const HISTORY_TABLE_COLUMNS: &[(&str, &str)] = &[
    ("user_id", "uuid"),
    ("field", "text"),
    ("questions", "jsonb"),
    ("answers", "jsonb"),
    ("score", "float8"),
    ("scores", "jsonb"),
    ("feedback", "jsonb"),
    ("roadmap", "jsonb"),
];

/// Server configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub llm_timeout_secs: u64,
    /// Total attempts per provider call. 1 means no retry.
    pub llm_max_attempts: u32,
    pub question_parse_mode: ParseMode,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: env_or("GEMINI_MODEL", DEFAULT_MODEL),
            gemini_api_base: env_or("GEMINI_API_BASE", DEFAULT_API_BASE),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            llm_max_attempts: parse_env::<u32>("LLM_MAX_ATTEMPTS", 1)?.max(1),
            question_parse_mode: parse_env("QUESTION_PARSE_MODE", ParseMode::Json)?,
            port: parse_env("PORT", DEFAULT_PORT)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_api_base", &self.gemini_api_base)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("llm_max_attempts", &self.llm_max_attempts)
            .field("question_parse_mode", &self.question_parse_mode)
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

/// Terminal client configuration. The hosted auth/data service is optional:
/// without it the client skips the login gate and history persistence.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub supabase: Option<SupabaseConfig>,
    pub history_table: String,
}

#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let supabase = match (
            std::env::var("SUPABASE_URL").ok(),
            std::env::var("SUPABASE_ANON_KEY").ok(),
        ) {
            (Some(url), Some(anon_key)) if !url.is_empty() && !anon_key.is_empty() => {
                Some(SupabaseConfig {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key,
                })
            }
            (Some(_), None) | (None, Some(_)) => {
                anyhow::bail!("SUPABASE_URL and SUPABASE_ANON_KEY must be set together")
            }
            _ => None,
        };

        Ok(ClientConfig {
            api_url: env_or("CONSULTANT_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            supabase,
            history_table: env_or("HISTORY_TABLE", DEFAULT_HISTORY_TABLE),
        })
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("supabase_url", &self.supabase.as_ref().map(|s| s.url.as_str()))
            .field("history_table", &self.history_table)
            .finish()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_port() {
        let port: u16 = parse_value("PORT", " 5000 ").unwrap();
        assert_eq!(port, 5000);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        let err = parse_value::<u16>("PORT", "five-thousand").unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_parse_value_parse_mode() {
        let mode: ParseMode = parse_value("QUESTION_PARSE_MODE", "lines").unwrap();
        assert_eq!(mode, ParseMode::Lines);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            gemini_api_key: "super-secret".to_string(),
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_api_base: DEFAULT_API_BASE.to_string(),
            llm_timeout_secs: DEFAULT_TIMEOUT_SECS,
            llm_max_attempts: 1,
            question_parse_mode: ParseMode::Json,
            port: DEFAULT_PORT,
            rust_log: "info".to_string(),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
