use std::env;
use std::time::Duration;

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn env_duration_millis(key: &str, default_millis: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(default_millis))
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Configuration for the narrative summarizer backend (OpenAI-compatible).
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl SummarizerConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_optional("OPENAI_API_KEY"),
            base_url: env_string("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model: env_string("OPENAI_MODEL", "gpt-4o-mini"),
            max_tokens: env_u32("OPENAI_MAX_TOKENS", 10_000),
            request_timeout: env_duration_millis("OPENAI_TIMEOUT_MS", 120_000),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Configuration for outbound email delivery (Mailgun HTTP API).
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub api_key: Option<String>,
    pub domain: Option<String>,
    pub base_url: String,
    pub from: String,
    pub request_timeout: Duration,
}

impl MailerConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env_optional("MAILGUN_API_KEY"),
            domain: env_optional("MAILGUN_DOMAIN"),
            base_url: env_string("MAILGUN_BASE_URL", "https://api.mailgun.net/v3"),
            from: env_string("MAILGUN_FROM", "Discord Newsletter <newsletter@example.com>"),
            request_timeout: env_duration_millis("MAILGUN_TIMEOUT_MS", 30_000),
        }
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
