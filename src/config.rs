use std::env;

use anyhow::Result;

const DEFAULT_CANVAS_BASE_URL: &str = "https://canvas.instructure.com";
const DEFAULT_TELEGRAM_BASE_URL: &str = "https://api.telegram.org";
const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

const DEFAULT_DAILY_HOUR: u32 = 8;

#[derive(Debug, Clone)]
pub struct Config {
    pub canvas: CanvasConfig,
    pub telegram: TelegramConfig,
    pub llm: Option<LlmConfig>,
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone)]
pub struct CanvasConfig {
    pub api_token: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub base_url: String,
    /// Explicit recipients. Empty means "discover from recent bot updates".
    pub chat_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Local wall-clock hour at which the daily assignment check runs.
    pub daily_hour: u32,
}

/// Assemble the configuration from the process environment. Missing
/// required secrets abort startup.
pub fn from_env() -> Result<Config> {
    let canvas = CanvasConfig {
        api_token: required("CANVAS_API_TOKEN")?,
        base_url: optional("CANVAS_BASE_URL", DEFAULT_CANVAS_BASE_URL),
    };

    let telegram = TelegramConfig {
        bot_token: required("TELEGRAM_BOT_TOKEN")?,
        base_url: optional("TELEGRAM_BASE_URL", DEFAULT_TELEGRAM_BASE_URL),
        chat_ids: env::var("TELEGRAM_CHAT_IDS")
            .map(|raw| parse_chat_ids(&raw))
            .unwrap_or_default(),
    };

    let llm = env::var("GROQ_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(|api_key| LlmConfig {
            api_key,
            base_url: optional("GROQ_BASE_URL", DEFAULT_GROQ_BASE_URL),
            model: optional("GROQ_MODEL", DEFAULT_GROQ_MODEL),
        });

    let daily_hour = match env::var("REMINDER_DAILY_HOUR") {
        Ok(raw) => match raw.trim().parse::<u32>() {
            Ok(hour) if hour < 24 => hour,
            _ => anyhow::bail!("REMINDER_DAILY_HOUR must be an hour between 0 and 23"),
        },
        Err(_) => DEFAULT_DAILY_HOUR,
    };

    Ok(Config {
        canvas,
        telegram,
        llm,
        reminders: ReminderConfig { daily_hour },
    })
}

fn required(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => anyhow::bail!("{name} not set in environment"),
    }
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_chat_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
