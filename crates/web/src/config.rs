use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub database_url: String,
    pub data_dir: PathBuf,
    pub training_dir: PathBuf,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub allowed_origins: Vec<String>,
    pub update_interval: Duration,
    pub scheduler_enabled: bool,
    pub pose_command: String,
    pub trainer_command: String,
    pub yt_dlp_bin: String,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be true or false, got '{}'", key, other),
    }
}

/// `*` or a comma separated list of origins
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let hours: u64 = var_or("UPDATE_INTERVAL_HOURS", "1")
            .parse()
            .context("UPDATE_INTERVAL_HOURS must be a whole number of hours")?;
        if hours == 0 {
            anyhow::bail!("UPDATE_INTERVAL_HOURS must be at least 1");
        }

        let environment = std::env::var("APP_ENV")
            .or_else(|_| std::env::var("FLASK_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port: var_or("PORT", "5000").parse().context("PORT must be a number")?,
            environment,
            database_url: var_or("DATABASE_URL", "sqlite://data/companion.db"),
            data_dir: PathBuf::from(var_or("DATA_DIR", "data")),
            training_dir: PathBuf::from(var_or("TRAINING_DIR", ".")),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            gemini_model: var_or("GEMINI_MODEL", "gemini-2.5-pro"),
            allowed_origins: parse_origins(&var_or("ALLOWED_ORIGINS", "*")),
            update_interval: Duration::from_secs(hours * 3600),
            scheduler_enabled: parse_bool("SCHEDULER_ENABLED", &var_or("SCHEDULER_ENABLED", "true"))?,
            pose_command: var_or("POSE_COMMAND", "python skeleton.py"),
            trainer_command: var_or("TRAINER_COMMAND", "python train_web.py"),
            yt_dlp_bin: var_or("YT_DLP_BIN", "yt-dlp"),
            ffmpeg_bin: var_or("FFMPEG_BIN", "ffmpeg"),
            ffprobe_bin: var_or("FFPROBE_BIN", "ffprobe"),
        })
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}
