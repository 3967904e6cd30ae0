use std::path::PathBuf;

use anyhow::{Context, Result};

/// Origins always allowed to call the API cross-origin (local dev servers).
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://127.0.0.1:5501",
    "http://localhost:5501",
    "http://127.0.0.1:5500",
    "http://localhost:5500",
];

/// Application configuration loaded from environment variables.
/// Nothing is strictly required: a missing API key puts the model gateway in
/// degraded mode instead of stopping the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub allowed_origins: Vec<String>,
    pub content_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let extra_origins = std::env::var("ALLOWED_ORIGINS").unwrap_or_default();

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            allowed_origins: normalize_origins(
                DEFAULT_ALLOWED_ORIGINS
                    .iter()
                    .map(|o| o.to_string())
                    .chain(optional_env("NETLIFY_APP_URL"))
                    .chain(extra_origins.split(',').map(str::to_string)),
            ),
            content_dir: std::env::var("CONTENT_DIR")
                .unwrap_or_else(|_| "content".to_string())
                .into(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads `key`, treating unset and blank values alike.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims whitespace and trailing slashes, drops empties and duplicates.
fn normalize_origins(origins: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for origin in origins {
        let origin = origin.trim().trim_end_matches('/');
        if !origin.is_empty() && !normalized.iter().any(|o| o == origin) {
            normalized.push(origin.to_string());
        }
    }
    normalized
}
