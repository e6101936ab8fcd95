//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "app": { "dailyLimit": "100.00", "cacheTtlSecs": 60, "webhookUrl": null }
//! }
//! ```
//! Environment variables override the file for CI and testing.
//! The engine receives these values explicitly through its constructor;
//! nothing reads ambient process state at operation time.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    daily_limit: Option<Decimal>,
    #[serde(default)]
    cache_ttl_secs: Option<u64>,
    #[serde(default)]
    webhook_url: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Default daily outflow ceiling per wallet per kind: 100.00
pub const DEFAULT_DAILY_LIMIT_CENTS: i64 = 100_00;

/// Default cache entry time-to-live
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Moneta configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// Daily outflow ceiling per wallet per operation kind
    pub daily_limit: Decimal,
    /// TTL for advisory cache entries
    pub cache_ttl_secs: u64,
    /// Endpoint for best-effort JSON notifications, if any
    pub webhook_url: Option<String>,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daily_limit: Decimal::new(DEFAULT_DAILY_LIMIT_CENTS, 2),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            webhook_url: None,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// Precedence, highest first:
    /// 1. `MONETA_DAILY_LIMIT`, `MONETA_CACHE_TTL_SECS`, `MONETA_WEBHOOK_URL`
    /// 2. settings.json
    /// 3. built-in defaults
    pub fn load(moneta_dir: &Path) -> Result<Self> {
        let settings_path = moneta_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let daily_limit = std::env::var("MONETA_DAILY_LIMIT")
            .ok()
            .and_then(|v| v.parse::<Decimal>().ok())
            .or(raw.app.daily_limit)
            .unwrap_or_else(|| Decimal::new(DEFAULT_DAILY_LIMIT_CENTS, 2));

        let cache_ttl_secs = std::env::var("MONETA_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .or(raw.app.cache_ttl_secs)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        let webhook_url = std::env::var("MONETA_WEBHOOK_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| raw.app.webhook_url.clone());

        Ok(Self {
            daily_limit,
            cache_ttl_secs,
            webhook_url,
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory, preserving settings this crate
    /// doesn't manage
    pub fn save(&self, moneta_dir: &Path) -> Result<()> {
        let settings_path = moneta_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.app.daily_limit = Some(self.daily_limit);
        settings.app.cache_ttl_secs = Some(self.cache_ttl_secs);
        settings.app.webhook_url = self.webhook_url.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Cache TTL as a duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
