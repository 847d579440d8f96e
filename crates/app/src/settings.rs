//! Handles settings for the application. Configuration is written in
//! `config/settings.toml` and can be overridden with `BUDGET__*` environment
//! variables, e.g. `BUDGET__TELEGRAM__TOKEN`.
//!
//! See `config/settings.example.toml` for the configuration.

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use engine::{FileFormat, RunningBalancePolicy};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";

#[derive(Debug, Parser)]
#[command(name = "budget_bot", version)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long, env = "BUDGET_CONFIG")]
    config: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    /// Path of a SQLite file, created when missing.
    Sqlite(String),
    /// Any connection string sea-orm understands.
    Url(String),
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    /// IANA timezone used for month boundaries and naive import timestamps.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub running_balance_policy: RunningBalancePolicy,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            running_balance_policy: RunningBalancePolicy::default(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    pub allowed_user_id: u64,
    pub max_import_bytes: Option<u32>,
    /// Format of the `/report` export.
    #[serde(default)]
    pub report_format: FileFormat,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub database: Database,
    #[serde(default)]
    pub ledger: Ledger,
    pub telegram: Telegram,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("BUDGET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
