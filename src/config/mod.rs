use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;

use crate::store::{MAX_AMOUNT, ReminderPolicy};
use crate::tally::{DEFAULT_QUORUM_PERCENT, MAX_QUORUM_PERCENT, MIN_QUORUM_PERCENT};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub voting: VotingConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub treasury: TreasuryConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self> {
        let configured_path =
            std::env::var("BUDGET_API_CONFIG").unwrap_or_else(|_| "config/api.toml".to_string());
        assert!(
            !configured_path.is_empty(),
            "Configuration path must be non-empty"
        );
        assert!(
            configured_path.len() < 4096,
            "Configuration path length exceeds hard limit"
        );

        let mut builder = Config::builder()
            .add_source(File::new(&configured_path, FileFormat::Toml).required(true));

        if let Ok(env_override) = std::env::var("BUDGET_API_ENV") {
            if !env_override.is_empty() {
                let env_file = format!("config/api.{}.toml", env_override);
                if Path::new(&env_file).exists() {
                    builder = builder.add_source(File::new(&env_file, FileFormat::Toml));
                }
            }
        }

        let settings = builder
            .build()
            .map_err(|err| map_config_error(err, &configured_path))?;
        let config: Self = settings
            .try_deserialize()
            .context("Failed to deserialize API configuration")?;

        config.validate()?;
        Ok(config)
    }

    #[cfg(test)]
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .context("Failed to parse configuration")?
            .try_deserialize()
            .context("Failed to deserialize API configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("Server port must be greater than zero");
        }
        self.voting.ensure_bounds()?;
        self.reminders.ensure_bounds()?;
        self.cache.ensure_bounds()?;
        self.treasury.ensure_bounds()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Option<IpAddr>,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> SocketAddr {
        let host = self.host.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(self.port != 0, "HTTP port cannot be zero");
        SocketAddr::new(host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VotingConfig {
    #[serde(default = "VotingConfig::default_quorum_percent")]
    pub quorum_percent: u32,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            quorum_percent: Self::default_quorum_percent(),
        }
    }
}

impl VotingConfig {
    const fn default_quorum_percent() -> u32 {
        DEFAULT_QUORUM_PERCENT
    }

    fn ensure_bounds(&self) -> Result<()> {
        if !(MIN_QUORUM_PERCENT..=MAX_QUORUM_PERCENT).contains(&self.quorum_percent) {
            bail!(
                "voting.quorum_percent must be between {MIN_QUORUM_PERCENT} and {MAX_QUORUM_PERCENT}"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "RemindersConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "RemindersConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "RemindersConfig::default_resend_after_hours")]
    pub resend_after_hours: i64,
    #[serde(default = "RemindersConfig::default_max_reminders")]
    pub max_reminders: u32,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            poll_interval_ms: Self::default_poll_interval_ms(),
            resend_after_hours: Self::default_resend_after_hours(),
            max_reminders: Self::default_max_reminders(),
        }
    }
}

impl RemindersConfig {
    pub fn poll_interval(&self) -> Duration {
        assert!(
            self.poll_interval_ms >= 100,
            "Poll interval must be >= 100ms"
        );
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn policy(&self) -> ReminderPolicy {
        ReminderPolicy {
            resend_after: chrono::Duration::hours(self.resend_after_hours),
            max_reminders: self.max_reminders,
        }
    }

    fn ensure_bounds(&self) -> Result<()> {
        if !(100..=3_600_000).contains(&self.poll_interval_ms) {
            bail!("reminders.poll_interval_ms must be between 100ms and one hour");
        }
        if !(1..=720).contains(&self.resend_after_hours) {
            bail!("reminders.resend_after_hours must be between 1 and 720");
        }
        if self.max_reminders > 100 {
            bail!("reminders.max_reminders exceeds 100");
        }
        Ok(())
    }

    const fn default_enabled() -> bool {
        true
    }

    const fn default_poll_interval_ms() -> u64 {
        60_000
    }

    const fn default_resend_after_hours() -> i64 {
        24
    }

    const fn default_max_reminders() -> u32 {
        3
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub summary_max_capacity: u64,
    pub summary_ttl_seconds: u64,
}

impl CacheConfig {
    fn ensure_bounds(&self) -> Result<()> {
        if self.summary_max_capacity == 0 {
            bail!("cache.summary_max_capacity must be positive");
        }
        if self.summary_ttl_seconds == 0 || self.summary_ttl_seconds > 86_400 {
            bail!("cache.summary_ttl_seconds must be between 1 second and one day");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreasuryConfig {
    #[serde(default)]
    pub opening_balance: i64,
}

impl TreasuryConfig {
    fn ensure_bounds(&self) -> Result<()> {
        if self.opening_balance.unsigned_abs() > MAX_AMOUNT.unsigned_abs() {
            bail!("treasury.opening_balance must be within +/-{MAX_AMOUNT}");
        }
        Ok(())
    }
}

fn map_config_error(err: ConfigError, path: &str) -> ConfigError {
    match err {
        ConfigError::NotFound(_) => ConfigError::NotFound(path.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [server]
        port = 8080

        [cache]
        summary_max_capacity = 16
        summary_ttl_seconds = 30
    "#;

    #[test]
    fn minimal_file_fills_defaults() {
        let config = ApiConfig::from_toml(MINIMAL).expect("valid config");
        assert_eq!(config.voting.quorum_percent, 60);
        assert!(config.reminders.enabled);
        assert_eq!(config.reminders.policy(), ReminderPolicy::default());
        assert_eq!(config.treasury.opening_balance, 0);
        assert_eq!(
            config.server.address(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn quorum_outside_bounds_is_rejected() {
        let raw = format!("{MINIMAL}\n[voting]\nquorum_percent = 40\n");
        assert!(ApiConfig::from_toml(&raw).is_err());
    }

    #[test]
    fn opening_balance_bounds_are_checked() {
        let raw = format!("{MINIMAL}\n[treasury]\nopening_balance = 2000000000000\n");
        assert!(ApiConfig::from_toml(&raw).is_err());
        let raw = format!("{MINIMAL}\n[treasury]\nopening_balance = -2000000000000\n");
        assert!(ApiConfig::from_toml(&raw).is_err());

        let raw = format!("{MINIMAL}\n[treasury]\nopening_balance = {MAX_AMOUNT}\n");
        let config = ApiConfig::from_toml(&raw).expect("balance at the bound");
        assert_eq!(config.treasury.opening_balance, MAX_AMOUNT);
    }

    #[test]
    fn reminder_bounds_are_checked() {
        let raw = format!("{MINIMAL}\n[reminders]\npoll_interval_ms = 10\n");
        assert!(ApiConfig::from_toml(&raw).is_err());
    }
}
