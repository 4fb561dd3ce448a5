use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60 * 60;
pub const DEFAULT_REMINDER_LEAD_TIME_HOURS: u64 = 24;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub reminder_scan_interval_secs: u64,
    pub reminder_lead_time_hours: u64,
    pub reminder_run_on_startup: bool,
    pub notification_timeout_secs: Option<u64>,
    pub reminder_webhook_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            reminder_scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            reminder_lead_time_hours: DEFAULT_REMINDER_LEAD_TIME_HOURS,
            reminder_run_on_startup: true,
            notification_timeout_secs: None,
            reminder_webhook_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| {
                    warn!("SERVER_HOST not set, using {}", defaults.server_host);
                    defaults.server_host.clone()
                }),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            reminder_scan_interval_secs: parse_var(
                "REMINDER_SCAN_INTERVAL_SECS",
                defaults.reminder_scan_interval_secs,
            ),
            reminder_lead_time_hours: parse_var(
                "REMINDER_LEAD_TIME_HOURS",
                defaults.reminder_lead_time_hours,
            ),
            reminder_run_on_startup: parse_var(
                "REMINDER_RUN_ON_STARTUP",
                defaults.reminder_run_on_startup,
            ),
            notification_timeout_secs: optional_var("NOTIFICATION_TIMEOUT_SECS"),
            reminder_webhook_url: env::var("REMINDER_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
        };

        if config.reminder_scan_interval_secs == 0 {
            warn!("REMINDER_SCAN_INTERVAL_SECS must be positive, using default");
            return Self {
                reminder_scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
                ..config
            };
        }

        config
    }

    /// Time between two evaluations of the reminder dispatch loop.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_scan_interval_secs)
    }

    /// How long before the appointment its reminder fires.
    pub fn reminder_lead_time(&self) -> Duration {
        match self.reminder_lead_time_hours.checked_mul(60 * 60) {
            Some(secs) => Duration::from_secs(secs),
            None => {
                warn!(
                    "REMINDER_LEAD_TIME_HOURS {} is out of range, using default {}",
                    self.reminder_lead_time_hours, DEFAULT_REMINDER_LEAD_TIME_HOURS
                );
                Duration::from_secs(DEFAULT_REMINDER_LEAD_TIME_HOURS * 60 * 60)
            }
        }
    }

    pub fn notification_timeout(&self) -> Option<Duration> {
        self.notification_timeout_secs.map(Duration::from_secs)
    }

    pub fn is_webhook_configured(&self) -> bool {
        self.reminder_webhook_url.is_some()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {}", key, default);
            default
        }
    }
}

fn optional_var<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("{} has invalid value '{}', ignoring", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = AppConfig::default();
        assert_eq!(config.scan_interval(), Duration::from_secs(3600));
        assert_eq!(config.reminder_lead_time(), Duration::from_secs(24 * 3600));
        assert!(config.notification_timeout().is_none());
        assert!(!config.is_webhook_configured());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn oversized_lead_time_falls_back_to_default() {
        let config = AppConfig {
            reminder_lead_time_hours: u64::MAX,
            ..AppConfig::default()
        };
        assert_eq!(config.reminder_lead_time(), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn parse_var_falls_back_on_garbage() {
        env::set_var("SHARED_CONFIG_TEST_GARBAGE", "not-a-number");
        assert_eq!(parse_var("SHARED_CONFIG_TEST_GARBAGE", 42u64), 42);
        env::remove_var("SHARED_CONFIG_TEST_GARBAGE");
    }

    #[test]
    fn optional_var_reads_numbers() {
        env::set_var("SHARED_CONFIG_TEST_TIMEOUT", "15");
        assert_eq!(optional_var::<u64>("SHARED_CONFIG_TEST_TIMEOUT"), Some(15));
        env::remove_var("SHARED_CONFIG_TEST_TIMEOUT");
        assert_eq!(optional_var::<u64>("SHARED_CONFIG_TEST_TIMEOUT"), None);
    }
}
