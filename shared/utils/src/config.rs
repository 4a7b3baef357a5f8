use chrono::Duration;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub email: EmailConfig,
    pub reminder: ReminderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_size: usize,
}

/// SMTP connection settings plus the reminder recipient.
///
/// The credential is an opaque secret; it is redacted from Debug output and
/// must never reach logs in cleartext.
#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub sender_address: String,
    pub sender_password: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub recipient_address: String,
    pub enabled: bool,
}

impl EmailConfig {
    /// Presence check only; no format validation is required of the core.
    pub fn is_complete(&self) -> bool {
        self.enabled
            && !self.sender_address.is_empty()
            && !self.sender_password.is_empty()
            && !self.smtp_host.is_empty()
            && !self.recipient_address.is_empty()
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("sender_address", &self.sender_address)
            .field("sender_password", &"<redacted>")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("recipient_address", &self.recipient_address)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Reminder engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Days before a due date during which a record counts as upcoming.
    /// Valid range is [7, 90]; values outside are clamped on load.
    pub lead_time_days: i64,
    /// Minimum interval between email sends. This is the single named
    /// interval value; nothing re-derives it per call site. The short
    /// default exists for demonstration; production deployments should
    /// use hours to days.
    pub min_send_interval_minutes: i64,
    /// Period of the background evaluation tick.
    pub tick_interval_minutes: u64,
    /// Path of the state snapshot file.
    pub data_file: String,
    /// Path of the append-only send log.
    pub send_log_file: String,
}

pub const LEAD_TIME_MIN_DAYS: i64 = 7;
pub const LEAD_TIME_MAX_DAYS: i64 = 90;

impl ReminderConfig {
    pub fn min_send_interval(&self) -> Duration {
        Duration::minutes(self.min_send_interval_minutes)
    }

    pub fn clamp_lead_time(days: i64) -> i64 {
        days.clamp(LEAD_TIME_MIN_DAYS, LEAD_TIME_MAX_DAYS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("PATENTWATCH").separator("__"));

        let mut loaded: Self = config.build()?.try_deserialize()?;
        loaded.reminder.lead_time_days = ReminderConfig::clamp_lead_time(loaded.reminder.lead_time_days);
        Ok(loaded)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_upload_size: 16 * 1024 * 1024, // 16MB
            },
            email: EmailConfig {
                sender_address: String::new(),
                sender_password: String::new(),
                smtp_host: "smtp.qq.com".to_string(),
                smtp_port: 587,
                recipient_address: String::new(),
                enabled: false,
            },
            reminder: ReminderConfig {
                lead_time_days: 49,
                min_send_interval_minutes: 3,
                tick_interval_minutes: 2,
                data_file: "patentwatch_state.json".to_string(),
                send_log_file: "email_log.txt".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "plain".to_string(),
                file_path: None,
            },
        }
    }
}
