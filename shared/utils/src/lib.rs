pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;

pub use config::*;
pub use error::*;
pub use ingest::*;
pub use logging::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.reminder.lead_time_days, 49);
        assert_eq!(config.reminder.min_send_interval_minutes, 3);
    }

    #[test]
    fn test_error_codes() {
        let error = PatentwatchError::validation("due_date", "missing");
        assert_eq!(error.error_code(), "VALIDATION_ERROR");
        assert_eq!(error.http_status_code(), 400);
    }
}
