//! Email Notifier
//!
//! Builds one plain-text reminder per cycle enumerating all due records and
//! delivers it over SMTP with lettre. Port 465 opens an implicit-TLS
//! session; any other port connects plaintext and upgrades via STARTTLS
//! before authenticating. There is no unencrypted fallback and no retry
//! inside a send attempt.

use std::collections::HashMap;

use anyhow::{Context, Result};
use handlebars::Handlebars;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde_json::json;

use patentwatch_models::ClassifiedRecord;
use patentwatch_utils::{EmailConfig, SendError};

const REMINDER_TEMPLATE_ID: &str = "fee_reminder";

const REMINDER_SUBJECT: &str = "Patent Fee Reminder";

const REMINDER_BODY_TEMPLATE: &str = "\
The following patents are close to their fee deadline or already overdue, please handle them promptly:

{{#each records}}\
Patent name: {{name}}
Patent number: {{number}}
Fee due date: {{due_date}}
Days remaining: {{days_remaining}}
Fee amount: {{fee_amount}}

{{/each}}";

/// Bounded socket timeout for one delivery attempt.
const SMTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub struct EmailNotifier {
    handlebars: Handlebars<'static>,
}

impl EmailNotifier {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string(REMINDER_TEMPLATE_ID, REMINDER_BODY_TEMPLATE)
            .expect("built-in reminder template must compile");
        Self { handlebars }
    }

    /// Render the plain-text body listing every due record.
    pub fn build_body(&self, due_records: &[ClassifiedRecord]) -> Result<String> {
        let records: Vec<_> = due_records
            .iter()
            .map(|c| {
                json!({
                    "name": c.record.name,
                    "number": c.record.number,
                    "due_date": c.record.due_date.format("%Y-%m-%d").to_string(),
                    "days_remaining": c.days_remaining,
                    "fee_amount": c.record.fee_amount.to_string(),
                })
            })
            .collect();

        let mut vars = HashMap::new();
        vars.insert("records", records);

        self.handlebars
            .render(REMINDER_TEMPLATE_ID, &vars)
            .context("Failed to render reminder body")
    }

    /// Attempt one delivery of the reminder for `due_records`.
    pub async fn send(&self, config: &EmailConfig, due_records: &[ClassifiedRecord]) -> Result<(), SendError> {
        let body = self
            .build_body(due_records)
            .map_err(|e| SendError::Other(e.to_string()))?;

        let from: Mailbox = config
            .sender_address
            .parse()
            .map_err(|_| SendError::Other(format!("invalid sender address '{}'", config.sender_address)))?;
        let to: Mailbox = config
            .recipient_address
            .parse()
            .map_err(|_| SendError::Other(format!("invalid recipient address '{}'", config.recipient_address)))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(REMINDER_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| SendError::Other(format!("failed to build message: {}", e)))?;

        let creds = Credentials::new(config.sender_address.clone(), config.sender_password.clone());

        // 465 implies SMTPS; everything else upgrades with STARTTLS.
        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(classify_smtp_error)?;

        let mailer = builder
            .port(config.smtp_port)
            .credentials(creds)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        mailer.send(email).await.map_err(classify_smtp_error)?;

        Ok(())
    }
}

impl Default for EmailNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a transport error onto the reportable taxonomy. Rejected credentials
/// come back as permanent 5xx responses; timeouts and pre-response failures
/// are connectivity.
fn classify_smtp_error(error: lettre::transport::smtp::Error) -> SendError {
    if error.is_timeout() {
        SendError::Connect
    } else if error.is_permanent() {
        SendError::Auth
    } else if error.is_transient() {
        SendError::Other(error.to_string())
    } else {
        SendError::Connect
    }
}
