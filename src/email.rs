//! Email copy of a medication reminder, sent over SMTP with STARTTLS.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::EmailConfig;
use crate::twiml::ReminderRequest;

const SUBJECT: &str = "Medicine Reminder";

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("missing email setting: {0}")]
    MissingSetting(&'static str),
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Plain-text body listing the reminder fields.
pub fn reminder_body(req: &ReminderRequest) -> String {
    format!(
        "Time to take your medicine:\n\nName: {}\nDosage: {}\nTime: {}",
        req.name(),
        req.dosage(),
        req.time()
    )
}

pub fn build_message(config: &EmailConfig, req: &ReminderRequest) -> Result<Message, EmailError> {
    let required = [
        ("address", &config.address),
        ("password", &config.password),
        ("recipient", &config.recipient),
    ];
    if let Some((name, _)) = required.into_iter().find(|(_, v)| v.is_empty()) {
        return Err(EmailError::MissingSetting(name));
    }

    let message = Message::builder()
        .from(config.address.parse::<Mailbox>()?)
        .to(config.recipient.parse::<Mailbox>()?)
        .subject(SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(reminder_body(req))?;
    Ok(message)
}

/// Send the reminder email through the configured SMTP relay.
pub async fn send_reminder(config: &EmailConfig, req: &ReminderRequest) -> Result<(), EmailError> {
    let message = build_message(config, req)?;

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)?
        .port(config.smtp_port)
        .credentials(Credentials::new(
            config.address.clone(),
            config.password.clone(),
        ))
        .build();
    mailer.send(message).await?;

    info!("Reminder email sent to {}", config.recipient);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            address: "clinic@example.com".into(),
            password: "app-password".into(),
            recipient: "patient@example.com".into(),
            ..Default::default()
        }
    }

    #[test]
    fn body_lists_reminder_fields() {
        let body = reminder_body(&ReminderRequest::new("Paracetamol", "500mg", "8 PM"));
        assert_eq!(
            body,
            "Time to take your medicine:\n\nName: Paracetamol\nDosage: 500mg\nTime: 8 PM"
        );
    }

    #[test]
    fn builds_message_with_headers() {
        let message = build_message(&config(), &ReminderRequest::new("Aspirin", "75mg", "9 AM"))
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: clinic@example.com"));
        assert!(raw.contains("To: patient@example.com"));
        assert!(raw.contains("Subject: Medicine Reminder"));
        assert!(raw.contains("Name: Aspirin"));
        assert!(raw.contains("Dosage: 75mg"));
    }

    #[test]
    fn missing_settings_are_rejected() {
        let mut cfg = config();
        cfg.recipient.clear();
        assert!(matches!(
            build_message(&cfg, &ReminderRequest::default()),
            Err(EmailError::MissingSetting("recipient"))
        ));
    }

    #[test]
    fn invalid_address_is_rejected() {
        let cfg = EmailConfig {
            recipient: "not an address".into(),
            ..config()
        };
        assert!(matches!(
            build_message(&cfg, &ReminderRequest::default()),
            Err(EmailError::Address(_))
        ));
    }
}
