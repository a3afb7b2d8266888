//! Outbound mail used by password recovery.

/// Delivers password-reset links.
pub trait Mailer: Send + Sync {
    fn send_password_reset(&self, to: &str, name: &str, reset_url: &str) -> Result<(), MailError>;
}

/// Mailer that writes the message to the log instead of delivering it.
pub struct LogMailer {
    from_address: String,
}

impl LogMailer {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }
}

impl Mailer for LogMailer {
    fn send_password_reset(&self, to: &str, name: &str, reset_url: &str) -> Result<(), MailError> {
        tracing::info!(
            from = %self.from_address,
            to = %to,
            "Password reset requested for {}: {}",
            name,
            reset_url
        );
        Ok(())
    }
}

/// Mail delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail delivery failed: {0}")]
    DeliveryFailed(String),
}
