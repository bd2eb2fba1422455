//! Outgoing email for the signup flow.
//!
//! Handlers depend on the [`Mailer`] trait only. Three transports exist:
//! [`SmtpMailer`] for real delivery, [`LogMailer`] which writes messages to
//! the tracing log (used when SMTP is not configured), and [`MemoryMailer`]
//! which keeps messages in memory for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

pub mod smtp;

pub use smtp::{EmailConfig, SmtpMailer};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// Delivery refused by a non-SMTP transport.
    #[error("Email delivery rejected: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Message and trait
// ---------------------------------------------------------------------------

/// A plain-text message to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    /// The message carrying a signup confirmation code.
    pub fn confirmation_code(to: &str, username: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "YaMDb confirmation code".to_string(),
            body: format!(
                "Hello, {username}!\n\n\
                 Your confirmation code is: {code}\n\n\
                 Exchange it for an access token at /api/v1/auth/token/."
            ),
        }
    }
}

/// A transport that delivers [`OutgoingEmail`]s.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

// ---------------------------------------------------------------------------
// LogMailer
// ---------------------------------------------------------------------------

/// Writes each message to the log instead of sending it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "Email not sent (SMTP not configured)",
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryMailer
// ---------------------------------------------------------------------------

/// Records messages in memory. Can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutgoingEmail>>,
    failing: AtomicBool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `true`, every subsequent send fails with [`MailError::Rejected`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All messages delivered so far.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    /// The most recent message delivered to `to`.
    pub fn last_to(&self, to: &str) -> Option<OutgoingEmail> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Rejected("memory mailer set to fail".into()));
        }
        self.outbox
            .lock()
            .map_err(|_| MailError::Rejected("outbox lock poisoned".into()))?
            .push(email.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
