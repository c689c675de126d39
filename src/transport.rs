//! Hand-off to the delivery layer.
//!
//! This crate never speaks SMTP itself. A [`Transport`] receives the resolved
//! session, the SMTP envelope and the rendered message, and is responsible
//! for everything from there on.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::{EmailError, Result},
    message::MimeMessage,
    session::Session,
};

/// SMTP envelope derived from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Reverse path, the bounce address if configured, otherwise From.
    pub sender: String,
    /// Forward paths: To, Cc and Bcc in that order.
    pub recipients: Vec<String>,
}

impl Envelope {
    /// Derives the envelope for `message`.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::MissingSender`] when neither a bounce address nor
    /// a From address is available, and [`EmailError::MissingRecipients`]
    /// when the message has no recipients.
    pub fn for_message(message: &MimeMessage) -> Result<Self> {
        let sender = message
            .session()
            .bounce_address()
            .map(ToString::to_string)
            .or_else(|| message.from().map(|from| from.address().to_string()))
            .ok_or(EmailError::MissingSender)?;

        let recipients: Vec<String> = message
            .all_recipients()
            .map(|address| address.address().to_string())
            .collect();

        if recipients.is_empty() {
            return Err(EmailError::MissingRecipients);
        }

        Ok(Self { sender, recipients })
    }
}

/// Something that can deliver a rendered message.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers `data` to every recipient of `envelope` using `session`.
    ///
    /// # Errors
    ///
    /// Implementations return [`EmailError::Transport`] when delivery fails.
    async fn send(&self, session: &Session, envelope: &Envelope, data: &[u8]) -> Result<()>;
}

/// A message accepted by a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub host: Option<String>,
    pub envelope: Envelope,
    pub data: Vec<u8>,
}

/// Transport that keeps delivered messages in memory.
///
/// Recipients registered with [`MemoryTransport::rejecting`] are refused.
/// When the session allows partial sends the remaining recipients are still
/// delivered to, otherwise the whole message fails.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    rejected: Vec<String>,
    sent: Mutex<Vec<SentMessage>>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses delivery to `address`.
    #[must_use]
    pub fn rejecting(mut self, address: impl Into<String>) -> Self {
        self.rejected.push(address.into());
        self
    }

    /// Everything delivered so far.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    fn is_rejected(&self, recipient: &str) -> bool {
        self.rejected
            .iter()
            .any(|rejected| rejected.eq_ignore_ascii_case(recipient))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, session: &Session, envelope: &Envelope, data: &[u8]) -> Result<()> {
        let (accepted, refused): (Vec<_>, Vec<_>) = envelope
            .recipients
            .iter()
            .cloned()
            .partition(|recipient| !self.is_rejected(recipient));

        let partial = session.properties().flag(crate::config::keys::SEND_PARTIAL);
        if accepted.is_empty() || (!refused.is_empty() && !partial) {
            return Err(EmailError::Transport(format!(
                "Recipients refused: {}",
                refused.join(", ")
            )));
        }

        self.sent.lock().await.push(SentMessage {
            host: session.host().map(ToString::to_string),
            envelope: Envelope {
                sender: envelope.sender.clone(),
                recipients: accepted,
            },
            data: data.to_vec(),
        });

        Ok(())
    }
}
