use crate::{
    composer::MessageComposer,
    config::SessionConfig,
    error::Result,
    internal,
    message::MimeMessage,
    outgoing,
    session::SessionConfigurator,
    transport::{Envelope, Transport},
};

/// A message being composed together with the session it will be sent over.
///
/// The two halves stay independently reachable so callers can keep using the
/// composer and configurator APIs directly.
#[derive(Debug, Default)]
pub struct Email {
    pub composer: MessageComposer,
    pub session: SessionConfigurator,
}

impl Email {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            composer: MessageComposer::new(),
            session: SessionConfigurator::from_config(config),
        }
    }

    /// Builds the message once.
    ///
    /// # Errors
    ///
    /// See [`MessageComposer::build_message`].
    pub fn build_message(&mut self) -> Result<&MimeMessage> {
        self.composer.build_message(&mut self.session)
    }

    /// The built message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&MimeMessage> {
        self.composer.message()
    }

    /// Builds the message, if not already built, and hands it to `transport`.
    ///
    /// Returns the Message-ID of the delivered message. The composer is only
    /// marked as built once the message has a sender and recipients, so a
    /// send rejected for either can be retried after correcting the input.
    ///
    /// # Errors
    ///
    /// Fails when building fails, when the message lacks a sender or
    /// recipients, or when the transport refuses it.
    pub async fn send<T>(&mut self, transport: &T) -> Result<String>
    where
        T: Transport + ?Sized,
    {
        if let Some(message) = self.composer.message() {
            let envelope = Envelope::for_message(message)?;
            return deliver(message, &envelope, transport).await;
        }

        let message = self.composer.compose(&mut self.session)?;
        let envelope = Envelope::for_message(&message)?;
        let message = self.composer.commit(message);

        deliver(message, &envelope, transport).await
    }
}

async fn deliver<T>(message: &MimeMessage, envelope: &Envelope, transport: &T) -> Result<String>
where
    T: Transport + ?Sized,
{
    let data = message.formatted()?;

    outgoing!(
        level = INFO,
        "Sending {} from {} to {} recipient(s)",
        message.message_id(),
        envelope.sender,
        envelope.recipients.len()
    );

    transport
        .send(message.session(), envelope, &data)
        .await
        .inspect_err(|err| internal!(level = WARN, "Delivery failed: {err}"))?;

    Ok(message.message_id().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::EmailError, transport::MemoryTransport};

    #[tokio::test]
    async fn test_send_builds_and_delivers() {
        let mut email = Email::new();
        email.session.set_host_name("localhost");
        email
            .composer
            .set_from("abc@def.com")
            .unwrap()
            .add_to("to@def.com")
            .unwrap()
            .add_bcc("hidden@def.com")
            .unwrap()
            .set_subject("Hello")
            .set_content("Body", "text/plain");

        let transport = MemoryTransport::new();
        let id = email.send(&transport).await.unwrap();

        assert!(email.composer.is_built());
        let sent = transport.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].envelope.sender, "abc@def.com");
        assert_eq!(
            sent[0].envelope.recipients,
            vec!["to@def.com", "hidden@def.com"]
        );

        let rendered = String::from_utf8(sent[0].data.clone()).unwrap();
        assert!(rendered.contains(&id));
        assert!(!rendered.contains("hidden@def.com"));
    }

    #[tokio::test]
    async fn test_send_requires_recipients() {
        let mut email = Email::new();
        email.session.set_host_name("localhost");
        email.composer.set_from("abc@def.com").unwrap();

        let err = email.send(&MemoryTransport::new()).await.unwrap_err();
        assert!(matches!(err, EmailError::MissingRecipients));
        assert!(!email.composer.is_built());
    }

    #[tokio::test]
    async fn test_send_retries_after_correction() {
        let mut email = Email::new();
        email.session.set_host_name("localhost");
        email.composer.set_from("abc@def.com").unwrap();

        let transport = MemoryTransport::new();
        let err = email.send(&transport).await.unwrap_err();
        assert!(matches!(err, EmailError::MissingRecipients));

        email.composer.add_to("to@def.com").unwrap();
        let id = email.send(&transport).await.unwrap();

        assert!(email.composer.is_built());
        assert_eq!(email.message().map(MimeMessage::message_id), Some(id.as_str()));
        assert_eq!(transport.sent().await[0].envelope.recipients, vec!["to@def.com"]);
    }

    #[tokio::test]
    async fn test_send_missing_sender_can_be_corrected() {
        let mut email = Email::new();
        email.session.set_host_name("localhost");
        email.composer.add_to("to@def.com").unwrap();

        let transport = MemoryTransport::new();
        let err = email.send(&transport).await.unwrap_err();
        assert!(matches!(err, EmailError::MissingSender));
        assert!(!email.composer.is_built());

        email.composer.set_from("abc@def.com").unwrap();
        email.send(&transport).await.unwrap();
        assert_eq!(transport.sent().await[0].envelope.sender, "abc@def.com");
    }

    #[tokio::test]
    async fn test_send_again_redelivers_built_message() {
        let mut email = Email::new();
        email.session.set_host_name("localhost");
        email
            .composer
            .set_from("abc@def.com")
            .unwrap()
            .add_to("to@def.com")
            .unwrap();

        let transport = MemoryTransport::new();
        let first = email.send(&transport).await.unwrap();
        let second = email.send(&transport).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn test_send_requires_host() {
        let mut email = Email::new();
        email.composer.add_to("to@def.com").unwrap();

        let err = email.send(&MemoryTransport::new()).await.unwrap_err();
        assert!(matches!(err, EmailError::MissingHost));
        assert!(!email.composer.is_built());
    }
}
