//! Message composition.
//!
//! [`MessageComposer`] collects sender, recipients, headers and content
//! through setters and turns them into a [`MimeMessage`] exactly once.

use chrono::{DateTime, Utc};

use crate::{
    address::{Address, AddressList},
    charset::Charset,
    error::{EmailError, Result},
    header::HeaderMap,
    internal,
    message::{Content, MimeMessage, RecipientType},
    session::SessionConfigurator,
};

/// Accumulates the parts of a message and builds it once.
///
/// ```
/// use empath_compose::{MessageComposer, SessionConfigurator};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = SessionConfigurator::new();
/// session.set_host_name("localhost");
///
/// let mut composer = MessageComposer::new();
/// composer
///     .set_from("sender@example.com")?
///     .add_to("recipient@example.com")?
///     .set_subject("Test");
///
/// let message = composer.build_message(&mut session)?;
/// assert_eq!(message.subject(), Some("Test"));
///
/// // A composer only ever builds one message
/// assert!(composer.build_message(&mut session).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageComposer {
    from: Option<Address>,
    to: AddressList,
    cc: AddressList,
    bcc: AddressList,
    reply_to: AddressList,
    headers: HeaderMap,
    subject: Option<String>,
    charset: Option<Charset>,
    content: Option<(Content, String)>,
    sent_date: Option<DateTime<Utc>>,
    /// Set once, by the first successful build.
    built: Option<MimeMessage>,
}

impl MessageComposer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn list_mut(&mut self, kind: RecipientType) -> &mut AddressList {
        match kind {
            RecipientType::To => &mut self.to,
            RecipientType::Cc => &mut self.cc,
            RecipientType::Bcc => &mut self.bcc,
        }
    }

    fn append<'a, S>(&mut self, kind: RecipientType, addresses: Option<&'a [S]>) -> Result<&mut Self>
    where
        S: AsRef<str> + 'a,
    {
        let addresses = addresses.ok_or(EmailError::MissingAddresses)?;
        let parsed = AddressList::parse_all(addresses)?;
        self.list_mut(kind).extend(parsed.0);
        Ok(self)
    }


    /// Adds a single To recipient.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn add_to(&mut self, address: &str) -> Result<&mut Self> {
        self.to.push(Address::parse(address)?);
        Ok(self)
    }

    /// Adds a To recipient with a display name.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn add_to_with_name(&mut self, address: &str, name: &str) -> Result<&mut Self> {
        self.to.push(Address::with_name(address, name)?);
        Ok(self)
    }

    /// Adds several To recipients. An empty slice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::MissingAddresses`] when `addresses` is `None`,
    /// or the first validation error. Nothing is added on failure.
    pub fn add_to_list<'a, S>(&mut self, addresses: Option<&'a [S]>) -> Result<&mut Self>
    where
        S: AsRef<str> + 'a,
    {
        self.append(RecipientType::To, addresses)
    }

    /// Adds a single Cc recipient.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn add_cc(&mut self, address: &str) -> Result<&mut Self> {
        self.cc.push(Address::parse(address)?);
        Ok(self)
    }

    /// Adds a Cc recipient with a display name.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn add_cc_with_name(&mut self, address: &str, name: &str) -> Result<&mut Self> {
        self.cc.push(Address::with_name(address, name)?);
        Ok(self)
    }

    /// Adds several Cc recipients, see [`Self::add_to_list`].
    ///
    /// # Errors
    ///
    /// See [`Self::add_to_list`].
    pub fn add_cc_list<'a, S>(&mut self, addresses: Option<&'a [S]>) -> Result<&mut Self>
    where
        S: AsRef<str> + 'a,
    {
        self.append(RecipientType::Cc, addresses)
    }

    /// Adds a single Bcc recipient.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn add_bcc(&mut self, address: &str) -> Result<&mut Self> {
        self.bcc.push(Address::parse(address)?);
        Ok(self)
    }

    /// Adds a Bcc recipient with a display name.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn add_bcc_with_name(&mut self, address: &str, name: &str) -> Result<&mut Self> {
        self.bcc.push(Address::with_name(address, name)?);
        Ok(self)
    }

    /// Adds several Bcc recipients, see [`Self::add_to_list`].
    ///
    /// # Errors
    ///
    /// See [`Self::add_to_list`].
    pub fn add_bcc_list<'a, S>(&mut self, addresses: Option<&'a [S]>) -> Result<&mut Self>
    where
        S: AsRef<str> + 'a,
    {
        self.append(RecipientType::Bcc, addresses)
    }

    /// Replaces the To list.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::MissingAddresses`] for an empty slice, or the
    /// first validation error. The list is untouched on failure.
    pub fn set_to<S: AsRef<str>>(&mut self, addresses: &[S]) -> Result<&mut Self> {
        replace(&mut self.to, addresses)?;
        Ok(self)
    }

    /// Replaces the Cc list, see [`Self::set_to`].
    ///
    /// # Errors
    ///
    /// See [`Self::set_to`].
    pub fn set_cc<S: AsRef<str>>(&mut self, addresses: &[S]) -> Result<&mut Self> {
        replace(&mut self.cc, addresses)?;
        Ok(self)
    }

    /// Replaces the Bcc list, see [`Self::set_to`].
    ///
    /// # Errors
    ///
    /// See [`Self::set_to`].
    pub fn set_bcc<S: AsRef<str>>(&mut self, addresses: &[S]) -> Result<&mut Self> {
        replace(&mut self.bcc, addresses)?;
        Ok(self)
    }

    /// Adds a Reply-To address.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn add_reply_to(&mut self, address: &str) -> Result<&mut Self> {
        self.reply_to.push(Address::parse(address)?);
        Ok(self)
    }

    /// Adds a Reply-To address with a display name.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn add_reply_to_with_name(&mut self, address: &str, name: &str) -> Result<&mut Self> {
        self.reply_to.push(Address::with_name(address, name)?);
        Ok(self)
    }

    /// Replaces the Reply-To list, see [`Self::set_to`].
    ///
    /// # Errors
    ///
    /// See [`Self::set_to`].
    pub fn set_reply_to<S: AsRef<str>>(&mut self, addresses: &[S]) -> Result<&mut Self> {
        replace(&mut self.reply_to, addresses)?;
        Ok(self)
    }

    /// Adds or overwrites a custom header.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::InvalidArgument`] if the name or value is empty
    /// or malformed.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        self.headers.insert(name, value)?;
        Ok(self)
    }

    /// Replaces every custom header.
    pub fn set_headers(&mut self, headers: HeaderMap) -> &mut Self {
        self.headers = headers;
        self
    }

    /// Sets the sender.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn set_from(&mut self, address: &str) -> Result<&mut Self> {
        self.from = Some(Address::parse(address)?);
        Ok(self)
    }

    /// Sets the sender with a display name.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn set_from_with_name(&mut self, address: &str, name: &str) -> Result<&mut Self> {
        self.from = Some(Address::with_name(address, name)?);
        Ok(self)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the charset used for the subject, headers and text content.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::UnknownCharset`] for unknown labels.
    pub fn set_charset(&mut self, charset: &str) -> Result<&mut Self> {
        self.charset = Some(Charset::new(charset)?);
        Ok(self)
    }

    /// Stores the body and its MIME type, e.g. `text/plain` or `text/html`.
    pub fn set_content(
        &mut self,
        content: impl Into<Content>,
        content_type: impl Into<String>,
    ) -> &mut Self {
        self.content = Some((content.into(), content_type.into()));
        self
    }

    /// Fixes the Date header; otherwise the build time is used.
    pub fn set_sent_date(&mut self, date: DateTime<Utc>) -> &mut Self {
        self.sent_date = Some(date);
        self
    }

    #[must_use]
    pub const fn from_address(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    #[must_use]
    pub const fn to_addresses(&self) -> &AddressList {
        &self.to
    }

    #[must_use]
    pub const fn cc_addresses(&self) -> &AddressList {
        &self.cc
    }

    #[must_use]
    pub const fn bcc_addresses(&self) -> &AddressList {
        &self.bcc
    }

    #[must_use]
    pub const fn reply_to_addresses(&self) -> &AddressList {
        &self.reply_to
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    #[must_use]
    pub const fn charset(&self) -> Option<&Charset> {
        self.charset.as_ref()
    }

    #[must_use]
    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref().map(|(content, _)| content)
    }

    #[must_use]
    pub const fn sent_date(&self) -> Option<&DateTime<Utc>> {
        self.sent_date.as_ref()
    }

    #[must_use]
    pub const fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// The built message, `None` until [`Self::build_message`] succeeds.
    #[must_use]
    pub const fn message(&self) -> Option<&MimeMessage> {
        self.built.as_ref()
    }

    /// Builds the message against the session resolved by `sessions`.
    ///
    /// Parts are applied in order: From, To, Cc, Bcc, Reply-To, Subject,
    /// charset, headers, content, then the sent date.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::AlreadyBuilt`] on every call after the first
    /// successful one, and propagates session resolution failures. A failed
    /// build leaves the composer unbuilt.
    pub fn build_message(&mut self, sessions: &mut SessionConfigurator) -> Result<&MimeMessage> {
        if self.is_built() {
            return Err(EmailError::AlreadyBuilt);
        }

        let message = self.compose(sessions)?;
        Ok(self.commit(message))
    }

    /// Assembles a message from the current parts without marking the
    /// composer as built.
    pub(crate) fn compose(&self, sessions: &mut SessionConfigurator) -> Result<MimeMessage> {
        let mut message = MimeMessage::new(sessions.mail_session()?);

        if let Some(from) = &self.from {
            message.set_from(from.clone());
        }

        for (kind, list) in [
            (RecipientType::To, &self.to),
            (RecipientType::Cc, &self.cc),
            (RecipientType::Bcc, &self.bcc),
        ] {
            for address in list.iter() {
                message.add_recipient(kind, address.clone());
            }
        }

        if !self.reply_to.is_empty() {
            message.set_reply_to(self.reply_to.clone());
        }

        if let Some(subject) = &self.subject {
            message.set_subject(subject.clone(), self.charset.clone());
        }

        if let Some(charset) = &self.charset {
            message.set_charset(charset.clone());
        }

        for (name, value) in self.headers.iter() {
            message.set_header(name, value)?;
        }

        if let Some((content, content_type)) = &self.content {
            message.set_content(content.clone(), content_type.clone());
        }

        message.set_sent_date(self.sent_date.unwrap_or_else(Utc::now));

        Ok(message)
    }

    /// Stores `message` as the built message.
    pub(crate) fn commit(&mut self, message: MimeMessage) -> &MimeMessage {
        internal!(level = DEBUG, "Built message {}", message.message_id());
        self.built.insert(message)
    }
}

fn replace<S: AsRef<str>>(list: &mut AddressList, addresses: &[S]) -> Result<()> {
    if addresses.is_empty() {
        return Err(EmailError::MissingAddresses);
    }
    *list = AddressList::parse_all(addresses)?;
    Ok(())
}
