//! Wire-ready messages.
//!
//! A [`MimeMessage`] is bound to the [`Session`](crate::session::Session) it
//! was created for and holds everything the transport needs: envelope
//! recipients, headers and content. [`MimeMessage::formatted`] renders it
//! as RFC 5322 bytes.

use std::{
    io::Write,
    sync::atomic::{AtomicU64, Ordering},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};

use crate::{
    address::{Address, AddressList},
    charset::Charset,
    error::Result,
    header::HeaderMap,
    session::SessionHandle,
};

/// Maximum length of a base64 encoded body line.
const BASE64_LINE: usize = 76;

/// Maximum line length (excluding CRLF) permitted by RFC 5322.
const MAX_LINE: usize = 998;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Which recipient list an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipientType {
    To,
    Cc,
    /// Receives the message but never appears in its headers.
    Bcc,
}

/// Body of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl From<&[u8]> for Content {
    fn from(value: &[u8]) -> Self {
        Self::Binary(value.to_vec())
    }
}

/// A message bound to a session, ready to be handed to a transport.
#[derive(Debug, Clone)]
pub struct MimeMessage {
    session: SessionHandle,
    message_id: String,
    from: Option<Address>,
    to: AddressList,
    cc: AddressList,
    bcc: AddressList,
    reply_to: AddressList,
    subject: Option<String>,
    charset: Option<Charset>,
    headers: HeaderMap,
    content: Option<(Content, String)>,
    sent_date: Option<DateTime<Utc>>,
}

impl MimeMessage {
    /// Creates an empty message for `session`, assigning it a Message-ID.
    #[must_use]
    pub fn new(session: SessionHandle) -> Self {
        let message_id = generate_message_id(session.host().unwrap_or("localhost"));

        Self {
            session,
            message_id,
            from: None,
            to: AddressList::new(),
            cc: AddressList::new(),
            bcc: AddressList::new(),
            reply_to: AddressList::new(),
            subject: None,
            charset: None,
            headers: HeaderMap::new(),
            content: None,
            sent_date: None,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn set_from(&mut self, from: Address) {
        self.from = Some(from);
    }

    #[must_use]
    pub const fn from(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    pub fn add_recipient(&mut self, kind: RecipientType, address: Address) {
        match kind {
            RecipientType::To => self.to.push(address),
            RecipientType::Cc => self.cc.push(address),
            RecipientType::Bcc => self.bcc.push(address),
        }
    }

    #[must_use]
    pub fn recipients(&self, kind: RecipientType) -> &[Address] {
        match kind {
            RecipientType::To => &self.to,
            RecipientType::Cc => &self.cc,
            RecipientType::Bcc => &self.bcc,
        }
    }

    /// Every envelope recipient, To then Cc then Bcc.
    pub fn all_recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }

    pub fn set_reply_to(&mut self, reply_to: AddressList) {
        self.reply_to = reply_to;
    }

    #[must_use]
    pub fn reply_to(&self) -> &[Address] {
        &self.reply_to
    }

    /// Sets the subject, encoded with `charset` when it is not plain ASCII.
    pub fn set_subject(&mut self, subject: impl Into<String>, charset: Option<Charset>) {
        self.subject = Some(subject.into());
        if charset.is_some() {
            self.charset = charset;
        }
    }

    /// The subject as set, before any header encoding.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn set_charset(&mut self, charset: Charset) {
        self.charset = Some(charset);
    }

    #[must_use]
    pub const fn charset(&self) -> Option<&Charset> {
        self.charset.as_ref()
    }

    /// Sets a custom header, replacing any existing value.
    ///
    /// # Errors
    ///
    /// See [`HeaderMap::insert`].
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.headers.insert(name, value).map(|_| ())
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn set_content(&mut self, content: impl Into<Content>, content_type: impl Into<String>) {
        self.content = Some((content.into(), content_type.into()));
    }

    #[must_use]
    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref().map(|(content, _)| content)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content.as_ref().map(|(_, content_type)| content_type.as_str())
    }

    pub fn set_sent_date(&mut self, date: DateTime<Utc>) {
        self.sent_date = Some(date);
    }

    #[must_use]
    pub const fn sent_date(&self) -> Option<&DateTime<Utc>> {
        self.sent_date.as_ref()
    }

    /// Renders the message as RFC 5322 bytes.
    ///
    /// Bcc recipients are left out of the headers. Non-ASCII header text is
    /// written as encoded words, and bodies that are not 7-bit clean are
    /// base64 encoded.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::Render`](crate::EmailError::Render) if writing
    /// fails.
    pub fn formatted(&self) -> Result<Vec<u8>> {
        let charset = self.charset.clone().unwrap_or_default();
        let mut message = Vec::with_capacity(1024);

        let date = self.sent_date.unwrap_or_else(Utc::now);
        write!(&mut message, "Date: {}\r\n", date.to_rfc2822())?;

        if let Some(from) = &self.from {
            write!(&mut message, "From: {}\r\n", mailbox(from, &charset))?;
        }

        for (name, list) in [("Reply-To", &self.reply_to), ("To", &self.to), ("Cc", &self.cc)] {
            if !list.is_empty() {
                write!(&mut message, "{name}: {}\r\n", mailbox_list(list, &charset))?;
            }
        }

        if let Some(subject) = &self.subject {
            write!(&mut message, "Subject: {}\r\n", charset.encode_word(subject))?;
        }

        write!(&mut message, "Message-ID: {}\r\n", self.message_id)?;

        for (name, value) in self.headers.iter() {
            write!(&mut message, "{name}: {}\r\n", charset.encode_word(value))?;
        }

        write!(&mut message, "MIME-Version: 1.0\r\n")?;

        let (body, content_type) = match &self.content {
            Some((Content::Text(text), content_type)) => {
                let (bytes, label) = charset.encode(text);
                (bytes.into_owned(), format!("{content_type}; charset={label}"))
            }
            Some((Content::Binary(bytes), content_type)) => (bytes.clone(), content_type.clone()),
            None => (Vec::new(), format!("text/plain; charset={charset}")),
        };

        write!(&mut message, "Content-Type: {content_type}\r\n")?;

        if is_seven_bit(&body) {
            write!(&mut message, "Content-Transfer-Encoding: 7bit\r\n\r\n")?;
            message.extend_from_slice(&body);
        } else {
            write!(&mut message, "Content-Transfer-Encoding: base64\r\n\r\n")?;
            let encoded = STANDARD.encode(&body);
            for line in encoded.as_bytes().chunks(BASE64_LINE) {
                message.extend_from_slice(line);
                message.extend_from_slice(b"\r\n");
            }
        }

        Ok(message)
    }
}

fn mailbox(address: &Address, charset: &Charset) -> String {
    match address.display_name() {
        Some(name) if !name.is_ascii() => {
            format!("{} <{}>", charset.encode_word(name), address.address())
        }
        _ => address.to_string(),
    }
}

fn mailbox_list(list: &AddressList, charset: &Charset) -> String {
    list.iter()
        .map(|address| mailbox(address, charset))
        .collect::<Vec<_>>()
        .join(", ")
}

/// 7-bit clean, CRLF line endings only, and lines short enough for SMTP.
fn is_seven_bit(body: &[u8]) -> bool {
    if !body.is_ascii() {
        return false;
    }

    let mut previous = 0u8;
    let mut line_length = 0usize;

    for &byte in body {
        match byte {
            b'\n' if previous != b'\r' => return false,
            b'\n' => line_length = 0,
            _ if previous == b'\r' => return false,
            b'\r' => {}
            _ => {
                line_length += 1;
                if line_length > MAX_LINE {
                    return false;
                }
            }
        }
        previous = byte;
    }

    previous != b'\r'
}

fn generate_message_id(domain: &str) -> String {
    let now = Utc::now();
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(
        "<{}.{sequence}.{}@{domain}>",
        now.timestamp_nanos_opt().unwrap_or_default(),
        std::process::id()
    )
}
