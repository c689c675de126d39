//! Typed mail-session configuration.
//!
//! [`SessionConfig`] is what callers (or a TOML file) describe. It is only
//! translated into the transport's string-keyed [`Properties`] when a
//! session is resolved, see [`SessionConfig::to_properties`].
//!
//! ```toml
//! host_name = "mail.example.com"
//! ssl_on_connect = true
//! ssl_smtp_port = 465
//! bounce_address = "bounces@example.com"
//!
//! [authentication]
//! username = "mailer"
//! password = "hunter2"
//!
//! [timeouts]
//! socket_ms = 10000
//! connection_ms = 5000
//! ```

pub mod keys;
pub mod timeouts;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use timeouts::Timeouts;

use crate::{error::Result, session::Properties};

/// Username and password used to authenticate with the server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything needed to build a mail session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Host of the outgoing mail server. Required to build a session.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub host_name: Option<String>,

    /// Port used for plain and STARTTLS connections.
    ///
    /// Default: 25
    #[serde(default = "defaults::smtp_port")]
    pub smtp_port: u16,

    /// Port used when [`Self::ssl_on_connect`] is set.
    ///
    /// Default: 465
    #[serde(default = "defaults::ssl_smtp_port")]
    pub ssl_smtp_port: u16,

    /// Connect with implicit TLS.
    #[serde(default)]
    pub ssl_on_connect: bool,

    /// Verify the server certificate matches the host name.
    #[serde(default)]
    pub ssl_check_server_identity: bool,

    #[serde(default)]
    pub start_tls_enabled: bool,

    /// Fail instead of continuing in plaintext when STARTTLS is unavailable.
    #[serde(default)]
    pub start_tls_required: bool,

    /// Deliver to the valid recipients even if some are rejected.
    #[serde(default)]
    pub send_partial: bool,

    #[serde(default)]
    pub debug: bool,

    /// Envelope sender receiving bounces, if different from `From`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bounce_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub authentication: Option<Credentials>,

    #[serde(default)]
    pub timeouts: Timeouts,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host_name: None,
            smtp_port: defaults::smtp_port(),
            ssl_smtp_port: defaults::ssl_smtp_port(),
            ssl_on_connect: false,
            ssl_check_server_identity: false,
            start_tls_enabled: false,
            start_tls_required: false,
            send_partial: false,
            debug: false,
            bounce_address: None,
            authentication: None,
            timeouts: Timeouts::default(),
        }
    }
}

impl SessionConfig {
    /// Parses a configuration from TOML, filling in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::Config`](crate::EmailError::Config) if the
    /// document is malformed or a value has the wrong type.
    pub fn from_toml(document: &str) -> Result<Self> {
        Ok(toml::from_str(document)?)
    }

    /// The port a connection will actually be made on.
    #[must_use]
    pub const fn effective_port(&self) -> u16 {
        if self.ssl_on_connect {
            self.ssl_smtp_port
        } else {
            self.smtp_port
        }
    }

    /// Flattens the configuration into the transport's property set.
    ///
    /// Boolean switches are always present. Optional values (host, bounce
    /// address, credentials, non-zero timeouts) only when set.
    #[must_use]
    pub fn to_properties(&self) -> Properties {
        let mut properties = Properties::new();

        properties.set(keys::TRANSPORT_PROTOCOL, keys::SMTP);
        properties.set(keys::PORT, self.effective_port().to_string());

        if let Some(host) = &self.host_name {
            properties.set(keys::HOST, host);
        }

        properties.set_flag(keys::DEBUG, self.debug);
        properties.set_flag(keys::STARTTLS_ENABLE, self.start_tls_enabled);
        properties.set_flag(keys::STARTTLS_REQUIRED, self.start_tls_required);
        properties.set_flag(keys::SEND_PARTIAL, self.send_partial);
        properties.set_flag(keys::SMTPS_SEND_PARTIAL, self.send_partial);

        if self.authentication.is_some() {
            properties.set_flag(keys::AUTH, true);
        }

        if self.ssl_on_connect {
            properties.set(keys::SOCKET_FACTORY_PORT, self.ssl_smtp_port.to_string());
            properties.set(keys::SOCKET_FACTORY_CLASS, keys::TLS_SOCKET_FACTORY);
            properties.set_flag(keys::SOCKET_FACTORY_FALLBACK, false);
        }

        if (self.ssl_on_connect || self.start_tls_enabled) && self.ssl_check_server_identity {
            properties.set_flag(keys::SSL_CHECK_SERVER_IDENTITY, true);
        }

        if let Some(bounce) = &self.bounce_address {
            properties.set(keys::SMTP_FROM, bounce);
        }

        if self.timeouts.socket_ms > 0 {
            properties.set(keys::TIMEOUT, self.timeouts.socket_ms.to_string());
        }

        if self.timeouts.connection_ms > 0 {
            properties.set(
                keys::CONNECTION_TIMEOUT,
                self.timeouts.connection_ms.to_string(),
            );
        }

        properties
    }
}

mod defaults {
    pub const fn smtp_port() -> u16 {
        25
    }
    pub const fn ssl_smtp_port() -> u16 {
        465
    }
}
