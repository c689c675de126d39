//! Property keys understood by the transport.
//!
//! These names only appear when a [`SessionConfig`](super::SessionConfig) is
//! flattened into [`Properties`](crate::session::Properties).

pub const HOST: &str = "mail.smtp.host";
pub const TRANSPORT_PROTOCOL: &str = "mail.transport.protocol";
pub const PORT: &str = "mail.smtp.port";
pub const SOCKET_FACTORY_PORT: &str = "mail.smtp.socketFactory.port";
pub const SOCKET_FACTORY_CLASS: &str = "mail.smtp.socketFactory.class";
pub const SOCKET_FACTORY_FALLBACK: &str = "mail.smtp.socketFactory.fallback";
pub const SSL_CHECK_SERVER_IDENTITY: &str = "mail.smtp.ssl.checkserveridentity";
pub const SMTP_FROM: &str = "mail.smtp.from";
pub const TIMEOUT: &str = "mail.smtp.timeout";
pub const CONNECTION_TIMEOUT: &str = "mail.smtp.connectiontimeout";
pub const AUTH: &str = "mail.smtp.auth";
pub const DEBUG: &str = "mail.debug";
pub const STARTTLS_ENABLE: &str = "mail.smtp.starttls.enable";
pub const STARTTLS_REQUIRED: &str = "mail.smtp.starttls.required";
pub const SEND_PARTIAL: &str = "mail.smtp.sendpartial";
pub const SMTPS_SEND_PARTIAL: &str = "mail.smtps.sendpartial";

/// Value of [`TRANSPORT_PROTOCOL`].
pub const SMTP: &str = "smtp";

/// Value of [`SOCKET_FACTORY_CLASS`] when connecting with implicit TLS.
pub const TLS_SOCKET_FACTORY: &str = "tls";
