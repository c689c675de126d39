use std::{sync::Arc, time::Duration};

use super::{Authenticator, Session, SessionHandle};
use crate::{
    address::Address,
    config::{timeouts::as_millis, Credentials, SessionConfig},
    error::{EmailError, Result},
    internal,
};

/// Where the session handed out by [`SessionConfigurator::mail_session`]
/// comes from.
#[derive(Debug, Clone, Default)]
enum MailSession {
    /// Nothing resolved yet, setters still apply.
    #[default]
    Pending,
    /// Built from the accumulated configuration on first access.
    Built(SessionHandle),
    /// Supplied by the caller; authoritative from then on.
    Injected(SessionHandle),
}

/// Accumulates transport configuration and resolves it into a session.
///
/// Setters only take effect while the session is pending. Once a session
/// has been built or injected they are ignored, and the resolved session is
/// returned unchanged.
///
/// ```
/// use std::time::Duration;
/// use empath_compose::SessionConfigurator;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut configurator = SessionConfigurator::new();
/// configurator
///     .set_host_name("localhost")
///     .set_start_tls_enabled(true)
///     .set_socket_timeout(Duration::from_secs(10));
///
/// let session = configurator.mail_session()?;
/// assert_eq!(session.host(), Some("localhost"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionConfigurator {
    config: SessionConfig,
    session: MailSession,
}

impl SessionConfigurator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: SessionConfig) -> Self {
        Self {
            config,
            session: MailSession::Pending,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns `true` once a session has been built or injected.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self.session, MailSession::Pending)
    }

    fn configure(&mut self, setting: &str, apply: impl FnOnce(&mut SessionConfig)) -> &mut Self {
        if self.is_resolved() {
            internal!(
                level = DEBUG,
                "Ignoring {setting}: the mail session has already been resolved"
            );
        } else {
            apply(&mut self.config);
        }
        self
    }

    pub fn set_host_name(&mut self, host: impl Into<String>) -> &mut Self {
        let host = host.into();
        self.configure("host name", |config| config.host_name = Some(host))
    }

    /// Sets the port used for plain and STARTTLS connections.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::InvalidArgument`] for port `0`.
    pub fn set_smtp_port(&mut self, port: u16) -> Result<&mut Self> {
        let port = validate_port(port)?;
        Ok(self.configure("SMTP port", |config| config.smtp_port = port))
    }

    /// Sets the port used when connecting with implicit TLS.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::InvalidArgument`] for port `0`.
    pub fn set_ssl_smtp_port(&mut self, port: u16) -> Result<&mut Self> {
        let port = validate_port(port)?;
        Ok(self.configure("SSL SMTP port", |config| config.ssl_smtp_port = port))
    }

    pub fn set_ssl_on_connect(&mut self, enabled: bool) -> &mut Self {
        self.configure("SSL on connect", |config| config.ssl_on_connect = enabled)
    }

    pub fn set_ssl_check_server_identity(&mut self, enabled: bool) -> &mut Self {
        self.configure("server identity check", |config| {
            config.ssl_check_server_identity = enabled;
        })
    }

    pub fn set_start_tls_enabled(&mut self, enabled: bool) -> &mut Self {
        self.configure("STARTTLS", |config| config.start_tls_enabled = enabled)
    }

    pub fn set_start_tls_required(&mut self, required: bool) -> &mut Self {
        self.configure("STARTTLS requirement", |config| {
            config.start_tls_required = required;
        })
    }

    pub fn set_send_partial(&mut self, enabled: bool) -> &mut Self {
        self.configure("partial send", |config| config.send_partial = enabled)
    }

    pub fn set_debug(&mut self, enabled: bool) -> &mut Self {
        self.configure("debug", |config| config.debug = enabled)
    }

    /// Stores credentials; the built session carries an [`Authenticator`].
    pub fn set_authentication(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> &mut Self {
        let credentials = Credentials::new(username, password);
        self.configure("authentication", |config| {
            config.authentication = Some(credentials);
        })
    }

    pub fn set_socket_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.configure("socket timeout", |config| {
            config.timeouts.socket_ms = as_millis(timeout);
        })
    }

    pub fn set_socket_connection_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.configure("socket connection timeout", |config| {
            config.timeouts.connection_ms = as_millis(timeout);
        })
    }

    /// Sets the envelope sender used for bounces. An empty address clears it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address is malformed.
    pub fn set_bounce_address(&mut self, address: &str) -> Result<&mut Self> {
        let bounce = if address.trim().is_empty() {
            None
        } else {
            Some(Address::parse(address)?.address().to_string())
        };
        Ok(self.configure("bounce address", |config| config.bounce_address = bounce))
    }

    /// Supplies an externally built session.
    ///
    /// The injected session is returned verbatim by [`Self::mail_session`]
    /// and takes precedence over any configuration, past or future.
    pub fn set_mail_session(&mut self, session: SessionHandle) -> &mut Self {
        internal!(level = DEBUG, "Using injected mail session");
        self.session = MailSession::Injected(session);
        self
    }

    /// Returns the session, building it from the configuration on first use.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::MissingHost`] if no session was injected and no
    /// host name has been configured.
    pub fn mail_session(&mut self) -> Result<SessionHandle> {
        if let MailSession::Built(session) | MailSession::Injected(session) = &self.session {
            return Ok(Arc::clone(session));
        }

        let host = self
            .config
            .host_name
            .as_deref()
            .filter(|host| !host.trim().is_empty())
            .ok_or(EmailError::MissingHost)?;

        let properties = self.config.to_properties();
        if self.config.debug {
            internal!(level = DEBUG, "Mail session properties: {properties:?}");
        }

        internal!(level = DEBUG, "Building mail session for {host}");

        let authenticator = self.config.authentication.as_ref().map(Authenticator::from);
        let session = Arc::new(Session::new(properties, authenticator));
        self.session = MailSession::Built(Arc::clone(&session));

        Ok(session)
    }

    /// The host sessions will connect to.
    ///
    /// A resolved session is authoritative; otherwise the configured host is
    /// returned. `None` when neither is available.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        match &self.session {
            MailSession::Built(session) | MailSession::Injected(session) => session.host(),
            MailSession::Pending => self
                .config
                .host_name
                .as_deref()
                .filter(|host| !host.is_empty()),
        }
    }

    #[must_use]
    pub const fn smtp_port(&self) -> u16 {
        self.config.smtp_port
    }

    #[must_use]
    pub const fn ssl_smtp_port(&self) -> u16 {
        self.config.ssl_smtp_port
    }

    #[must_use]
    pub const fn is_ssl_on_connect(&self) -> bool {
        self.config.ssl_on_connect
    }

    #[must_use]
    pub const fn is_ssl_check_server_identity(&self) -> bool {
        self.config.ssl_check_server_identity
    }

    #[must_use]
    pub const fn is_start_tls_enabled(&self) -> bool {
        self.config.start_tls_enabled
    }

    #[must_use]
    pub const fn is_start_tls_required(&self) -> bool {
        self.config.start_tls_required
    }

    #[must_use]
    pub const fn is_send_partial(&self) -> bool {
        self.config.send_partial
    }

    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.config.debug
    }

    #[must_use]
    pub fn bounce_address(&self) -> Option<&str> {
        self.config.bounce_address.as_deref()
    }

    #[must_use]
    pub const fn socket_timeout(&self) -> Duration {
        self.config.timeouts.socket()
    }

    #[must_use]
    pub const fn socket_connection_timeout(&self) -> Duration {
        self.config.timeouts.connection()
    }
}

fn validate_port(port: u16) -> Result<u16> {
    if port == 0 {
        return Err(EmailError::InvalidArgument(
            "Cannot connect to a port number that is less than 1".into(),
        ));
    }
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::keys,
        error::ErrorKind,
        session::Properties,
    };

    fn injected(host: &str) -> SessionHandle {
        let properties: Properties = [(keys::HOST, host)].into_iter().collect();
        Arc::new(Session::new(properties, None))
    }

    #[test]
    fn test_no_host_fails() {
        let mut configurator = SessionConfigurator::new();
        assert_eq!(configurator.host_name(), None);

        let err = configurator.mail_session().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!configurator.is_resolved());
    }

    #[test]
    fn test_blank_host_fails() {
        let mut configurator = SessionConfigurator::new();
        configurator.set_host_name("  ");
        assert!(matches!(
            configurator.mail_session(),
            Err(EmailError::MissingHost)
        ));
    }

    #[test]
    fn test_host_name() {
        let mut configurator = SessionConfigurator::new();
        configurator.set_host_name("localhost");
        assert_eq!(configurator.host_name(), Some("localhost"));
    }

    #[test]
    fn test_built_session_is_cached() {
        let mut configurator = SessionConfigurator::new();
        configurator.set_host_name("localhost");

        let first = configurator.mail_session().unwrap();
        let second = configurator.mail_session().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(configurator.is_resolved());
    }

    #[test]
    fn test_injected_session_short_circuits() {
        let session = injected("mail.example.com");

        let mut configurator = SessionConfigurator::new();
        configurator.set_mail_session(Arc::clone(&session));

        assert_eq!(configurator.host_name(), Some("mail.example.com"));
        assert!(Arc::ptr_eq(&configurator.mail_session().unwrap(), &session));
    }

    #[test]
    fn test_setters_ignored_after_injection() {
        let session = injected("mail.example.com");

        let mut configurator = SessionConfigurator::new();
        configurator.set_mail_session(Arc::clone(&session));
        configurator.set_host_name("other.example.com").set_debug(true);

        assert_eq!(configurator.host_name(), Some("mail.example.com"));
        assert!(!configurator.is_debug());
        assert!(Arc::ptr_eq(&configurator.mail_session().unwrap(), &session));
    }

    #[test]
    fn test_setters_ignored_after_build() {
        let mut configurator = SessionConfigurator::new();
        configurator.set_host_name("localhost");
        let session = configurator.mail_session().unwrap();

        configurator.set_host_name("elsewhere");
        assert_eq!(configurator.host_name(), Some("localhost"));
        assert!(Arc::ptr_eq(&configurator.mail_session().unwrap(), &session));
    }

    #[test]
    fn test_authentication_produces_authenticator() {
        let mut configurator = SessionConfigurator::new();
        configurator
            .set_host_name("localhost")
            .set_authentication("test", "password");

        let session = configurator.mail_session().unwrap();
        let auth = session.authenticator().unwrap();
        assert_eq!(auth.username(), "test");
        assert_eq!(auth.password(), "password");
        assert_eq!(session.property(keys::AUTH), Some("true"));
    }

    #[test]
    fn test_timeouts() {
        let mut configurator = SessionConfigurator::new();
        assert_eq!(configurator.socket_connection_timeout(), Duration::from_secs(60));

        configurator.set_socket_connection_timeout(Duration::from_millis(10));
        configurator.set_socket_timeout(Duration::from_millis(20));
        assert_eq!(configurator.socket_connection_timeout(), Duration::from_millis(10));
        assert_eq!(configurator.socket_timeout(), Duration::from_millis(20));
    }

    #[test]
    fn test_port_validation() {
        let mut configurator = SessionConfigurator::new();
        assert_eq!(
            configurator.set_smtp_port(0).unwrap_err().kind(),
            ErrorKind::Argument
        );
        assert!(configurator.set_ssl_smtp_port(0).is_err());

        configurator.set_smtp_port(2525).unwrap();
        assert_eq!(configurator.smtp_port(), 2525);
    }

    #[test]
    fn test_bounce_address() {
        let mut configurator = SessionConfigurator::new();
        configurator.set_bounce_address("abc@def.com").unwrap();
        assert_eq!(configurator.bounce_address(), Some("abc@def.com"));

        assert_eq!(
            configurator.set_bounce_address("not an address").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(configurator.bounce_address(), Some("abc@def.com"));

        configurator.set_bounce_address("").unwrap();
        assert_eq!(configurator.bounce_address(), None);
    }
}
