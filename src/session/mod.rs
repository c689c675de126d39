//! Mail sessions.
//!
//! A [`Session`] is the resolved, immutable form of a configuration: the
//! transport's string-keyed [`Properties`] plus an optional [`Authenticator`].
//! Sessions are shared through [`SessionHandle`] so a composer and a
//! configurator can both hold the same one.

mod configurator;

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

pub use configurator::SessionConfigurator;

use crate::config::{keys, Credentials};

/// Shared handle to a resolved session.
pub type SessionHandle = Arc<Session>;

/// String-keyed property set understood by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, if value { "true" } else { "false" });
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Interprets `key` as a boolean switch, absent meaning `false`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Supplies credentials to the transport when the server asks for them.
#[derive(Clone, PartialEq, Eq)]
pub struct Authenticator {
    credentials: Credentials,
}

impl Authenticator {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(username, password),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.credentials.password
    }
}

impl From<&Credentials> for Authenticator {
    fn from(value: &Credentials) -> Self {
        Self {
            credentials: value.clone(),
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("username", &self.credentials.username)
            .finish_non_exhaustive()
    }
}

/// A resolved mail session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    properties: Properties,
    authenticator: Option<Authenticator>,
}

impl Session {
    #[must_use]
    pub const fn new(properties: Properties, authenticator: Option<Authenticator>) -> Self {
        Self {
            properties,
            authenticator,
        }
    }

    /// Looks up a single transport property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    #[must_use]
    pub const fn authenticator(&self) -> Option<&Authenticator> {
        self.authenticator.as_ref()
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.property(keys::HOST)
    }

    /// The envelope sender configured for bounces, if any.
    #[must_use]
    pub fn bounce_address(&self) -> Option<&str> {
        self.property(keys::SMTP_FROM)
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.properties.flag(keys::DEBUG)
    }
}
