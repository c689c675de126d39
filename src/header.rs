//! Custom message headers.

use serde::{Deserialize, Serialize};

use crate::error::{EmailError, Result};

/// Header name to value mapping.
///
/// Iteration follows insertion order. Writing an existing name (compared
/// case-insensitively) replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Validates and inserts a header, returning the value it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::InvalidArgument`] if either part is empty, the
    /// name is not printable ASCII without `:`, or the value contains a line
    /// break.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<Option<String>> {
        validate(name, value)?;

        if let Some((_, existing)) = self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            return Ok(Some(std::mem::replace(existing, value.to_string())));
        }

        self.entries.push((name.to_string(), value.to_string()));
        Ok(None)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N, V> TryFrom<Vec<(N, V)>> for HeaderMap
where
    N: AsRef<str>,
    V: AsRef<str>,
{
    type Error = EmailError;

    fn try_from(value: Vec<(N, V)>) -> Result<Self> {
        let mut headers = Self::new();
        for (name, value) in &value {
            headers.insert(name.as_ref(), value.as_ref())?;
        }
        Ok(headers)
    }
}

fn validate(name: &str, value: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EmailError::InvalidArgument("name can not be null or empty".into()));
    }

    if value.is_empty() {
        return Err(EmailError::InvalidArgument("value can not be null or empty".into()));
    }

    if !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
        return Err(EmailError::InvalidArgument(format!(
            "header name '{name}' must be printable ASCII without ':'"
        )));
    }

    if value.contains(['\r', '\n']) {
        return Err(EmailError::InvalidArgument(format!(
            "value of header '{name}' must not contain line breaks"
        )));
    }

    Ok(())
}
