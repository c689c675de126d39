use std::{
    fmt::{self, Display},
    ops::{Deref, DerefMut},
};

use mailparse::{addrparse, MailAddr};
use serde::{Deserialize, Serialize};

use crate::error::{EmailError, Result};

const MAX_LOCAL_PART: usize = 64;
const MAX_DOMAIN: usize = 255;

/// Characters that force a display name to be quoted (RFC 5322 `specials`).
const SPECIALS: &[char] = &[
    '(', ')', '<', '>', '[', ']', ':', ';', '@', '\\', ',', '.', '"',
];

/// A validated email endpoint with an optional display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    address: String,
    display_name: Option<String>,
}

impl Address {
    /// Parses a single address such as `abc@def.com` or `John <abc@def.com>`.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::InvalidAddress`] if the input is empty, is not a
    /// single mailbox, or the mailbox is syntactically invalid.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_inner(raw, None)
    }

    /// Parses an address and attaches `name` as its display name.
    ///
    /// An empty `name` leaves whatever display name `raw` carried.
    ///
    /// # Errors
    ///
    /// See [`Address::parse`].
    pub fn with_name(raw: &str, name: &str) -> Result<Self> {
        Self::parse_inner(raw, Some(name))
    }

    fn parse_inner(raw: &str, name: Option<&str>) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmailError::invalid_address(raw, "empty address"));
        }

        let parsed =
            addrparse(trimmed).map_err(|err| EmailError::invalid_address(raw, err.to_string()))?;

        let info = match parsed.as_slice() {
            [MailAddr::Single(info)] => info,
            [MailAddr::Group(_)] => {
                return Err(EmailError::invalid_address(raw, "groups are not permitted"));
            }
            [] => return Err(EmailError::invalid_address(raw, "empty address")),
            _ => {
                return Err(EmailError::invalid_address(
                    raw,
                    "expected exactly one address",
                ));
            }
        };

        validate_mailbox(&info.addr).map_err(|reason| EmailError::invalid_address(raw, reason))?;

        let display_name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
            .or_else(|| info.display_name.clone());

        Ok(Self {
            address: info.addr.clone(),
            display_name,
        })
    }

    /// The bare `local@domain` mailbox.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The domain part of the mailbox.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map_or("", |(_, domain)| domain)
    }
}

fn validate_mailbox(mailbox: &str) -> std::result::Result<(), &'static str> {
    if mailbox.chars().any(char::is_whitespace) {
        return Err("whitespace in mailbox");
    }

    let (local, domain) = mailbox.rsplit_once('@').ok_or("missing '@' separator")?;

    if local.is_empty() {
        return Err("empty local-part");
    }
    if local.len() > MAX_LOCAL_PART {
        return Err("local-part exceeds 64 octets");
    }
    if domain.is_empty() {
        return Err("empty domain");
    }
    if domain.len() > MAX_DOMAIN {
        return Err("domain exceeds 255 octets");
    }

    // Address literals are accepted as-is
    if domain.starts_with('[') && domain.ends_with(']') {
        return Ok(());
    }

    if domain.split('.').any(|label| {
        label.is_empty()
            || label.starts_with('-')
            || label.ends_with('-')
            || !label.chars().all(|c| c.is_alphanumeric() || c == '-')
    }) {
        return Err("invalid domain");
    }

    Ok(())
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) if name.contains(SPECIALS) => {
                write!(f, "\"{}\" <{}>", name.replace('\\', "\\\\").replace('"', "\\\""), self.address)
            }
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => f.write_str(&self.address),
        }
    }
}

/// Ordered list of addresses. Duplicates are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressList(pub Vec<Address>);

impl AddressList {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Parses every entry, failing without side effects on the first bad one.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the first invalid address.
    pub fn parse_all<S: AsRef<str>>(addresses: &[S]) -> Result<Self> {
        addresses
            .iter()
            .map(|address| Address::parse(address.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

impl Display for AddressList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, addr) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            Display::fmt(addr, f)?;
        }
        Ok(())
    }
}

impl From<Vec<Address>> for AddressList {
    fn from(value: Vec<Address>) -> Self {
        Self(value)
    }
}

impl Deref for AddressList {
    type Target = Vec<Address>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for AddressList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_bare_address() {
        let addr = Address::parse("abc@def.com").unwrap();
        assert_eq!(addr.address(), "abc@def.com");
        assert_eq!(addr.display_name(), None);
        assert_eq!(addr.domain(), "def.com");
        assert_eq!(addr.to_string(), "abc@def.com");
    }

    #[test]
    fn test_parse_with_display_name() {
        let addr = Address::with_name("abc@def.org", "John").unwrap();
        assert_eq!(addr.display_name(), Some("John"));
        assert_eq!(addr.to_string(), "John <abc@def.org>");

        let addr = Address::parse("Jane Doe <jane@def.org>").unwrap();
        assert_eq!(addr.address(), "jane@def.org");
        assert_eq!(addr.display_name(), Some("Jane Doe"));
    }

    #[test]
    fn test_display_name_quoting() {
        let addr = Address::with_name("abc@def.org", "Doe, John").unwrap();
        assert_eq!(addr.to_string(), "\"Doe, John\" <abc@def.org>");
    }

    #[test]
    fn test_invalid_addresses() {
        for raw in [
            "",
            "   ",
            "abc",
            "@def.com",
            "abc@",
            "abc@def..com",
            "a@b.com, c@d.com",
        ] {
            let err = Address::parse(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_local_part_length() {
        let long = format!("{}@def.com", "a".repeat(65));
        assert!(Address::parse(&long).is_err());

        let ok = format!("{}@def.com", "a".repeat(64));
        assert!(Address::parse(&ok).is_ok());
    }

    #[test]
    fn test_parse_all_is_atomic() {
        let list = AddressList::parse_all(&["ab@bc.com", "a.b@c.org"]).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_string(), "ab@bc.com, a.b@c.org");

        assert!(AddressList::parse_all(&["ab@bc.com", "nope"]).is_err());
    }
}
