//! Email composition and mail-session configuration.
//!
//! A [`MessageComposer`] accumulates the parts of a message and a
//! [`SessionConfigurator`] accumulates transport settings. Building the
//! message resolves the session and produces a [`MimeMessage`], which a
//! [`Transport`] can then deliver.
//!
//! ```
//! use empath_compose::{MessageComposer, SessionConfigurator};
//!
//! # fn main() -> empath_compose::Result<()> {
//! let mut sessions = SessionConfigurator::new();
//! sessions.set_host_name("localhost").set_debug(true);
//!
//! let mut composer = MessageComposer::new();
//! composer
//!     .set_from("abc@def.com")?
//!     .add_to("ab@bc.com")?
//!     .set_subject("Hello");
//!
//! let message = composer.build_message(&mut sessions)?;
//! assert_eq!(message.session().host(), Some("localhost"));
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod charset;
pub mod composer;
pub mod config;
pub mod email;
pub mod error;
pub mod header;
pub mod logging;
pub mod message;
pub mod session;
pub mod transport;

pub use tracing;

pub use address::{Address, AddressList};
pub use charset::Charset;
pub use composer::MessageComposer;
pub use config::{Credentials, SessionConfig, Timeouts};
pub use email::Email;
pub use error::{EmailError, ErrorKind, Result};
pub use header::HeaderMap;
pub use message::{Content, MimeMessage, RecipientType};
pub use session::{Authenticator, Properties, Session, SessionConfigurator, SessionHandle};
pub use transport::{Envelope, MemoryTransport, SentMessage, Transport};
