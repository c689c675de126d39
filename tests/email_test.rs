use std::{sync::Arc, time::Duration};

use empath_compose::{
    config::keys, EmailError, ErrorKind, MessageComposer, Properties, Session,
    SessionConfigurator,
};
use pretty_assertions::assert_eq;

const TEST_EMAILS: [&str; 3] = [
    "ab@bc.com",
    "a.b@c.org",
    "abcdefghijklmnop@abcdefghijklmnop.com.bd",
];

#[test]
fn add_bcc_keeps_size_and_order() {
    let mut composer = MessageComposer::new();
    composer.add_bcc_list(Some(&TEST_EMAILS[..])).unwrap();

    let bcc: Vec<String> = composer
        .bcc_addresses()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(bcc, TEST_EMAILS);
}

#[test]
fn add_bcc_absent_list_fails() {
    let mut composer = MessageComposer::new();
    let err = composer.add_bcc_list(None::<&[&str]>).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(composer.bcc_addresses().is_empty());
}

#[test]
fn add_cc_single() {
    let mut composer = MessageComposer::new();
    composer.add_cc("abc@def.com").unwrap();

    assert_eq!(composer.cc_addresses().len(), 1);
    assert_eq!(composer.cc_addresses()[0].to_string(), "abc@def.com");
}

#[test]
fn add_header_rejects_empty_parts() {
    let mut composer = MessageComposer::new();

    let err = composer.add_header("", "Doe").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);

    let err = composer.add_header("John", "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);

    assert!(composer.headers().is_empty());
}

#[test]
fn add_reply_to_with_and_without_name() {
    let mut composer = MessageComposer::new();
    composer.add_reply_to("abc@def.org").unwrap();
    assert_eq!(composer.reply_to_addresses().len(), 1);

    let mut composer = MessageComposer::new();
    composer.add_reply_to_with_name("abc@def.org", "John").unwrap();
    assert_eq!(composer.reply_to_addresses().len(), 1);
    assert_eq!(
        composer.reply_to_addresses()[0].display_name(),
        Some("John")
    );
}

#[test]
fn host_name_is_required() {
    let mut sessions = SessionConfigurator::new();
    let err = sessions.mail_session().unwrap_err();
    assert!(matches!(err, EmailError::MissingHost));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(sessions.host_name(), None);

    sessions.set_host_name("localhost");
    assert_eq!(sessions.host_name(), Some("localhost"));
    assert!(sessions.mail_session().is_ok());
}

#[test]
fn injected_session_reports_its_host() {
    let properties: Properties = [(keys::HOST, "mail.example.com")].into_iter().collect();
    let injected = Arc::new(Session::new(properties, None));

    let mut sessions = SessionConfigurator::new();
    sessions.set_host_name("localhost");
    sessions.set_mail_session(Arc::clone(&injected));

    assert_eq!(sessions.host_name(), Some("mail.example.com"));
    assert!(Arc::ptr_eq(&sessions.mail_session().unwrap(), &injected));

    sessions.set_host_name("ignored.example.com");
    assert_eq!(sessions.host_name(), Some("mail.example.com"));
}

#[test]
fn build_message_only_once() {
    let mut sessions = SessionConfigurator::new();
    sessions.set_host_name("localhost");

    let mut composer = MessageComposer::new();
    composer.build_message(&mut sessions).unwrap();

    let err = composer.build_message(&mut sessions).unwrap_err();
    assert!(matches!(err, EmailError::AlreadyBuilt));
    assert_eq!(err.kind(), ErrorKind::State);
}

#[test]
fn build_message_carries_subject() {
    let mut sessions = SessionConfigurator::new();
    sessions.set_host_name("localhost");

    let mut composer = MessageComposer::new();
    composer.set_subject("Test").set_charset("ASCII").unwrap();

    let message = composer.build_message(&mut sessions).unwrap();
    assert_eq!(message.subject(), Some("Test"));
    assert_eq!(
        composer.message().and_then(|message| message.subject()),
        Some("Test")
    );
}

#[test]
fn full_property_set() {
    let mut sessions = SessionConfigurator::new();
    sessions
        .set_ssl_on_connect(true)
        .set_host_name("localhost")
        .set_authentication("test", "password")
        .set_socket_timeout(Duration::from_millis(10))
        .set_socket_connection_timeout(Duration::from_millis(10))
        .set_ssl_check_server_identity(true)
        .set_bounce_address("abc@def.com")
        .unwrap()
        .set_ssl_smtp_port(22)
        .unwrap()
        .set_debug(true)
        .set_start_tls_enabled(true)
        .set_start_tls_required(true)
        .set_send_partial(true);

    let session = sessions.mail_session().unwrap();

    let expected = [
        (keys::HOST, "localhost"),
        (keys::TRANSPORT_PROTOCOL, "smtp"),
        (keys::PORT, "22"),
        (keys::SOCKET_FACTORY_PORT, "22"),
        (keys::SOCKET_FACTORY_CLASS, "tls"),
        (keys::SOCKET_FACTORY_FALLBACK, "false"),
        (keys::SSL_CHECK_SERVER_IDENTITY, "true"),
        (keys::SMTP_FROM, "abc@def.com"),
        (keys::TIMEOUT, "10"),
        (keys::CONNECTION_TIMEOUT, "10"),
        (keys::AUTH, "true"),
        (keys::DEBUG, "true"),
        (keys::STARTTLS_ENABLE, "true"),
        (keys::STARTTLS_REQUIRED, "true"),
        (keys::SEND_PARTIAL, "true"),
        (keys::SMTPS_SEND_PARTIAL, "true"),
    ];

    for (key, value) in expected {
        assert_eq!(session.property(key), Some(value), "property {key}");
    }
    assert_eq!(session.properties().len(), expected.len());

    let authenticator = session.authenticator().unwrap();
    assert_eq!(authenticator.username(), "test");
    assert_eq!(authenticator.password(), "password");
}
