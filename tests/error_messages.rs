//! Tests to ensure error messages are actionable and consistent
//!
//! These tests verify that error messages name the setting or input that caused
//! them, and that structured context survives wrapping across layers.
//!
//! Note: These integration tests focus on the public API. Field rendering and
//! stack handling are tested at the unit level.

use std::sync::Arc;

use serde_json::json;

use netgate::error_handling::{ErrorSource, FieldValue, PlainRenderer, TerminalRenderer};
use netgate::{ConfigError, Configuration, ErrorBuilder, HttpError, StructuredError};

#[test]
fn test_config_errors_are_descriptive() {
    let err = Configuration::from_json_str(r#"{ "networkConcurrency": 0 }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(
        err.to_string().contains("networkConcurrency"),
        "Error should name the setting: {}",
        err
    );

    let err = Configuration::from_json_str(r#"{ "httpTimout": 100 }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(
        err.to_string().contains("httpTimout"),
        "Error should name the unknown key: {}",
        err
    );

    let err = Configuration::from_json_str(r#"{ "unsafeHttpWhitelist": ["[abc"] }"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidGlob(_)));

    let err = Configuration::from_file(std::path::Path::new("/nonexistent/netgate.json")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/netgate.json"));
}

#[test]
fn test_policy_errors_are_actionable() {
    let err = HttpError::UnsafeProtocol {
        host: "registry.example.com".to_string(),
        target: "http://registry.example.com/pkg".to_string(),
    };
    assert!(err.to_string().contains("unsafeHttpWhitelist"));
    assert!(err.to_string().contains("registry.example.com"));

    let err = HttpError::NetworkDisabled {
        target: "https://api.example.com/x".to_string(),
    };
    assert!(err.to_string().contains("disabled"));
    assert!(err.to_string().contains("https://api.example.com/x"));
    assert!(err.as_structured().is_none());
}

#[test]
fn test_wrapped_error_round_trip() {
    let err = StructuredError::wrap("boom", ErrorBuilder::new().field("X", "1"));
    assert_eq!(err.message(), "boom\n    X: 1");
    assert_eq!(err.to_string(), "boom\n    X: 1");
    assert_eq!(err.name(), "Error");
}

#[test]
fn test_context_accumulates_across_layers() {
    let inner = StructuredError::wrap(
        "Failed to fetch manifest",
        ErrorBuilder::new().field("Package", "pkg"),
    );
    let outer = StructuredError::wrap(
        inner,
        ErrorBuilder::new()
            .name("InstallError")
            .derive_summary(|summary| format!("Install failed: {}", summary))
            .field("Version", FieldValue::code("1.0.0")),
    );

    assert_eq!(outer.name(), "InstallError");
    assert_eq!(
        outer.message(),
        "Install failed: Failed to fetch manifest\n    Package: pkg\n    Version: 1.0.0"
    );
}

#[test]
fn test_foreign_errors_keep_their_source() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
    let err = StructuredError::wrap(
        ErrorSource::error(io),
        ErrorBuilder::new().field("Path", "/etc/netgate/ca.pem"),
    );

    assert_eq!(err.summary(), "permission denied");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_structured_errors_are_recognised_when_boxed_generically() {
    let inner = StructuredError::wrap("boom", ErrorBuilder::new().field("X", "1"));
    let err = StructuredError::wrap(ErrorSource::error(inner), ErrorBuilder::new());

    // Fields carried over rather than flattened into the summary
    assert_eq!(err.summary(), "boom");
    assert_eq!(err.fields().len(), 1);
}

#[test]
fn test_non_error_values_are_described() {
    let err = StructuredError::wrap(json!({"code": 42}), ErrorBuilder::new());
    assert_eq!(err.summary(), r#"Non-error value: {"code":42} (object)"#);

    let err = StructuredError::wrap(json!(null), ErrorBuilder::new().field("Step", "link"));
    assert_eq!(err.message(), "Non-error value: null (null)\n    Step: link");
}

#[test]
fn test_set_message_replaces_everything() {
    let mut err = StructuredError::wrap("boom", ErrorBuilder::new().field("X", "1"));
    let rewritten = format!("{} (while linking)", err.message());
    err.set_message(rewritten);

    assert_eq!(err.message(), "boom (while linking)");
    assert!(err.fields().is_empty());
}

#[test]
fn test_renderer_controls_presentation() {
    let plain = StructuredError::wrap(
        "Request failed",
        ErrorBuilder::new()
            .field("Response Code", FieldValue::hyperlink("404 (Not Found)", "https://example.com/404"))
            .render_context(Arc::new(PlainRenderer)),
    );
    assert_eq!(plain.message(), "Request failed\n    Response Code: 404 (Not Found)");

    let linked = StructuredError::wrap(
        plain,
        ErrorBuilder::new().render_context(Arc::new(TerminalRenderer::new(false, true))),
    );
    assert!(linked
        .message()
        .contains("\x1b]8;;https://example.com/404\x1b\\404 (Not Found)\x1b]8;;\x1b\\"));
}

#[test]
fn test_stack_can_be_suppressed() {
    let err = StructuredError::wrap(
        "quiet",
        ErrorBuilder::new().name("HttpError").include_stack(false),
    );
    assert!(!err.include_stack());
    assert!(err.stack().is_none());
    assert_eq!(format!("{:#}", err), "quiet");

    // Later layers inherit the suppression unless they opt back in
    let wrapped = StructuredError::wrap(err.clone(), ErrorBuilder::new().field("Step", "fetch"));
    assert!(wrapped.stack().is_none());

    let loud = StructuredError::wrap(err, ErrorBuilder::new().include_stack(true));
    assert!(loud.include_stack());
    assert!(loud.stack().is_some());
}
