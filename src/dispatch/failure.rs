//! Conversion of transport failures into structured errors.

use serde_json::Value;

use super::options::RequestOptions;
use crate::config::{Configuration, HTTP_RETRY_SETTING, HTTP_TIMEOUT_SETTING, STATUS_DOCS_BASE_URL};
use crate::error_handling::{ErrorBuilder, ErrorSource, FieldValue, HttpError, StructuredError};
use crate::transport::{FailureKind, TransportFailure};

/// Name carried by errors built from transport failures.
pub const TRANSPORT_ERROR_NAME: &str = "HttpError";

/// Summary used when the server answered with an error status.
pub const STATUS_FAILURE_SUMMARY: &str = "The remote server failed to provide the requested resource";

pub const FIELD_REQUEST_METHOD: &str = "Request Method";
pub const FIELD_REQUEST_URL: &str = "Request URL";
pub const FIELD_REQUEST_REDIRECTS: &str = "Request Redirects";
pub const FIELD_RETRY_COUNT: &str = "Request Retry Count";
pub const FIELD_RESPONSE_CODE: &str = "Response Code";

/// Wraps `failure` into an `HttpError::Transport` carrying its context.
///
/// Fields are attached in a fixed order, each only when the data exists:
/// request method and URL, followed redirects, the retry count when retries
/// were exhausted, and the response status.
pub fn network_error(
    failure: &TransportFailure,
    options: &RequestOptions,
    configuration: &Configuration,
) -> HttpError {
    let renderer = configuration.renderer();

    let mut summary = summarize(failure, options, configuration);
    if failure.is_socket_timeout() {
        summary.push_str(&format!(
            " (can be increased via {})",
            renderer.value(&FieldValue::setting(HTTP_TIMEOUT_SETTING))
        ));
    }

    let mut builder = ErrorBuilder::new()
        .name(TRANSPORT_ERROR_NAME)
        .summary(summary)
        .include_stack(false)
        .render_context(renderer.clone());

    if let Some(request) = &failure.request {
        builder = builder
            .field(FIELD_REQUEST_METHOD, FieldValue::code(request.method.to_string()))
            .field(FIELD_REQUEST_URL, FieldValue::url(request.url.clone()));

        if !failure.redirect_urls.is_empty() {
            builder = builder.field(
                FIELD_REQUEST_REDIRECTS,
                FieldValue::url_list(failure.redirect_urls.iter().cloned()),
            );
        }

        if failure.retry_count == configuration.http_retry {
            builder = builder.field(
                FIELD_RETRY_COUNT,
                FieldValue::text(format!(
                    "{} (can be increased via {})",
                    failure.retry_count,
                    renderer.value(&FieldValue::setting(HTTP_RETRY_SETTING))
                )),
            );
        }
    }

    if let Some(response) = &failure.response {
        let text = match response.reason() {
            Some(reason) => format!("{} ({})", response.status, reason),
            None => response.status.to_string(),
        };
        builder = builder.field(
            FIELD_RESPONSE_CODE,
            FieldValue::hyperlink(text, format!("{}{}", STATUS_DOCS_BASE_URL, response.status)),
        );
    }

    HttpError::Transport(StructuredError::wrap(
        ErrorSource::error(failure.clone()),
        builder,
    ))
}

fn summarize(
    failure: &TransportFailure,
    options: &RequestOptions,
    configuration: &Configuration,
) -> String {
    if let Some(hook) = &options.custom_error_message {
        if let Some(message) = hook(failure, configuration) {
            return message;
        }
    }

    if let Some(response) = &failure.response {
        if let Some(message) = server_error_message(&response.body) {
            return message;
        }
    }

    if failure.kind == FailureKind::Status {
        return STATUS_FAILURE_SUMMARY.to_string();
    }

    failure.message.clone()
}

/// Extracts `{"error": "..."}` from a JSON error body.
fn server_error_message(body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<Value>(body).ok()? {
        Value::Object(map) => match map.get("error") {
            Some(Value::String(message)) if !message.is_empty() => Some(message.clone()),
            _ => None,
        },
        _ => None,
    }
}
