//! Per-request options.

use std::fmt;
use std::sync::Arc;

use crate::config::Configuration;
use crate::transport::{Method, TransportFailure};

/// Hook producing a caller-specific summary for a transport failure.
pub type CustomErrorMessage =
    Arc<dyn Fn(&TransportFailure, &Configuration) -> Option<String> + Send + Sync>;

/// Options for one request.
///
/// A configuration handle is always required; everything else defaults to a
/// plain GET with no extra headers.
#[derive(Clone)]
pub struct RequestOptions {
    pub configuration: Arc<Configuration>,
    pub headers: Vec<(String, String)>,
    /// Serialize text bodies as JSON too
    pub json_request: bool,
    /// Expect (and ask for) a JSON response
    pub json_response: bool,
    pub method: Method,
    pub custom_error_message: Option<CustomErrorMessage>,
}

impl RequestOptions {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self {
            configuration,
            headers: Vec::new(),
            json_request: false,
            json_response: false,
            method: Method::Get,
            custom_error_message: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json_request(mut self, enabled: bool) -> Self {
        self.json_request = enabled;
        self
    }

    pub fn json_response(mut self, enabled: bool) -> Self {
        self.json_response = enabled;
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn custom_error_message(
        mut self,
        hook: impl Fn(&TransportFailure, &Configuration) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.custom_error_message = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("headers", &self.headers)
            .field("json_request", &self.json_request)
            .field("json_response", &self.json_response)
            .field("method", &self.method)
            .field("custom_error_message", &self.custom_error_message.is_some())
            .finish_non_exhaustive()
    }
}
