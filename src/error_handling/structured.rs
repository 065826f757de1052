//! Structured, composable errors.
//!
//! A `StructuredError` carries a name, a one-line summary and an ordered list
//! of labeled context fields. Its message is always the summary followed by one
//! indented `label: value` line per field:
//!
//! ```text
//! The remote server failed to provide the requested resource
//!     Request Method: GET
//!     Request URL: https://registry.example.com/pkg
//!     Response Code: 503 (Service Unavailable)
//! ```
//!
//! Errors are built up in layers: `StructuredError::wrap` starts from a string,
//! a plain error, an existing structured error or an arbitrary JSON value, and
//! `enhance` merges an `ErrorBuilder` into an existing instance.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;
use std::mem;
use std::sync::Arc;

use serde_json::Value;

use super::render::{FieldValue, Renderer};

/// Text inserted before every rendered field.
pub const FIELD_SEPARATOR: &str = "\n    ";

/// Name given to errors that do not set one.
pub const DEFAULT_ERROR_NAME: &str = "Error";

/// A labeled context value attached to a `StructuredError`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorField {
    pub label: String,
    pub value: FieldValue,
}

impl ErrorField {
    pub fn new(label: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A builder entry: either a replacement value or a function of the previous one.
pub enum Update<T> {
    Literal(T),
    Derive(Box<dyn FnOnce(T) -> T + Send>),
}

impl<T> Update<T> {
    /// Resolves the entry against the previous value.
    pub fn apply(self, previous: T) -> T {
        match self {
            Update::Literal(value) => value,
            Update::Derive(derive) => derive(previous),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Update::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}

/// Changes to apply to a `StructuredError`.
///
/// `name`, `summary` and `include_stack` replace (or derive from) the previous
/// value when set; fields are always appended after the existing ones.
#[derive(Default)]
pub struct ErrorBuilder {
    name: Option<Update<String>>,
    summary: Option<Update<String>>,
    include_stack: Option<Update<bool>>,
    fields: Vec<ErrorField>,
    render_context: Option<Arc<dyn Renderer>>,
}

impl ErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Update::Literal(name.into()));
        self
    }

    pub fn derive_name(mut self, derive: impl FnOnce(String) -> String + Send + 'static) -> Self {
        self.name = Some(Update::Derive(Box::new(derive)));
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(Update::Literal(summary.into()));
        self
    }

    pub fn derive_summary(
        mut self,
        derive: impl FnOnce(String) -> String + Send + 'static,
    ) -> Self {
        self.summary = Some(Update::Derive(Box::new(derive)));
        self
    }

    pub fn include_stack(mut self, include: bool) -> Self {
        self.include_stack = Some(Update::Literal(include));
        self
    }

    pub fn derive_include_stack(mut self, derive: impl FnOnce(bool) -> bool + Send + 'static) -> Self {
        self.include_stack = Some(Update::Derive(Box::new(derive)));
        self
    }

    pub fn field(mut self, label: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push(ErrorField::new(label, value));
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = ErrorField>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn render_context(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.render_context = Some(renderer);
        self
    }
}

impl fmt::Debug for ErrorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBuilder")
            .field("name", &self.name)
            .field("summary", &self.summary)
            .field("include_stack", &self.include_stack)
            .field("fields", &self.fields)
            .field("render_context", &self.render_context.is_some())
            .finish()
    }
}

/// What a `StructuredError` can be built from.
#[derive(Debug, Clone)]
pub enum ErrorSource {
    /// A bare message
    Message(String),
    /// Any other error
    Error(Arc<dyn Error + Send + Sync>),
    /// An existing structured error, whose context is carried over
    Structured(StructuredError),
    /// A failure value that is not an error at all
    Value(Value),
}

impl ErrorSource {
    /// Wraps an error, recognising structured errors.
    pub fn error<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        let boxed: Box<dyn Error + Send + Sync> = Box::new(err);
        match boxed.downcast::<StructuredError>() {
            Ok(structured) => ErrorSource::Structured(*structured),
            Err(other) => ErrorSource::Error(Arc::from(other)),
        }
    }
}

impl From<&str> for ErrorSource {
    fn from(message: &str) -> Self {
        ErrorSource::Message(message.to_string())
    }
}

impl From<String> for ErrorSource {
    fn from(message: String) -> Self {
        ErrorSource::Message(message)
    }
}

impl From<StructuredError> for ErrorSource {
    fn from(err: StructuredError) -> Self {
        ErrorSource::Structured(err)
    }
}

impl From<Value> for ErrorSource {
    fn from(value: Value) -> Self {
        ErrorSource::Value(value)
    }
}

/// An error with a summary and ordered, labeled context fields.
#[derive(Debug, Clone)]
pub struct StructuredError {
    name: String,
    summary: String,
    fields: Vec<ErrorField>,
    include_stack: bool,
    stack: Option<Arc<Backtrace>>,
    render_context: Option<Arc<dyn Renderer>>,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl StructuredError {
    /// Creates an error with the given summary, no fields, and a captured stack.
    pub fn new(summary: impl Into<String>) -> Self {
        Self::wrap(ErrorSource::Message(summary.into()), ErrorBuilder::new())
    }

    /// Builds an error from `source`, then applies `builder`.
    ///
    /// Wrapping a structured error starts from its name, summary, fields, stack
    /// flag and render context, so context accumulates across layers.
    pub fn wrap(source: impl Into<ErrorSource>, builder: ErrorBuilder) -> Self {
        let mut err = match source.into() {
            ErrorSource::Message(message) => Self::blank(message),
            ErrorSource::Error(cause) => {
                let mut err = Self::blank(cause.to_string());
                err.source = Some(cause);
                err
            }
            ErrorSource::Structured(previous) => previous,
            ErrorSource::Value(value) => Self::blank(describe_value(&value)),
        };
        err.enhance(builder);
        err
    }

    fn blank(summary: String) -> Self {
        Self {
            name: DEFAULT_ERROR_NAME.to_string(),
            summary,
            fields: Vec::new(),
            include_stack: true,
            stack: None,
            render_context: None,
            source: None,
        }
    }

    /// Merges `builder` into this error.
    ///
    /// The stack is dropped when the builder disables it, or leaves it unset
    /// while it is already disabled. Otherwise a fresh stack is captured here.
    pub fn enhance(&mut self, builder: ErrorBuilder) {
        let ErrorBuilder {
            name,
            summary,
            include_stack,
            fields,
            render_context,
        } = builder;

        if let Some(update) = name {
            self.name = update.apply(mem::take(&mut self.name));
        }
        if let Some(update) = summary {
            self.summary = update.apply(mem::take(&mut self.summary));
        }
        self.fields.extend(fields);
        if render_context.is_some() {
            self.render_context = render_context;
        }

        let keep_stack = match include_stack {
            Some(update) => update.apply(self.include_stack),
            None => self.include_stack,
        };
        if keep_stack {
            self.include_stack = true;
            self.stack = Some(Arc::new(Backtrace::capture()));
        } else {
            self.include_stack = false;
            self.stack = None;
        }
    }

    /// Summary followed by every field, one indented line each.
    pub fn message(&self) -> String {
        let mut message = self.summary.clone();
        message.push_str(&self.fields_text());
        message
    }

    /// Replaces the message.
    ///
    /// Any rendered field text contained in `message` is stripped and the
    /// fields are cleared, so `message()` afterwards returns only the new
    /// summary.
    pub fn set_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        let fields_text = self.fields_text();
        self.summary = if fields_text.is_empty() {
            message
        } else {
            message.replacen(&fields_text, "", 1)
        };
        self.fields.clear();
    }

    /// Replaces the summary, keeping the fields.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = summary.into();
    }

    fn fields_text(&self) -> String {
        self.fields
            .iter()
            .map(|field| format!("{}{}", FIELD_SEPARATOR, self.render_field(field)))
            .collect()
    }

    fn render_field(&self, field: &ErrorField) -> String {
        match &self.render_context {
            Some(renderer) => format!(
                "{}: {}",
                renderer.label(&field.label),
                renderer.value(&field.value)
            ),
            None => format!("{}: {}", field.label, field.value.plain()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn fields(&self) -> &[ErrorField] {
        &self.fields
    }

    /// First field with the given label.
    pub fn field(&self, label: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|field| field.label == label)
            .map(|field| &field.value)
    }

    pub fn include_stack(&self) -> bool {
        self.include_stack
    }

    pub fn stack(&self) -> Option<&Backtrace> {
        self.stack.as_deref()
    }

    pub fn render_context(&self) -> Option<&Arc<dyn Renderer>> {
        self.render_context.as_ref()
    }
}

impl fmt::Display for StructuredError {
    /// `{}` prints the message; `{:#}` also prints the stack when one was captured.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())?;
        if f.alternate() {
            if let Some(stack) = &self.stack {
                if stack.status() == BacktraceStatus::Captured {
                    write!(f, "\n{}", stack)?;
                }
            }
        }
        Ok(())
    }
}

impl Error for StructuredError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}

fn describe_value(value: &Value) -> String {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("Non-error value: {} ({})", value, kind)
}
