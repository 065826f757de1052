//! Rendering of error field values.
//!
//! Structured errors keep their field values as JSON plus a hint describing what
//! the value is. The hint only matters when a `Renderer` is available; without
//! one, values are rendered context free (`FieldValue::plain`).

use std::fmt;
use std::time::Duration;

use colored::Colorize;
use serde_json::Value;

/// What a field value represents, used to pick its presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderHint {
    NoHint,
    Code,
    Setting,
    Number,
    Url,
    Path,
    /// Milliseconds
    Duration,
    /// Text linking to `href`
    Hyperlink { href: String },
}

/// A field value together with its render hint.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub value: Value,
    pub hint: RenderHint,
}

impl FieldValue {
    pub fn new(value: Value, hint: RenderHint) -> Self {
        Self { value, hint }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Value::String(text.into()), RenderHint::NoHint)
    }

    pub fn code(code: impl Into<String>) -> Self {
        Self::new(Value::String(code.into()), RenderHint::Code)
    }

    /// Name of a configuration setting.
    pub fn setting(name: impl Into<String>) -> Self {
        Self::new(Value::String(name.into()), RenderHint::Setting)
    }

    pub fn number(n: impl Into<serde_json::Number>) -> Self {
        Self::new(Value::Number(n.into()), RenderHint::Number)
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::new(Value::String(url.into()), RenderHint::Url)
    }

    /// A list of URLs, rendered comma separated.
    pub fn url_list<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            Value::Array(urls.into_iter().map(|u| Value::String(u.into())).collect()),
            RenderHint::Url,
        )
    }

    pub fn path(path: &std::path::Path) -> Self {
        Self::new(
            Value::String(path.display().to_string()),
            RenderHint::Path,
        )
    }

    pub fn duration(duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self::new(Value::Number(millis.into()), RenderHint::Duration)
    }

    pub fn hyperlink(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self::new(
            Value::String(text.into()),
            RenderHint::Hyperlink { href: href.into() },
        )
    }

    /// Context-free rendering.
    ///
    /// Strings are printed verbatim, arrays comma separated, durations in
    /// milliseconds with a unit, and anything else as JSON. Hyperlinks render as
    /// their text.
    pub fn plain(&self) -> String {
        match (&self.hint, &self.value) {
            (RenderHint::Duration, Value::Number(ms)) => format!("{}ms", ms),
            (_, value) => plain_json(value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::text(text)
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::text(text)
    }
}

fn plain_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(plain_json).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Formatting strategy for error fields.
///
/// Injected into a `StructuredError` and consulted only when its message is
/// rendered, so errors can be created before any formatting configuration
/// exists.
pub trait Renderer: Send + Sync + fmt::Debug {
    /// Renders a field label.
    fn label(&self, label: &str) -> String;

    /// Renders a field value according to its hint.
    fn value(&self, value: &FieldValue) -> String;
}

/// Renders exactly like the context-free fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn label(&self, label: &str) -> String {
        label.to_string()
    }

    fn value(&self, value: &FieldValue) -> String {
        value.plain()
    }
}

/// Terminal renderer with optional colors and OSC-8 hyperlinks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalRenderer {
    colors: bool,
    hyperlinks: bool,
}

impl TerminalRenderer {
    pub fn new(colors: bool, hyperlinks: bool) -> Self {
        Self { colors, hyperlinks }
    }
}

impl Renderer for TerminalRenderer {
    fn label(&self, label: &str) -> String {
        if self.colors {
            label.bold().to_string()
        } else {
            label.to_string()
        }
    }

    fn value(&self, value: &FieldValue) -> String {
        let text = value.plain();
        let text = if self.colors {
            match &value.hint {
                RenderHint::NoHint => text,
                RenderHint::Code => text.cyan().to_string(),
                RenderHint::Setting => text.yellow().to_string(),
                RenderHint::Number => text.bright_yellow().to_string(),
                RenderHint::Url | RenderHint::Hyperlink { .. } => text.blue().underline().to_string(),
                RenderHint::Path => text.magenta().to_string(),
                RenderHint::Duration => text.green().to_string(),
            }
        } else {
            text
        };

        match &value.hint {
            RenderHint::Hyperlink { href } if self.hyperlinks => osc8(href, &text),
            _ => text,
        }
    }
}

fn osc8(href: &str, text: &str) -> String {
    format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", href, text)
}
