//! Hostname glob patterns.
//!
//! Globs are compiled once, when the configuration is loaded, into
//! case-insensitive anchored regular expressions.
//!
//! Supported syntax:
//! - `*` matches any run of characters, dots included
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` and `[!abc]` match a character class
//! - `{api,www}` matches one of the alternatives
//! - `\x` matches `x` literally

use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Errors raised while compiling a host glob.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlobError {
    /// The pattern is the empty string
    #[error("Host pattern must not be empty")]
    Empty,

    /// A `[` without its closing `]`
    #[error("Unclosed character class in host pattern '{0}'")]
    UnclosedClass(String),

    /// A `{` without its closing `}`
    #[error("Unclosed alternative group in host pattern '{0}'")]
    UnclosedBrace(String),

    /// A pattern ending with a lone backslash
    #[error("Host pattern '{0}' ends with an escape character")]
    TrailingEscape(String),

    /// The translated expression was rejected by the regex engine
    #[error("Invalid host pattern '{pattern}': {message}")]
    Compile { pattern: String, message: String },
}

/// A compiled hostname glob.
#[derive(Clone)]
pub struct HostPattern {
    source: String,
    regex: Regex,
}

impl HostPattern {
    /// Compiles `glob` into a matcher.
    ///
    /// # Errors
    ///
    /// Returns `GlobError` for empty patterns and unbalanced `[` / `{` groups.
    pub fn new(glob: &str) -> Result<Self, GlobError> {
        if glob.is_empty() {
            return Err(GlobError::Empty);
        }
        let expression = translate(glob)?;
        let regex = Regex::new(&format!("(?i)^{}$", expression)).map_err(|e| {
            GlobError::Compile {
                pattern: glob.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            source: glob.to_string(),
            regex,
        })
    }

    /// The glob as written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Length of the glob in characters; longer patterns are more specific.
    pub fn specificity(&self) -> usize {
        self.source.chars().count()
    }

    /// Returns true if `host` matches this glob.
    pub fn matches(&self, host: &str) -> bool {
        self.regex.is_match(host)
    }
}

impl fmt::Debug for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostPattern").field(&self.source).finish()
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for HostPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for HostPattern {}

fn translate(glob: &str) -> Result<String, GlobError> {
    let mut out = String::with_capacity(glob.len() * 2);
    let mut chars = glob.chars().peekable();
    let mut in_brace = false;

    while let Some(c) = chars.next() {
        match c {
            '*' => {
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => push_literal(&mut out, escaped),
                None => return Err(GlobError::TrailingEscape(glob.to_string())),
            },
            '[' => {
                let mut class = String::from("[");
                if chars.peek() == Some(&'!') {
                    chars.next();
                    class.push('^');
                }
                let mut closed = false;
                let mut first = true;
                while let Some(member) = chars.next() {
                    match member {
                        // A leading `]` is a literal member, not the terminator.
                        ']' if !first => {
                            closed = true;
                            break;
                        }
                        '\\' | '[' | ']' | '^' | '&' | '~' => {
                            class.push('\\');
                            class.push(member);
                        }
                        _ => class.push(member),
                    }
                    first = false;
                }
                if !closed {
                    return Err(GlobError::UnclosedClass(glob.to_string()));
                }
                class.push(']');
                out.push_str(&class);
            }
            '{' if !in_brace => {
                in_brace = true;
                out.push_str("(?:");
            }
            ',' if in_brace => out.push('|'),
            '}' if in_brace => {
                in_brace = false;
                out.push(')');
            }
            other => push_literal(&mut out, other),
        }
    }

    if in_brace {
        return Err(GlobError::UnclosedBrace(glob.to_string()));
    }
    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}
