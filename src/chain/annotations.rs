//! `@depends` and `@extract` directives
//!
//! The scanner works on documentation lines already pulled out of a file by
//! its parser, so it does not care which request format the file uses.
//!
//! ```text
//! @depends auth/login.http users/create.http
//! @extract token access_token
//! @extract userId = user.id
//! ```

use std::path::Path;

use crate::errors::{ReqtreeError, Result};

/// One `@extract` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub variable: String,
    /// JMESPath expression, unparsed
    pub expression: String,
}

/// Directives found in one file, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub depends: Vec<String>,
    pub extractions: Vec<Extraction>,
}

/// Scans documentation lines for directives.
///
/// Malformed `@extract` lines are skipped. A `@depends` with no path is a
/// parse error against `path`.
pub fn scan<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<Annotations> {
    let mut annotations = Annotations::default();

    for line in lines {
        let line = strip_marker(line.as_ref());

        if let Some(rest) = directive(line, "@depends") {
            let before = annotations.depends.len();
            annotations
                .depends
                .extend(rest.split_whitespace().map(str::to_string));
            if annotations.depends.len() == before {
                return Err(ReqtreeError::parse(path, "@depends requires at least one path"));
            }
        } else if let Some(rest) = directive(line, "@extract") {
            if let Some(extraction) = parse_extract(rest) {
                annotations.extractions.push(extraction);
            }
        }
    }

    Ok(annotations)
}

// Lines may still carry their comment marker when they come from elsewhere.
fn strip_marker(line: &str) -> &str {
    let line = line.trim();
    line.strip_prefix("//")
        .or_else(|| line.strip_prefix('#'))
        .map(str::trim)
        .unwrap_or(line)
}

/// Text after `keyword` when the line starts with it as a whole word.
fn directive<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn parse_extract(rest: &str) -> Option<Extraction> {
    let (variable, expression) = rest.split_once(char::is_whitespace)?;
    let expression = expression.trim();
    let expression = expression
        .strip_prefix('=')
        .map(str::trim_start)
        .unwrap_or(expression);

    if expression.is_empty() || !is_variable_name(variable) {
        return None;
    }

    Some(Extraction {
        variable: variable.to_string(),
        expression: expression.to_string(),
    })
}

fn is_variable_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
