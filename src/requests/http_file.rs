//! .http/.rest file parser
//!
//! Parses the REST Client format used by VS Code.
//!
//! Format:
//! ```http
//! # @depends auth/login.http
//! # @extract userId id
//! ### Fetch user
//! GET {{baseUrl}}/users/me
//! Authorization: Bearer {{token}}
//!
//! ### Create user
//! POST {{baseUrl}}/users
//! Content-Type: application/json
//!
//! {"name": "John"}
//! ```
//!
//! Comment lines start with `#` or `//`. Those before the first request line
//! and among the first request's headers form the file's documentation.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use super::{read_request_file, strip_comment, FileParser, ParsedFile, RequestDefinition};
use crate::errors::{ReqtreeError, Result};

const METHODS: [&str; 9] = [
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "TRACE", "CONNECT",
];

static HTTP_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+HTTP/\d(\.\d)?$").expect("Failed to compile HTTP version regex"));

#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFileParser;

impl FileParser for HttpFileParser {
    fn parse(&self, path: &Path) -> Result<ParsedFile> {
        let content = read_request_file(path)?;
        parse_http_content(path, &content)
    }
}

/// Parse .http content; `path` is only used for error messages.
pub fn parse_http_content(path: &Path, content: &str) -> Result<ParsedFile> {
    let mut requests = Vec::new();
    let mut comments = Vec::new();
    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let trimmed = lines[i].trim();

        if trimmed.is_empty() {
            i += 1;
            continue;
        }

        // Request separator, optionally naming the request
        let name = if trimmed.starts_with("###") {
            let name_line = trimmed.trim_start_matches('#').trim();
            i += 1;
            (!name_line.is_empty()).then(|| name_line.to_string())
        } else if let Some(comment) = strip_comment(trimmed) {
            if requests.is_empty() {
                comments.push(comment.to_string());
            }
            i += 1;
            continue;
        } else {
            None
        };

        // Comments and blank lines between the separator and the request line
        while i < lines.len() {
            let line = lines[i].trim();
            if line.is_empty() {
                i += 1;
            } else if let Some(comment) = strip_comment(line) {
                if requests.is_empty() {
                    comments.push(comment.to_string());
                }
                i += 1;
            } else {
                break;
            }
        }

        if i >= lines.len() {
            break;
        }

        let request_line = lines[i].trim();
        if request_line.starts_with("###") {
            continue;
        }

        let request_line_num = i + 1;
        let (method, url) = parse_request_line(request_line).ok_or_else(|| {
            ReqtreeError::parse(
                path,
                format!("invalid request line at line {}: '{}'", request_line_num, request_line),
            )
        })?;
        i += 1;

        // Headers until an empty line
        let mut headers = IndexMap::new();
        while i < lines.len() {
            let line = lines[i].trim();

            if line.is_empty() {
                i += 1;
                break;
            }
            if line.starts_with("###") {
                break;
            }
            if let Some(comment) = strip_comment(line) {
                if requests.is_empty() {
                    comments.push(comment.to_string());
                }
                i += 1;
                continue;
            }

            if let Some((name, value)) = parse_header_line(line) {
                headers.insert(name, value);
            }
            i += 1;
        }

        // Body until the next separator
        let mut body_lines = Vec::new();
        while i < lines.len() {
            let line = lines[i];

            if line.trim().starts_with("###") {
                break;
            }
            // An unseparated request line right after the headers starts a new request
            if body_lines.is_empty() && parse_request_line(line.trim()).is_some() {
                break;
            }

            body_lines.push(line);
            i += 1;
        }

        while body_lines.last().is_some_and(|l| l.trim().is_empty()) {
            body_lines.pop();
        }
        while body_lines.first().is_some_and(|l| l.trim().is_empty()) {
            body_lines.remove(0);
        }

        let body = (!body_lines.is_empty()).then(|| body_lines.join("\n"));

        requests.push(RequestDefinition {
            name,
            method,
            url,
            headers,
            body,
            line_number: request_line_num,
        });
    }

    if requests.is_empty() {
        return Err(ReqtreeError::parse(path, "no request definitions found"));
    }

    Ok(ParsedFile {
        path: path.to_path_buf(),
        requests,
        comments,
    })
}

/// Parse a request line like "GET https://example.com" or "POST /api HTTP/1.1".
///
/// The URL is the rest of the line, so `{{ name }}` and `$(cmd args)` keep
/// their spaces. Only a trailing HTTP version is dropped.
fn parse_request_line(line: &str) -> Option<(String, String)> {
    let (method, rest) = line.trim().split_once(char::is_whitespace)?;
    let method = method.to_uppercase();
    if !METHODS.contains(&method.as_str()) {
        return None;
    }

    let url = HTTP_VERSION_RE.replace(rest.trim(), "");
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    Some((method, url.to_string()))
}

/// Parse a header line like "Content-Type: application/json"
fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
