//! Structured YAML request files
//!
//! ```yaml
//! # @depends auth/login.yaml
//! # @extract orderId id
//! method: POST
//! url: "{{baseUrl}}/orders"
//! headers:
//!   Content-Type: application/json
//! body:
//!   sku: "{{sku}}"
//!   quantity: 2
//! ```
//!
//! A file may instead hold a `requests:` list of the same mappings. A body
//! given as a mapping or list is sent as compact JSON.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

use super::{read_request_file, strip_comment, FileParser, ParsedFile, RequestDefinition};
use crate::errors::{ReqtreeError, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct YamlFileParser;

impl FileParser for YamlFileParser {
    fn parse(&self, path: &Path) -> Result<ParsedFile> {
        let content = read_request_file(path)?;
        parse_yaml_content(path, &content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum YamlFile {
    Many { requests: Vec<YamlRequest> },
    One(YamlRequest),
}

#[derive(Debug, Deserialize)]
struct YamlRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_method")]
    method: String,
    url: String,
    #[serde(default)]
    headers: IndexMap<String, String>,
    #[serde(default)]
    body: Option<serde_yaml::Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

pub fn parse_yaml_content(path: &Path, content: &str) -> Result<ParsedFile> {
    let comments = content
        .lines()
        .map(str::trim)
        .take_while(|line| line.is_empty() || line.starts_with('#'))
        .filter_map(strip_comment)
        .map(str::to_string)
        .collect();

    let file: YamlFile = serde_yaml::from_str(content)
        .map_err(|e| ReqtreeError::parse(path, e.to_string()))?;

    let raw = match file {
        YamlFile::Many { requests } => requests,
        YamlFile::One(request) => vec![request],
    };

    if raw.is_empty() {
        return Err(ReqtreeError::parse(path, "no request definitions found"));
    }

    let requests = raw
        .into_iter()
        .map(|r| {
            Ok(RequestDefinition {
                name: r.name,
                method: r.method.to_uppercase(),
                url: r.url,
                headers: r.headers,
                body: r.body.map(|b| body_text(path, b)).transpose()?,
                line_number: 0,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedFile {
        path: path.to_path_buf(),
        requests,
        comments,
    })
}

fn body_text(path: &Path, body: serde_yaml::Value) -> Result<String> {
    match body {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Null => Ok(String::new()),
        other => serde_json::to_string(&other)
            .map_err(|e| ReqtreeError::parse(path, format!("body is not valid JSON: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> ParsedFile {
        parse_yaml_content(Path::new("req.yaml"), content).unwrap()
    }

    #[test]
    fn test_single_request_with_comments() {
        let content = r#"
# Create an order
# @depends auth/login.yaml
# @extract orderId id
method: post
url: "{{baseUrl}}/orders"
headers:
  Content-Type: application/json
  X-Trace: "{{traceId}}"
body:
  sku: "{{sku}}"
  quantity: 2
"#;
        let parsed = parse(content);
        assert_eq!(
            parsed.comments,
            vec!["Create an order", "@depends auth/login.yaml", "@extract orderId id"]
        );

        let request = parsed.primary().unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "{{baseUrl}}/orders");
        assert_eq!(request.headers.keys().collect::<Vec<_>>(), vec!["Content-Type", "X-Trace"]);
        assert_eq!(request.body.as_deref(), Some(r#"{"sku":"{{sku}}","quantity":2}"#));
    }

    #[test]
    fn test_request_list() {
        let content = r#"
requests:
  - name: first
    url: https://x.test/a
  - method: DELETE
    url: https://x.test/b
    body: "raw text"
"#;
        let parsed = parse(content);
        assert_eq!(parsed.requests.len(), 2);
        assert_eq!(parsed.requests[0].method, "GET");
        assert_eq!(parsed.requests[0].name.as_deref(), Some("first"));
        assert_eq!(parsed.requests[1].body.as_deref(), Some("raw text"));
    }

    #[test]
    fn test_comments_after_content_ignored() {
        let parsed = parse("url: https://x.test\n# @depends late.yaml\n");
        assert!(parsed.comments.is_empty());
    }

    #[test]
    fn test_empty_list_is_error() {
        let err = parse_yaml_content(Path::new("none.yaml"), "requests: []\n").unwrap_err();
        assert!(matches!(err, ReqtreeError::Parse { .. }));
    }

    #[test]
    fn test_missing_url_is_error() {
        let err = parse_yaml_content(Path::new("bad.yaml"), "method: GET\n").unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }
}
