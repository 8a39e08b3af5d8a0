//! Request files and their parsers
//!
//! Two formats are understood: the REST Client `.http`/`.rest` format and a
//! structured YAML format. Both produce a [`ParsedFile`] carrying the request
//! definitions plus the documentation lines the annotation scanner reads.

pub mod http_file;
pub mod yaml_file;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{ReqtreeError, Result};

pub use http_file::HttpFileParser;
pub use yaml_file::YamlFileParser;

/// A single request as written in a file, placeholders unresolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDefinition {
    /// Optional name (`### Name` in .http files)
    pub name: Option<String>,
    pub method: String,
    pub url: String,
    /// Header order is preserved
    pub headers: IndexMap<String, String>,
    pub body: Option<String>,
    /// Line of the request line, for error reporting
    pub line_number: usize,
}

impl RequestDefinition {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: None,
            method: method.into(),
            url: url.into(),
            headers: IndexMap::new(),
            body: None,
            line_number: 0,
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Adds `defaults` for every header the request does not already set.
    pub fn merge_headers(&mut self, defaults: &IndexMap<String, String>) {
        for (name, value) in defaults {
            if self.header(name).is_none() {
                self.headers.insert(name.clone(), value.clone());
            }
        }
    }
}

/// Result of parsing one request file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub path: PathBuf,
    /// In file order; never empty
    pub requests: Vec<RequestDefinition>,
    /// Comment lines of the file header and the first request block,
    /// with the comment marker stripped
    pub comments: Vec<String>,
}

impl ParsedFile {
    /// The request used when the file takes part in a chain
    pub fn primary(&self) -> Result<&RequestDefinition> {
        self.requests
            .first()
            .ok_or_else(|| ReqtreeError::parse(&self.path, "no request definitions found"))
    }
}

/// Turns a request file into request definitions and documentation lines.
pub trait FileParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<ParsedFile>;
}

/// Picks a parser from the file extension: `.yaml`/`.yml` are structured,
/// everything else is treated as `.http`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyFileParser;

impl FileParser for AnyFileParser {
    fn parse(&self, path: &Path) -> Result<ParsedFile> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                YamlFileParser.parse(path)
            }
            _ => HttpFileParser.parse(path),
        }
    }
}

/// Reads a request file, naming it on failure.
pub(crate) fn read_request_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| ReqtreeError::parse(path, format!("cannot read file: {}", e)))
}

/// Strips a `#` or `//` comment marker, or returns `None` for a non-comment line.
/// `###` separators are not comments.
pub(crate) fn strip_comment(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.starts_with("###") {
        return None;
    }
    line.strip_prefix("//")
        .or_else(|| line.strip_prefix('#'))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut request = RequestDefinition::new("GET", "https://x.test");
        request.headers.insert("Content-Type".into(), "application/json".into());
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("Accept"), None);
    }

    #[test]
    fn test_merge_headers_request_wins() {
        let mut request = RequestDefinition::new("GET", "https://x.test");
        request.headers.insert("x-env".into(), "local".into());

        let mut defaults = IndexMap::new();
        defaults.insert("X-Env".to_string(), "dev".to_string());
        defaults.insert("Accept".to_string(), "application/json".to_string());
        request.merge_headers(&defaults);

        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.header("X-Env"), Some("local"));
        assert_eq!(request.header("accept"), Some("application/json"));
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("# @depends a.http"), Some("@depends a.http"));
        assert_eq!(strip_comment("  // note"), Some("note"));
        assert_eq!(strip_comment("### Login"), None);
        assert_eq!(strip_comment("GET https://x.test"), None);
    }

    #[test]
    fn test_any_parser_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("user.yaml");
        let mut f = std::fs::File::create(&yaml).unwrap();
        writeln!(f, "method: GET\nurl: https://x.test/user").unwrap();

        let http = dir.path().join("user.rest");
        std::fs::write(&http, "GET https://x.test/user\n").unwrap();

        let from_yaml = AnyFileParser.parse(&yaml).unwrap();
        let from_http = AnyFileParser.parse(&http).unwrap();
        assert_eq!(from_yaml.primary().unwrap().url, "https://x.test/user");
        assert_eq!(from_http.primary().unwrap().url, "https://x.test/user");
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = AnyFileParser.parse(Path::new("/no/such/dir/req.http")).unwrap_err();
        assert!(err.to_string().contains("/no/such/dir/req.http"));
    }
}
