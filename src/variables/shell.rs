//! `$(command)` substitution
//!
//! Fragments are found with a balanced-paren scanner rather than a regex so
//! commands that contain parentheses themselves (`$(echo "(x)")`,
//! `$(date -d "$(cat f)")`) are captured whole. Quotes suspend paren counting.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::{ReqtreeError, Result, ShellError, ShellFailure};

/// Default bound on a single substitution.
pub const DEFAULT_SHELL_TIMEOUT: Duration = Duration::from_secs(5);

/// A `$(...)` occurrence in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellFragment {
    /// Byte offset of the `$`
    pub start: usize,
    /// Byte offset one past the closing `)`
    pub end: usize,
    /// Text between the parentheses
    pub command: String,
}

/// Finds every top-level `$(...)` fragment, left to right.
///
/// An unterminated `$(` ends the scan; the remainder is left as plain text.
pub fn find_fragments(text: &str) -> Vec<ShellFragment> {
    let bytes = text.as_bytes();
    let mut fragments = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'(' {
            match matching_paren(bytes, i + 1) {
                Some(close) => {
                    fragments.push(ShellFragment {
                        start: i,
                        end: close + 1,
                        command: text[i + 2..close].to_string(),
                    });
                    i = close + 1;
                }
                None => break,
            }
        } else {
            i += 1;
        }
    }

    fragments
}

/// Index of the `)` closing the `(` at `open`, honouring nesting, quotes
/// and backslash escapes.
fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        if in_single {
            if b == b'\'' {
                in_single = false;
            }
        } else if b == b'\\' {
            i += 1;
        } else if in_double {
            if b == b'"' {
                in_double = false;
            }
        } else {
            match b {
                b'\'' => in_single = true,
                b'"' => in_double = true,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    None
}

/// Runs substitution commands through a shell with a bounded timeout.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    program: String,
    timeout: Duration,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL_TIMEOUT)
    }
}

impl ShellRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: default_shell().to_string(),
            timeout,
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `command` and returns its trimmed stdout.
    ///
    /// Non-zero exit, timeout and spawn failures come back as
    /// [`ReqtreeError::Shell`]; cancellation as [`ReqtreeError::Cancelled`].
    /// The child is killed when either the timeout or the cancellation fires.
    pub async fn run(&self, command: &str, cancel: &CancellationToken) -> Result<String> {
        debug!(command, program = %self.program, "Running shell substitution");

        let mut cmd = Command::new(&self.program);
        cmd.arg(shell_flag(&self.program))
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| shell_error(command, ShellFailure::Spawn(e.to_string())))?;

        let output = tokio::select! {
            output = child.wait_with_output() => {
                output.map_err(|e| shell_error(command, ShellFailure::Spawn(e.to_string())))?
            }
            _ = tokio::time::sleep(self.timeout) => {
                return Err(shell_error(command, ShellFailure::Timeout(self.timeout)));
            }
            _ = cancel.cancelled() => {
                return Err(ReqtreeError::Cancelled);
            }
        };

        if !output.status.success() {
            return Err(shell_error(
                command,
                ShellFailure::Exit {
                    code: output.status.code().unwrap_or(-1),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                },
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn shell_error(command: &str, reason: ShellFailure) -> ReqtreeError {
    ReqtreeError::Shell(ShellError {
        command: command.to_string(),
        reason,
    })
}

fn default_shell() -> &'static str {
    if cfg!(windows) {
        "cmd"
    } else {
        "sh"
    }
}

fn shell_flag(program: &str) -> &'static str {
    let name = std::path::Path::new(program)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(program);
    if name.eq_ignore_ascii_case("cmd") {
        "/C"
    } else if name.eq_ignore_ascii_case("powershell") || name.eq_ignore_ascii_case("pwsh") {
        "-Command"
    } else {
        "-c"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(text: &str) -> Vec<String> {
        find_fragments(text).into_iter().map(|f| f.command).collect()
    }

    #[test]
    fn test_find_simple_fragment() {
        let fragments = find_fragments("id=$(uuidgen)&x=1");
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].command, "uuidgen");
        assert_eq!(fragments[0].start, 3);
        assert_eq!(fragments[0].end, 13);
    }

    #[test]
    fn test_nested_parens_stay_in_one_fragment() {
        assert_eq!(commands("$(echo $(date +%s))"), vec!["echo $(date +%s)"]);
        assert_eq!(commands("$(expr \\( 1 + 2 \\))"), vec!["expr \\( 1 + 2 \\)"]);
    }

    #[test]
    fn test_quoted_parens_ignored() {
        assert_eq!(commands(r#"$(echo ")")"#), vec![r#"echo ")""#]);
        assert_eq!(commands("$(echo ')(')"), vec!["echo ')('"]);
    }

    #[test]
    fn test_multiple_fragments() {
        assert_eq!(
            commands("a=$(echo 1)&b=$(echo 2)"),
            vec!["echo 1".to_string(), "echo 2".to_string()]
        );
    }

    #[test]
    fn test_unterminated_fragment_ignored() {
        assert!(find_fragments("price is $(echo 5").is_empty());
        assert!(find_fragments("just $ and (parens)").is_empty());
    }

    #[test]
    fn test_shell_flag() {
        assert_eq!(shell_flag("sh"), "-c");
        assert_eq!(shell_flag("/bin/bash"), "-c");
        assert_eq!(shell_flag("cmd"), "/C");
        assert_eq!(shell_flag("pwsh"), "-Command");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_trims_output() {
        let runner = ShellRunner::default();
        let out = runner.run("echo hi", &CancellationToken::new()).await.unwrap();
        assert_eq!(out, "hi");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_non_zero_exit() {
        let runner = ShellRunner::default();
        let err = runner
            .run("echo oops >&2; exit 3", &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            ReqtreeError::Shell(ShellError { reason: ShellFailure::Exit { code, stderr }, .. }) => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_timeout() {
        let runner = ShellRunner::new(Duration::from_millis(100));
        let err = runner.run("sleep 5", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            ReqtreeError::Shell(ShellError { reason: ShellFailure::Timeout(_), .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_cancelled() {
        let runner = ShellRunner::new(Duration::from_secs(30));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = runner.run("sleep 5", &cancel).await.unwrap_err();
        assert!(matches!(err, ReqtreeError::Cancelled));
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let runner = ShellRunner::default().with_program("/definitely/not/a/shell");
        let err = runner.run("echo hi", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            ReqtreeError::Shell(ShellError { reason: ShellFailure::Spawn(_), .. })
        ));
    }
}
