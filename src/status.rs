//! Exit status codes for the CLI
//!
//! - 0: Success
//! - 1: Any error (parse, cycle, extraction, transport, ...)
//! - 130: User interrupted (Ctrl+C, standard SIGINT exit code)

use std::process::{ExitCode, Termination};

use crate::errors::ReqtreeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    Error = 1,
    Interrupted = 130,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

impl Termination for ExitStatus {
    fn report(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}

impl From<&ReqtreeError> for ExitStatus {
    fn from(error: &ReqtreeError) -> Self {
        match error {
            ReqtreeError::Cancelled => ExitStatus::Interrupted,
            _ => ExitStatus::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ExitStatus::Success as u8, 0);
        assert_eq!(ExitStatus::Error as u8, 1);
        assert_eq!(ExitStatus::Interrupted as u8, 130);
    }

    #[test]
    fn test_from_error() {
        assert_eq!(ExitStatus::from(&ReqtreeError::Cancelled), ExitStatus::Interrupted);
        assert_eq!(
            ExitStatus::from(&ReqtreeError::Profile("x".into())),
            ExitStatus::Error
        );
    }
}
