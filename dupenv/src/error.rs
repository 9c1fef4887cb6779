//! The module containing the crate main [`Error`] type

use std::fmt::Display;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::ExitStatus;

/// The main dupenv error type
#[derive(Debug, PartialEq, Clone, Eq)]
pub enum Error {
    /// An environment entry which can't be parsed or handed to the operating system
    ///
    /// `InvalidEntry(message)`
    InvalidEntry(String),
    /// A probe specification on the command-line which can't be parsed
    ///
    /// `InvalidProbe(message)`
    InvalidProbe(String),
    /// The error when trying to start an external process fails
    ///
    /// `LaunchError(executable_path, message)`
    LaunchError(PathBuf, String),
    /// The error after a successful launch of an external process which didn't exit successfully
    ///
    /// `ProcessError(process_name, std::process::ExitStatus)`
    ProcessError(String, ExitStatus),
    /// Waiting for a launched process failed
    ///
    /// `WaitError(message)`
    WaitError(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEntry(message) => {
                write!(f, "Invalid environment entry: {message}")
            }
            Self::InvalidProbe(message) => {
                write!(f, "Invalid probe: {message}")
            }
            Self::LaunchError(exec, message) => {
                write!(f, "Error launching '{}': {message}", exec.display())
            }
            Self::ProcessError(process, status) => {
                if let Some(code) = status.code() {
                    write!(f, "Error running '{process}': Exit code was: '{code}'")
                } else if let Some(signal) = status.signal() {
                    write!(
                        f,
                        "Error running '{process}': Terminated by a signal '{signal}'"
                    )
                } else {
                    write!(f, "Error running '{process}': Terminated abnormally")
                }
            }
            Self::WaitError(message) => {
                write!(f, "Error waiting for child process: {message}")
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::exit_code(1 << 8, "Error running 'probe': Exit code was: '1'")]
    #[case::signal(9, "Error running 'probe': Terminated by a signal '9'")]
    fn test_process_error_display(#[case] raw: i32, #[case] expected: &str) {
        let error = Error::ProcessError("probe".to_owned(), ExitStatus::from_raw(raw));
        assert_eq!(error.to_string(), expected);
    }
}
