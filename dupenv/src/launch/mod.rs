//! Launching a process with an explicit environment list
//!
//! `std::process::Command` stores environment variables in a map, so a key given twice reaches the
//! child only once with the last value. [`EnvMode::Raw`] bypasses `Command` and hands the list to
//! `posix_spawn(3)` as is. [`EnvMode::Normalized`] keeps the standard library behavior.

mod raw;

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio as StdStdio};

use log::{debug, log_enabled, trace, warn, Level};

use crate::env::EnvList;
use crate::error::Error;

/// How the environment list is passed to the child process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum EnvMode {
    /// Pass the list verbatim including duplicate keys
    #[default]
    Raw,
    /// Let `std::process::Command` deduplicate the list (the last entry of a key wins)
    Normalized,
}

/// The redirection of an output stream of the child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stdio {
    /// Pass the stream through to the stream of the current process
    #[default]
    Inherit,
    /// Discard the output
    Null,
    /// Write the output into a file which is created or truncated
    File(PathBuf),
}

/// The output streams of a child process
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stream {
    /// The standard output
    Stdout,
    /// The standard error
    Stderr,
}

/// A description of a single process launch
#[derive(Debug, Clone)]
pub struct Launch {
    args: Vec<OsString>,
    env: EnvList,
    env_mode: EnvMode,
    program: PathBuf,
    stderr: Stdio,
    stdout: Stdio,
}

impl Stdio {
    /// Open the file backing this redirection
    ///
    /// Returns `None` if the stream is inherited.
    fn open(&self, stream: Stream) -> Result<Option<File>, String> {
        match self {
            Self::Inherit => Ok(None),
            Self::Null => OpenOptions::new()
                .write(true)
                .open("/dev/null")
                .map(Some)
                .map_err(|error| format!("Failed to open '/dev/null' for {stream}: {error}")),
            Self::File(path) => File::create(path).map(Some).map_err(|error| {
                format!(
                    "Failed to create file '{}' for {stream}: {error}",
                    path.display()
                )
            }),
        }
    }

    fn apply(&self, command: &mut Command, stream: Stream) -> Result<(), String> {
        let stdio = self
            .open(stream)?
            .map_or_else(StdStdio::inherit, StdStdio::from);

        match stream {
            Stream::Stdout => command.stdout(stdio),
            Stream::Stderr => command.stderr(stdio),
        };

        Ok(())
    }
}

impl Stream {
    /// The file descriptor of this stream in the child process
    fn fd(self) -> libc::c_int {
        match self {
            Self::Stdout => libc::STDOUT_FILENO,
            Self::Stderr => libc::STDERR_FILENO,
        }
    }
}

impl Launch {
    /// Create a new `Launch` of `program` with the environment `env`
    ///
    /// The defaults are no arguments, [`EnvMode::Raw`] and both output streams passed through.
    pub fn new<T>(program: T, env: EnvList) -> Self
    where
        T: Into<PathBuf>,
    {
        Self {
            args: Vec::new(),
            env,
            env_mode: EnvMode::default(),
            program: program.into(),
            stderr: Stdio::default(),
            stdout: Stdio::default(),
        }
    }

    /// Add an argument
    #[must_use]
    pub fn arg<T>(mut self, arg: T) -> Self
    where
        T: Into<OsString>,
    {
        self.args.push(arg.into());
        self
    }

    /// Set the [`EnvMode`]
    #[must_use]
    pub fn env_mode(mut self, env_mode: EnvMode) -> Self {
        self.env_mode = env_mode;
        self
    }

    /// Set the redirection of stdout
    #[must_use]
    pub fn stdout(mut self, stdio: Stdio) -> Self {
        self.stdout = stdio;
        self
    }

    /// Set the redirection of stderr
    #[must_use]
    pub fn stderr(mut self, stdio: Stdio) -> Self {
        self.stderr = stdio;
        self
    }

    /// Return the program as given
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Return the environment list the child is launched with
    pub fn env(&self) -> &EnvList {
        &self.env
    }

    /// Launch the process and wait for it to finish
    ///
    /// A process which was launched successfully but exited with a non-zero exit code is not an
    /// error here. Inspect the returned [`ExitStatus`] for that.
    pub fn run(&self) -> Result<ExitStatus, Error> {
        let program = resolve_program(&self.program)?;
        debug!(
            "Launching '{}' with {} environment entries ({} mode)",
            program.display(),
            self.env.len(),
            self.env_mode
        );
        if log_enabled!(Level::Trace) {
            for (index, entry) in self.env.iter().enumerate() {
                trace!("envp[{index}]: {entry}");
            }
        }

        match self.env_mode {
            EnvMode::Raw => raw::spawn_and_wait(
                &program,
                &self.args,
                &self.env,
                [(&self.stdout, Stream::Stdout), (&self.stderr, Stream::Stderr)],
            ),
            EnvMode::Normalized => self.run_command(&program),
        }
    }

    fn run_command(&self, program: &Path) -> Result<ExitStatus, Error> {
        let launch_error = |message: String| Error::LaunchError(program.to_owned(), message);

        let mut command = Command::new(program);
        command.args(&self.args).env_clear();
        for entry in &self.env {
            match entry.split() {
                (key, Some(value)) => {
                    command.env(key, value);
                }
                (key, None) => warn!(
                    "Skipping environment entry without '=': '{}'",
                    key.to_string_lossy()
                ),
            }
        }

        self.stdout
            .apply(&mut command, Stream::Stdout)
            .map_err(launch_error)?;
        self.stderr
            .apply(&mut command, Stream::Stderr)
            .map_err(launch_error)?;

        command
            .status()
            .map_err(|error| launch_error(error.to_string()))
    }
}

/// Resolve `program` to a path
///
/// Programs containing a `/` are used as they are, relative to the current directory. Everything
/// else is looked up in the `PATH` of the current process (not the `PATH` of the child).
fn resolve_program(program: &Path) -> Result<PathBuf, Error> {
    if program.as_os_str().as_bytes().contains(&b'/') {
        return Ok(program.to_owned());
    }

    match which::which(program) {
        Ok(path) => {
            debug!("Found '{}': '{}'", program.display(), path.display());
            Ok(path)
        }
        Err(error) => Err(Error::LaunchError(
            program.to_owned(),
            format!("{error}: Is it installed, executable and in the PATH?"),
        )),
    }
}
