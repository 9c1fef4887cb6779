//! The spawner: run probes with an environment list containing duplicate keys
//!
//! The child environment is the ambient environment with extra entries appended. An appended entry
//! may repeat a key which is already present. The list is never deduplicated in
//! [`EnvMode::Raw`].

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use itertools::Itertools;
use log::{debug, warn};

use crate::env::{EnvEntry, EnvList};
use crate::envs;
use crate::error::Error;
use crate::launch::{EnvMode, Launch};

/// The entry `dupenv-spawn` appends if no `--entry` is given
pub const DEFAULT_ENTRY: &str = "TMPDIR=asdfasdf";
/// The name of the observer binary which is run if no probe is given
pub const OBSERVER_BIN: &str = "dupenv-print";

/// The command-line arguments of `dupenv-spawn`
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run programs with the current environment plus entries which may duplicate existing keys",
    long_about = None,
)]
pub struct SpawnArgs {
    /// The programs to run, in order, each optionally followed by `::MESSAGE`
    ///
    /// A program without a `/` is looked up in the PATH. If no program is given, the
    /// `dupenv-print` binary next to this executable is run.
    #[arg(value_name = "PROBE", env = envs::DUPENV_PROBE)]
    pub probes: Vec<Probe>,

    /// An entry to append to the environment list. Can be given multiple times
    #[arg(
        short = 'e',
        long = "entry",
        value_name = "KEY=VALUE",
        default_value = DEFAULT_ENTRY,
        value_parser = parse_entry
    )]
    pub entries: Vec<EnvEntry>,

    /// How the environment list is handed to the probes
    #[arg(long, value_enum, env = envs::DUPENV_ENV_MODE, default_value_t = EnvMode::Raw)]
    pub env_mode: EnvMode,

    /// Start with an empty environment instead of the environment of this process
    #[arg(long)]
    pub clear_ambient: bool,
}

/// `EnvEntry` converts from any `OsString`, which clap would pick over `FromStr` without this
fn parse_entry(value: &str) -> Result<EnvEntry, Error> {
    value.parse()
}

/// A program run by the [`Spawner`] to observe the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    message: Option<String>,
    program: PathBuf,
}

/// Builds the child environment and runs the probes with it
#[derive(Debug, Clone)]
pub struct Spawner {
    ambient: EnvList,
    appended: Vec<EnvEntry>,
    env_mode: EnvMode,
}

impl Probe {
    /// Create a new `Probe` without a message
    pub fn new<T>(program: T) -> Self
    where
        T: Into<PathBuf>,
    {
        Self {
            message: None,
            program: program.into(),
        }
    }

    /// Create a `Probe` for the binary `name` in the directory of the current executable
    pub fn sibling(name: &str) -> Result<Self, Error> {
        let exe = std::env::current_exe().map_err(|error| {
            Error::InvalidProbe(format!("Failed to locate the current executable: {error}"))
        })?;
        let dir = exe.parent().ok_or_else(|| {
            Error::InvalidProbe(format!(
                "The executable '{}' has no parent directory",
                exe.display()
            ))
        })?;

        Ok(Self::new(dir.join(name)))
    }

    /// Set the message printed in the header line
    #[must_use]
    pub fn message<T>(mut self, message: T) -> Self
    where
        T: Into<String>,
    {
        self.message = Some(message.into());
        self
    }

    /// Return the program path
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Write the header line announcing this probe
    pub fn write_header<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: Write,
    {
        let program = format!("{:<25}", self.program.display().to_string());
        writeln!(
            writer,
            "{}: {}: {}",
            "PARENT PROCESS".cyan(),
            program.green().bold(),
            self.message.as_deref().unwrap_or_default().yellow()
        )
    }
}

impl FromStr for Probe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (program, message) = match s.split_once("::") {
            Some((program, message)) => (program, Some(message)),
            None => (s, None),
        };

        if program.is_empty() {
            return Err(Error::InvalidProbe(format!("'{s}': The program is empty")));
        }

        let probe = Self::new(program);
        Ok(match message {
            Some(message) => probe.message(message),
            None => probe,
        })
    }
}

impl Spawner {
    /// Create a new `Spawner` starting from the `ambient` environment list
    pub fn new(ambient: EnvList) -> Self {
        Self {
            ambient,
            appended: Vec::new(),
            env_mode: EnvMode::default(),
        }
    }

    /// Append `entries` to the child environment
    #[must_use]
    pub fn append<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = EnvEntry>,
    {
        self.appended.extend(entries);
        self
    }

    /// Set the [`EnvMode`] used to launch the probes
    #[must_use]
    pub fn env_mode(mut self, env_mode: EnvMode) -> Self {
        self.env_mode = env_mode;
        self
    }

    /// Return the environment list the probes are launched with: `ambient ++ appended`
    pub fn child_env(&self) -> EnvList {
        self.ambient.clone().concat(self.appended.iter().cloned())
    }

    /// Return the [`Launch`] of a single probe
    pub fn launch(&self, probe: &Probe) -> Launch {
        Launch::new(probe.program(), self.child_env()).env_mode(self.env_mode)
    }

    /// Run all `probes` one after another and wait for each of them
    ///
    /// A probe which can't be launched aborts the run with an error. A probe exiting unsuccessfully
    /// is only reported as a warning.
    pub fn run(&self, probes: &[Probe]) -> Result<(), Error> {
        self.run_with_headers(probes, &mut io::stderr())
    }

    /// Like [`Spawner::run`] but write the header lines to `headers`
    ///
    /// A header which can't be written is logged and the probe is run anyway.
    pub fn run_with_headers<W>(&self, probes: &[Probe], headers: &mut W) -> Result<(), Error>
    where
        W: Write,
    {
        let env = self.child_env();
        let duplicates = env.duplicate_keys();
        if duplicates.is_empty() {
            debug!("The child environment has no duplicate keys");
        } else {
            debug!(
                "Duplicate keys in the child environment: {}",
                duplicates.iter().map(|key| key.to_string_lossy()).join(", ")
            );
        }

        for probe in probes {
            if let Err(error) = probe.write_header(headers) {
                warn!(
                    "Failed to write the header of '{}': {error}",
                    probe.program().display()
                );
            }

            let status = self.launch(probe).run()?;
            if !status.success() {
                warn!(
                    "{}",
                    Error::ProcessError(probe.program().display().to_string(), status)
                );
            }
        }

        Ok(())
    }
}

/// Run the probes given in `args` with the duplicated environment
pub fn run(args: SpawnArgs) -> Result<()> {
    let ambient = if args.clear_ambient {
        EnvList::new()
    } else {
        EnvList::ambient()
    };

    let probes = if args.probes.is_empty() {
        vec![Probe::sibling(OBSERVER_BIN)?]
    } else {
        args.probes
    };

    Spawner::new(ambient)
        .append(args.entries)
        .env_mode(args.env_mode)
        .run(&probes)?;

    Ok(())
}
