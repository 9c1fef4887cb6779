//! The observer: report every value bound to a key in the received environment
//!
//! A lookup API like `getenv` returns a single value. The observer walks the whole list instead,
//! so a key which occurs `N` times produces exactly `N` report lines in list order.

use std::ffi::{OsStr, OsString};
use std::io::{self, BufWriter, Write};
use std::os::unix::ffi::OsStrExt;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use strum::IntoEnumIterator;

use crate::env::{EnvList, Resolution};
use crate::envs;

/// The default key reported by `dupenv-print`
pub const DEFAULT_KEY: &str = "TMPDIR";

/// The command-line arguments of `dupenv-print`
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Print every value bound to an environment variable, including duplicates",
    long_about = None,
)]
pub struct PrintArgs {
    /// The name of the environment variable to report
    #[arg(env = envs::DUPENV_KEY, default_value = DEFAULT_KEY)]
    pub key: OsString,

    /// Prefix each line with the position of the entry in the environment list
    #[arg(long)]
    pub show_index: bool,

    /// Also print the value a first-wins and a last-wins lookup would see
    #[arg(long)]
    pub resolve: bool,
}

/// Reports the occurrences of a single key
#[derive(Debug, Clone)]
pub struct Observer {
    key: OsString,
    resolve: bool,
    show_index: bool,
}

impl Observer {
    /// Create a new `Observer` for `key`
    pub fn new<K>(key: K) -> Self
    where
        K: Into<OsString>,
    {
        Self {
            key: key.into(),
            resolve: false,
            show_index: false,
        }
    }

    /// Prefix report lines with the entry index
    #[must_use]
    pub fn show_index(mut self, value: bool) -> Self {
        self.show_index = value;
        self
    }

    /// Append the first-wins and last-wins resolution of the key
    #[must_use]
    pub fn resolve(mut self, value: bool) -> Self {
        self.resolve = value;
        self
    }

    /// Write one `KEY = VALUE` line per occurrence of the key in `env` to `writer`
    ///
    /// Returns the number of occurrences. Values are written as raw bytes.
    pub fn report<W>(&self, env: &EnvList, writer: &mut W) -> io::Result<usize>
    where
        W: Write,
    {
        let occurrences = env.occurrences(&self.key);
        for occurrence in &occurrences {
            if self.show_index {
                write!(writer, "[{}] ", occurrence.index)?;
            }
            self.write_binding(writer, occurrence.value)?;
        }

        if self.resolve {
            for resolution in Resolution::iter() {
                write!(writer, "{resolution} wins: ")?;
                match env.resolve(&self.key, resolution) {
                    Some(value) => self.write_binding(writer, value)?,
                    None => writeln!(writer, "{} is unset", self.key.to_string_lossy())?,
                }
            }
        }

        Ok(occurrences.len())
    }

    fn write_binding<W>(&self, writer: &mut W, value: &OsStr) -> io::Result<()>
    where
        W: Write,
    {
        writer.write_all(self.key.as_bytes())?;
        writer.write_all(b" = ")?;
        writer.write_all(value.as_bytes())?;
        writer.write_all(b"\n")
    }
}

impl From<&PrintArgs> for Observer {
    fn from(args: &PrintArgs) -> Self {
        Self::new(args.key.clone())
            .show_index(args.show_index)
            .resolve(args.resolve)
    }
}

/// Report the key given in `args` from the environment of the current process to stdout
pub fn run(args: &PrintArgs) -> Result<()> {
    let env = EnvList::ambient();
    let observer = Observer::from(args);

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    let count = observer
        .report(&env, &mut writer)
        .and_then(|count| writer.flush().map(|()| count))
        .context("Failed to write to stdout")?;

    debug!(
        "Found {count} occurrence(s) of '{}' in {} environment entries",
        args.key.to_string_lossy(),
        env.len()
    );

    Ok(())
}
