//! Logging and color setup shared by the `dupenv` binaries
//!
//! Log lines are written to stderr as `TARGET: LEVEL: MESSAGE`, so they interleave with the header
//! lines of `dupenv-spawn` and the output of the probes without ending up on stdout.

use std::io::Write;

use colored::{control, ColoredString, Colorize};
use env_logger::Env;
use log::{warn, Level};

use crate::envs;

/// The variables controlling colors, in order of precedence
const COLOR_VARS: [&str; 2] = [envs::DUPENV_COLOR, envs::CARGO_TERM_COLOR];

/// Return the first of the color variables which is set by `lookup` together with its value
fn color_source<F>(lookup: F) -> Option<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    COLOR_VARS
        .into_iter()
        .find_map(|name| lookup(name).map(|value| (name, value)))
}

/// Force colors on or off for `never` and `always`. `auto` and anything else leave the decision
/// to `colored`
fn apply_color_choice(value: &str) {
    match value {
        "never" => control::set_override(false),
        "always" => control::set_override(true),
        _ => {}
    }
}

fn level_label(level: Level) -> ColoredString {
    match level {
        Level::Error => "Error".red().bold(),
        Level::Warn => "Warn".yellow().bold(),
        Level::Info => "Info".green().bold(),
        Level::Debug => "Debug".blue().bold(),
        Level::Trace => "Trace".cyan().bold(),
    }
}

/// Initialize the logger and configure the usage of colors
///
/// Colors follow `DUPENV_COLOR` and fall back to `CARGO_TERM_COLOR`. The log level is read from
/// `DUPENV_LOG` and defaults to `warn`. Call this first thing in `main`.
pub fn init() {
    let source = color_source(|name| std::env::var(name).ok());
    if let Some((_, value)) = &source {
        apply_color_choice(value);
    }

    let style_var = source.map_or(envs::CARGO_TERM_COLOR, |(name, _)| name);
    env_logger::Builder::from_env(
        Env::default()
            .filter_or(envs::DUPENV_LOG, "warn")
            .write_style(style_var),
    )
    .format(|buf, record| {
        writeln!(
            buf,
            "{}: {:<5}: {}",
            record.target(),
            level_label(record.level()),
            record.args()
        )
    })
    .init();

    if std::env::var_os("RUST_LOG").is_some() && std::env::var_os(envs::DUPENV_LOG).is_none() {
        warn!(
            "dupenv doesn't read RUST_LOG. Set {} instead, for example {}=debug",
            envs::DUPENV_LOG,
            envs::DUPENV_LOG
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::none(&[], None)]
    #[case::dupenv_only(&[("DUPENV_COLOR", "never")], Some(("DUPENV_COLOR", "never")))]
    #[case::cargo_only(&[("CARGO_TERM_COLOR", "always")], Some(("CARGO_TERM_COLOR", "always")))]
    #[case::dupenv_wins(
        &[("CARGO_TERM_COLOR", "always"), ("DUPENV_COLOR", "never")],
        Some(("DUPENV_COLOR", "never"))
    )]
    fn test_color_source(
        #[case] vars: &[(&str, &str)],
        #[case] expected: Option<(&str, &str)>,
    ) {
        let actual = color_source(|name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned())
        });

        assert_eq!(
            actual,
            expected.map(|(name, value)| (name, value.to_owned()))
        );
    }

    #[rstest]
    #[case::error(Level::Error, "Error")]
    #[case::warn(Level::Warn, "Warn")]
    #[case::info(Level::Info, "Info")]
    #[case::debug(Level::Debug, "Debug")]
    #[case::trace(Level::Trace, "Trace")]
    fn test_level_label_text(#[case] level: Level, #[case] expected: &str) {
        assert_eq!(&*level_label(level), expected);
    }
}
