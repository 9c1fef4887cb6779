//! The dupenv library
//!
//! `dupenv` demonstrates what happens when a child process receives an environment list in which a
//! key occurs more than once. The library holds the logic shared by the two binaries:
//!
//! * `dupenv-spawn` builds the environment of the current process with extra `KEY=VALUE` entries
//!   appended and launches probe programs with this exact list (see [`spawner`] and [`launch`]).
//! * `dupenv-print` prints every value bound to a key in its own environment (see [`observer`]).
//!
//! Only unix platforms are supported.

pub mod env;
pub mod error;
pub mod launch;
pub mod logging;
pub mod observer;
pub mod spawner;

/// The environment variables dupenv itself reads
pub mod envs {
    /// Color output: `never`, `always` or `auto`
    pub const DUPENV_COLOR: &str = "DUPENV_COLOR";
    /// The `--env-mode` of `dupenv-spawn`
    pub const DUPENV_ENV_MODE: &str = "DUPENV_ENV_MODE";
    /// The key `dupenv-print` reports
    pub const DUPENV_KEY: &str = "DUPENV_KEY";
    /// The log level filter in `env_logger` syntax
    pub const DUPENV_LOG: &str = "DUPENV_LOG";
    /// The probe `dupenv-spawn` runs if no probe is given on the command-line
    pub const DUPENV_PROBE: &str = "DUPENV_PROBE";

    /// The color setting of cargo, used if `DUPENV_COLOR` is not set
    pub const CARGO_TERM_COLOR: &str = "CARGO_TERM_COLOR";
}
