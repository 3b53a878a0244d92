//! relpack core library.
//!
//! Wires release configuration, logging, progress output and exit codes
//! around the `rp-bundle` packager for the `relpack` binary.

pub mod exit_codes;
pub mod logging;
pub mod output;
pub mod release;

pub use exit_codes::ExitCode;
pub use output::{ConsoleEmitter, OutputFormat};
pub use release::{load_release, resolve_base_dir, CliError, Release, ReleaseOverrides};
