//! Shared provider traits for dependency injection.
//!
//! Everything that reads from the host (child processes, environment
//! variables, the working directory) goes through these traits so the
//! context gatherer and the configuration layer can be tested with fakes.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::process::{Command, Output};

/// Trait for running system processes.
///
/// This abstraction enables testing without spawning real processes.
pub trait ProcessRunner: Send + Sync {
    /// Executes a command and returns its output.
    fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Checks if a program exists in PATH.
    fn program_exists(&self, program: &str) -> bool;
}

/// Default process runner using `std::process::Command`.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        Ok(cmd.output()?)
    }

    fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Read-only access to process-level environment facts.
///
/// # Example
///
/// ```
/// use conjure::providers::{EnvReader, SystemEnv};
///
/// let env = SystemEnv;
/// assert!(env.current_dir().is_ok());
/// ```
pub trait EnvReader: Send + Sync {
    /// Returns the value of an environment variable, or `None` if it is unset.
    fn var(&self, key: &str) -> Option<String>;

    /// Returns the current working directory.
    fn current_dir(&self) -> Result<PathBuf>;
}

/// Environment reader backed by the real process environment.
pub struct SystemEnv;

impl EnvReader for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().map_err(|e| anyhow!("Could not read working directory: {}", e))
    }
}
