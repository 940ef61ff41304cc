//! Local environment snapshot sent along with every generation request.
//!
//! The snapshot is a block of `LABEL: value` lines built once at startup.
//! Every probe is best-effort: a probe that fails is left out of the block
//! and never aborts the gathering.

use crate::providers::{EnvReader, ProcessRunner, SystemEnv, SystemProcessRunner};
use anyhow::{anyhow, Result};
use std::process::Output;
use tracing::debug;

/// Collects the context snapshot from injectable host providers.
pub struct ContextGatherer<'a> {
    runner: &'a dyn ProcessRunner,
    env: &'a dyn EnvReader,
}

impl<'a> ContextGatherer<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, env: &'a dyn EnvReader) -> Self {
        Self { runner, env }
    }

    /// Runs every probe in order and joins the successful ones.
    pub fn gather(&self) -> String {
        // Line order is part of the prompt and must stay fixed
        let probes = [
            ("PWD", self.working_directory()),
            ("OS", self.os_descriptor()),
            ("PATH", self.path_variable()),
            ("COMMANDS", self.available_commands()),
            ("HISTORY", self.last_history_entry()),
        ];

        let mut snapshot = String::new();
        for (label, probe) in probes {
            match probe {
                Ok(value) => {
                    snapshot.push_str(label);
                    snapshot.push_str(": ");
                    snapshot.push_str(&value);
                    snapshot.push('\n');
                }
                Err(e) => debug!("Context probe {} skipped: {}", label, e),
            }
        }

        snapshot
    }

    fn working_directory(&self) -> Result<String> {
        Ok(self.env.current_dir()?.display().to_string())
    }

    fn os_descriptor(&self) -> Result<String> {
        let output = self.runner.run("uname", &["-a"])?;
        trimmed_stdout(output)
    }

    fn path_variable(&self) -> Result<String> {
        self.env.var("PATH").ok_or_else(|| anyhow!("PATH is not set"))
    }

    fn available_commands(&self) -> Result<String> {
        self.bash("compgen -c | sort | uniq | tr '\\n' ' '")
    }

    fn last_history_entry(&self) -> Result<String> {
        self.bash("history 1")
    }

    fn bash(&self, script: &str) -> Result<String> {
        if !self.runner.program_exists("bash") {
            return Err(anyhow!("bash not found in PATH"));
        }
        let output = self.runner.run("bash", &["-c", script])?;
        trimmed_stdout(output)
    }
}

fn trimmed_stdout(output: Output) -> Result<String> {
    if !output.status.success() {
        return Err(anyhow!(
            "probe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Gathers the snapshot from the real host.
pub fn gather_context() -> String {
    ContextGatherer::new(&SystemProcessRunner, &SystemEnv).gather()
}
