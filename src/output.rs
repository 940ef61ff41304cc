//! Emission of the accepted command.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Permission bits for a newly created output file.
#[cfg(unix)]
const OUTPUT_FILE_MODE: u32 = 0o644;

/// Writes `command` verbatim, with no trailing newline, either to `target`
/// or to `stdout`.
///
/// An existing target file is truncated.
pub fn emit_command<W: Write>(command: &str, target: Option<&Path>, stdout: &mut W) -> Result<()> {
    match target {
        Some(path) => {
            write_file(path, command)
                .with_context(|| format!("Error writing result to {}", path.display()))?;
            info!("Wrote command to {}", path.display());
        }
        None => {
            stdout
                .write_all(command.as_bytes())
                .and_then(|_| stdout.flush())
                .context("Error writing result to stdout")?;
        }
    }
    Ok(())
}

fn write_file(path: &Path, command: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(OUTPUT_FILE_MODE);
    }

    let mut file = options.open(path)?;
    file.write_all(command.as_bytes())?;
    file.flush()
}
