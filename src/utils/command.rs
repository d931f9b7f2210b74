//! External command execution.
//!
//! Builder commands come from `[build.commands]` as argv templates; this
//! module fills their placeholders and runs them from the project root.

use crate::log;
use anyhow::{Context, Result, bail};
use std::{
    path::Path,
    process::{Command, Output},
};

/// Replace `{name}` placeholders in every argument.
///
/// Unknown placeholders are left as is.
pub fn expand(argv: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    argv.iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |arg, (name, value)| {
                arg.replace(&format!("{{{name}}}"), value)
            })
        })
        .collect()
}

/// Execute a command and capture its output.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn exec(root: Option<&Path>, argv: &[String]) -> Result<Output> {
    let (name, mut command) = prepare(root, argv)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    log_output(&name, &output)?;
    Ok(output)
}

/// Prepare a Command from an argv.
fn prepare(root: Option<&Path>, argv: &[String]) -> Result<(String, Command)> {
    let (program, args) = argv.split_first().context("Empty command")?;

    let mut command = Command::new(program);
    command.args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((program.clone(), command))
}

/// Log command output; on failure, surface stderr in the error.
fn log_output(name: &str, output: &Output) -> Result<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        let stderr = stderr.trim();
        if stderr.is_empty() {
            bail!("Command `{name}` failed with {}", output.status);
        }
        bail!("Command `{name}` failed with {}\n{stderr}", output.status);
    }

    for line in stdout.lines().chain(stderr.lines()) {
        if !line.trim().is_empty() {
            log!(name; "{line}");
        }
    }
    Ok(())
}
