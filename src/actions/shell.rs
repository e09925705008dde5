use anyhow::Context;
use std::process::{Command, Stdio};

/// Starts external commands without waiting for them.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, command_line: &str) -> anyhow::Result<()>;
}

/// Runs command lines through `/bin/sh -c`.
#[derive(Debug, Default)]
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn run(&self, command_line: &str) -> anyhow::Result<()> {
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn `{command_line}`"))?;

        // reap on a side thread so finished commands do not linger as zombies
        let label = command_line.to_string();
        std::thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                tracing::debug!(command = %label, %status, "command exited unsuccessfully")
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(command = %label, ?err, "failed to wait for command"),
        });
        Ok(())
    }
}

/// Check that a command line has balanced quoting.
pub fn validate_command(command_line: &str) -> Result<(), String> {
    let trimmed = command_line.trim();
    if trimmed.is_empty() {
        return Err("empty command".to_string());
    }
    match shlex::split(trimmed) {
        Some(words) if !words.is_empty() => Ok(()),
        Some(_) => Err("empty command".to_string()),
        None => Err(format!("unbalanced quoting in `{trimmed}`")),
    }
}
