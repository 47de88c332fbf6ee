//! Subprocess execution for backend package tools.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

/// A command could not be launched at all (binary missing, permissions).
#[derive(Debug, Error)]
#[error("failed to spawn `{command}`")]
pub struct SpawnError {
    pub command: String,
    #[source]
    pub source: std::io::Error,
}

/// Captured result of one external tool invocation.
///
/// The gateway never interprets exit codes; each backend decides what
/// success means for its tool.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit status, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Exit status with killed-by-signal collapsed to -1.
    pub fn code(&self) -> i32 {
        self.status.unwrap_or(-1)
    }
}

/// Builder for synchronous subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Execute the command, blocking until it exits.
    ///
    /// The child inherits the environment. Stdout and stderr are captured;
    /// there is no timeout and no retry.
    pub fn exec(&self) -> Result<ProcessOutput, SpawnError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SpawnError {
                command: self.display_command(),
                source,
            })?;

        Ok(ProcessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Display the command for log and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_captures_stdout() {
        let output = ProcessBuilder::new("echo").arg("hello").exec().unwrap();

        assert_eq!(output.code(), 0);
        assert!(output.stdout.contains("hello"));
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn test_exec_missing_binary_is_spawn_error() {
        let err = ProcessBuilder::new("/no/such/binary-here")
            .arg("-x")
            .exec()
            .unwrap_err();

        assert!(err.to_string().contains("/no/such/binary-here"));
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("/usr/sbin/installp").args(["-acYg", "-d", "/tmp/pkg"]);

        assert_eq!(pb.display_command(), "/usr/sbin/installp -acYg -d /tmp/pkg");
    }
}
