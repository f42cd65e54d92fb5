// Subprocess execution for the MySQL client tools
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::errors::{BackupError, Result};

/// A single external program call. Arguments are passed straight to the
/// program (no shell), so credentials never need escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub stdin: Option<Vec<u8>>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdin(mut self, input: Vec<u8>) -> Self {
        self.stdin = Some(input);
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.starts_with("--password=") {
                write!(f, " --password=****")?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Raw stdout split on `\n`; dumps may carry bytes that are not UTF-8.
    pub stdout_lines: Vec<Vec<u8>>,
    pub stderr: String,
    pub exit_code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ProcessRunner {
    /// Runs the program to completion and captures its output.
    /// Only a failure to start the program is an `Err`; a non-zero exit is reported in the output.
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs programs on the host with `std::process::Command`.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        debug!("Running: {}", invocation);

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(if invocation.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                BackupError::Config(format!(
                    "Failed to execute {}: {}",
                    invocation.program.display(),
                    e
                ))
            })?;

        // Feed stdin from its own thread so a chatty child cannot fill the stdout pipe and deadlock.
        let writer = match (child.stdin.take(), invocation.stdin.clone()) {
            (Some(mut pipe), Some(input)) => Some(thread::spawn(move || pipe.write_all(&input))),
            _ => None,
        };

        let output = child.wait_with_output()?;

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                // A child that exits early closes its stdin; the exit code tells the real story.
                Ok(Err(e)) => debug!("Writing stdin to {} stopped early: {}", invocation.program.display(), e),
                Err(_) => debug!("stdin writer thread for {} panicked", invocation.program.display()),
            }
        }

        Ok(ProcessOutput {
            stdout_lines: split_lines(&output.stdout),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Splits like `str::lines`, without requiring UTF-8.
fn split_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    if bytes.is_empty() {
        return Vec::new();
    }
    bytes
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect()
}
