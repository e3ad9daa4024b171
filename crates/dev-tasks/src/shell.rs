//! Running command strings through the host shell

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

/// Exit status of a shell command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellStatus {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
}

impl ShellStatus {
    /// Status with an exit code
    pub fn exited(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Whether the command exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a command string as a shell command and blocks until it exits
pub trait CommandShell: Send + Sync {
    /// Run `command` with `cwd` as working directory
    fn run(&self, command: &str, cwd: &Path) -> io::Result<ShellStatus>;
}

/// What happens to a command's output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Inherit stdout/stderr, output appears live
    #[default]
    Stream,
    /// Capture output and print it once the command exits
    Buffered,
}

/// The host's command interpreter: `sh -c` (or `cmd /C` on Windows)
#[derive(Debug, Clone, Default)]
pub struct SystemShell {
    mode: OutputMode,
}

impl SystemShell {
    /// Create a shell with the given output mode
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    fn command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl CommandShell for SystemShell {
    fn run(&self, command: &str, cwd: &Path) -> io::Result<ShellStatus> {
        debug!(command, cwd = %cwd.display(), mode = ?self.mode, "spawning shell command");
        let mut cmd = Self::command(command);
        cmd.current_dir(cwd).stdin(Stdio::inherit());

        let status = match self.mode {
            OutputMode::Stream => cmd
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()?,
            OutputMode::Buffered => {
                let output = cmd.output()?;
                io::stdout().write_all(&output.stdout)?;
                io::stderr().write_all(&output.stderr)?;
                output.status
            }
        };

        Ok(ShellStatus {
            code: status.code(),
        })
    }
}
