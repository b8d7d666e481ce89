//! External process helpers

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};

use tokio::process::Command;

/// A command line run through the platform shell
pub fn shell(command_line: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command_line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line);
        cmd
    }
}

/// Run a program to completion, capturing its output
///
/// A non-zero exit is reported as an error carrying the exit status and
/// captured stderr.
pub async fn run_tool<I, S>(program: &OsStr, args: I, cwd: Option<&Path>) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    tracing::debug!("Running {:?}", cmd.as_std());

    let output = cmd.output().await.map_err(|e| e.to_string())?;
    if output.status.success() {
        Ok(output)
    } else {
        Err(describe_failure(&output))
    }
}

/// Exit status plus trimmed stderr of a failed process
pub fn describe_failure(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        output.status.to_string()
    } else {
        format!("{}:\n{stderr}", output.status)
    }
}
