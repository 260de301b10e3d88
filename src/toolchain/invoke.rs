//! Synchronous external tool invocation
//!
//! Every external process - compile, link, data preparation - runs through
//! `run_tool`. Stdout and stderr are inherited so compiler diagnostics
//! stream into the build's own output in real time, regardless of whether
//! the invocation ultimately succeeds.
//!
//! The exit status is returned to the caller rather than inspected here:
//! compile failures are aggregated by the coordinator, link and data-prep
//! failures abort the build at their call sites.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::info;

/// Run an external tool to completion, streaming its output.
///
/// `label` stands in for the (long) program path in the logged command
/// line. `cwd` overrides the working directory when the tool expects to
/// run inside the project root (the data-preparation command does).
pub fn run_tool(
    label: &str,
    program: &Path,
    args: &[String],
    cwd: Option<&Path>,
) -> io::Result<ExitStatus> {
    info!("{} {}", label, args.join(" "));

    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command.status()
}

/// Describe an exit status for failure reporting
pub fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn test_run_tool_success() {
        let status = run_tool("true", Path::new("/bin/true"), &[], None).unwrap();
        assert!(status.success());
    }

    #[test]
    #[cfg(unix)]
    fn test_run_tool_failure_status() {
        let status = run_tool("false", Path::new("/bin/false"), &[], None).unwrap();
        assert!(!status.success());
        assert_eq!(describe_status(status), "exit code 1");
    }

    #[test]
    fn test_run_tool_missing_program() {
        let result = run_tool("missing", Path::new("/nonexistent/tool"), &[], None);
        assert!(result.is_err());
    }
}
