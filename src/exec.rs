use std::ffi::{OsStr, OsString};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::Error;

/// Run `tool` with `args`, sharing this process's stdio, and wait for it.
pub fn spawn(tool: &OsStr, args: &[OsString]) -> Result<ExitStatus, Error> {
    tracing::debug!(tool = %tool.to_string_lossy(), args = args.len(), "invoking real tool");
    Command::new(tool)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| Error::Spawn {
            tool: tool.to_string_lossy().into_owned(),
            source,
        })
}

/// Exit code this process should report for the real tool's status.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    signal_exit_code(status)
}

#[cfg(unix)]
fn signal_exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|signal| 128 + signal).unwrap_or(1)
}

#[cfg(not(unix))]
fn signal_exit_code(_status: ExitStatus) -> i32 {
    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn test_exit_code_passes_through() {
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
    }

    #[test]
    fn test_signal_maps_to_128_plus_signal() {
        // Raw wait status 9: killed by SIGKILL.
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
    }

    #[test]
    fn test_spawn_failure_is_spawn_error() {
        let err = spawn(OsStr::new("/definitely/not/a/tool"), &[]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_SPAWN);
    }

    #[test]
    fn test_spawn_reports_child_status() {
        let status = spawn(OsStr::new("sh"), &["-c".into(), "exit 4".into()]).unwrap();
        assert_eq!(exit_code(status), 4);
    }
}
