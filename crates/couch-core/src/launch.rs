//! Running an entry's program while the launcher is suspended.

use std::process::{Command, Stdio};

use crate::error::{CouchError, Result};

/// Runs a program to completion.
pub trait Launcher {
    /// Spawn `argv` and block until it exits. Returns the exit code, or
    /// `None` if the child was terminated by a signal.
    fn launch(&mut self, argv: &[String]) -> Result<Option<i32>>;
}

/// Launches real child processes with inherited stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&mut self, argv: &[String]) -> Result<Option<i32>> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| CouchError::Launch("empty command".into()))?;
        log::info!("Launching: {}", argv.join(" "));
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| CouchError::Launch(format!("failed to spawn {program}: {e}")))?;
        Ok(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reports_exit_code() {
        let mut l = ProcessLauncher;
        assert_eq!(l.launch(&argv(&["true"])).unwrap(), Some(0));
        assert_eq!(l.launch(&argv(&["sh", "-c", "exit 3"])).unwrap(), Some(3));
    }

    #[test]
    fn empty_argv_is_error() {
        let err = ProcessLauncher.launch(&[]).unwrap_err();
        assert!(matches!(err, CouchError::Launch(_)));
    }

    #[test]
    fn missing_program_is_error() {
        let err = ProcessLauncher
            .launch(&argv(&["/nonexistent/couchmode-test-binary"]))
            .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
