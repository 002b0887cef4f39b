//! Post-render steps that shell out to the target language toolchain.

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::codec::Codec;
use crate::error::{Error, Result};

/// Run the codec's formatter in `output_root`.
pub fn run_formatter(codec: &dyn Codec, output_root: &Path) -> Result<()> {
    let (program, args) = codec.formatter();
    run_command(program, args, output_root)
}

/// Run `program` to completion in `dir`, failing on a non-zero exit.
///
/// Output is captured; stderr is carried verbatim in the error.
pub fn run_command(program: &str, args: &[&str], dir: &Path) -> Result<()> {
    let command = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(command = %command, dir = %dir.display(), "Running post-processing command.");

    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|err| Error::Subprocess {
            command: command.clone(),
            status: "not started".into(),
            stderr: err.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        warn!(command = %command, status = %output.status, "Post-processing command failed.");
        return Err(Error::Subprocess {
            command,
            status: output.status.to_string(),
            stderr,
        });
    }
    Ok(())
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_success_runs_in_dir() {
        let temp = TempDir::new().unwrap();
        run_command("sh", &["-c", "touch formatted"], temp.path()).unwrap();
        assert!(temp.path().join("formatted").exists());
    }

    #[test]
    fn test_failure_surfaces_stderr() {
        let temp = TempDir::new().unwrap();
        let err = run_command("sh", &["-c", "echo 'bad input' >&2; exit 3"], temp.path())
            .unwrap_err();
        assert!(matches!(
            &err,
            Error::Subprocess { command, stderr, .. }
                if command.starts_with("sh -c") && stderr == "bad input\n"
        ));
    }

    #[test]
    fn test_missing_program() {
        let temp = TempDir::new().unwrap();
        let err = run_command("clientgen-no-such-formatter", &[], temp.path()).unwrap_err();
        assert!(matches!(err, Error::Subprocess { ref status, .. } if status == "not started"));
    }
}
