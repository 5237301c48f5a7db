use std::process::{Command, Stdio};

/// Outcome of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub success: bool,
    /// stdout followed by stderr
    pub combined: String,
}

/// Run a command and capture stdout and stderr together.
///
/// A program that cannot be started yields an unsuccessful output carrying
/// the OS error, so callers handle one failure shape.
pub fn run_combined(program: &str, args: &[String]) -> ProcessOutput {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output();

    match output {
        Ok(output) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            if !output.status.success() && combined.trim().is_empty() {
                combined = format!("{program} exited with {}", output.status);
            }
            ProcessOutput {
                success: output.status.success(),
                combined,
            }
        }
        Err(e) => ProcessOutput {
            success: false,
            combined: format!("Failed to execute {program}: {e}"),
        },
    }
}

/// Run a command silently, returning success/failure
pub fn run_quiet(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Check if a command exists
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Check if a local account exists
pub fn user_exists(name: &str) -> bool {
    run_quiet("id", &["-u", name])
}
