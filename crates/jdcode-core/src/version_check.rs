//! Bounded invocation of the optional version-check script.
//!
//! The script's output is opaque descriptive text such as `(up to date)`.
//! Nothing about the invocation is ever fatal: every failure is reported as
//! a [`VersionCheck`] variant whose [`text`](VersionCheck::text) is empty.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tracing::debug;

/// Outcome of running the version-check script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    /// The script ran; trimmed stdout, possibly empty.
    Reported(String),
    /// Nothing exists at the configured path.
    Missing,
    /// The path exists but is not a regular file.
    NotAFile,
    /// Regular file the current user may not execute.
    NotExecutable,
    /// The OS refused to spawn the script or collecting output failed.
    SpawnFailed(String),
    /// The script outlived the timeout and was killed.
    TimedOut(Duration),
}

impl VersionCheck {
    /// Text to show next to the version. Empty unless the script reported.
    pub fn text(&self) -> &str {
        match self {
            Self::Reported(text) => text,
            _ => "",
        }
    }

    /// Whether the script was actually executed to completion.
    pub fn ran(&self) -> bool {
        matches!(self, Self::Reported(_))
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Reported(text) => text,
            _ => String::new(),
        }
    }
}

impl fmt::Display for VersionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reported(text) if text.is_empty() => write!(f, "ran, no output"),
            Self::Reported(text) => write!(f, "ran: {}", text),
            Self::Missing => write!(f, "not installed"),
            Self::NotAFile => write!(f, "not a regular file"),
            Self::NotExecutable => write!(f, "not executable"),
            Self::SpawnFailed(e) => write!(f, "failed to run: {}", e),
            Self::TimedOut(t) => write!(f, "timed out after {}s", t.as_secs()),
        }
    }
}

/// Check the script's preconditions without running it.
fn precheck(path: &Path) -> Option<VersionCheck> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return Some(VersionCheck::Missing),
    };
    if !metadata.is_file() {
        return Some(VersionCheck::NotAFile);
    }

    #[cfg(unix)]
    {
        use nix::unistd::{access, AccessFlags};
        if access(path, AccessFlags::X_OK).is_err() {
            return Some(VersionCheck::NotExecutable);
        }
    }

    None
}

/// Run the script at `path` with no arguments, capturing stdout.
///
/// No subprocess is spawned unless the path is an executable regular file.
/// On timeout the child is killed and `TimedOut` is returned.
pub async fn run(path: &Path, timeout: Duration) -> VersionCheck {
    if let Some(skipped) = precheck(path) {
        debug!(script = %path.display(), reason = %skipped, "Skipping version check");
        return skipped;
    }

    let mut command = tokio::process::Command::new(path);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => {
            if !output.status.success() {
                debug!(
                    script = %path.display(),
                    code = output.status.code(),
                    "Version check exited non-zero"
                );
            }
            let stdout = String::from_utf8_lossy(&output.stdout);
            VersionCheck::Reported(stdout.trim().to_string())
        }
        Ok(Err(e)) => {
            debug!(script = %path.display(), error = %e, "Version check failed to run");
            VersionCheck::SpawnFailed(e.to_string())
        }
        Err(_) => {
            debug!(
                script = %path.display(),
                timeout_secs = timeout.as_secs(),
                "Version check timed out"
            );
            VersionCheck::TimedOut(timeout)
        }
    }
}
