use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::WelcomeConfig;
use crate::error::Result;
use crate::version_check::{self, VersionCheck};

/// Shown when the local version cannot be determined.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Shown when the port variable is unset.
pub const DEFAULT_PORT: &str = "8080";

/// Resolved dynamic values for one banner invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub local_version: String,
    pub version_check_text: String,
    pub notifications_enabled: bool,
    pub listening_port: String,
    /// Credential variables that are unset or empty while notifications are
    /// enabled. Always empty when notifications are disabled.
    pub notification_missing_vars: Vec<String>,
}

impl StatusRecord {
    /// `Version: X`, followed by the check text when there is one.
    pub fn version_line(&self) -> String {
        if self.version_check_text.is_empty() {
            format!("Version: {}", self.local_version)
        } else {
            format!("Version: {} {}", self.local_version, self.version_check_text)
        }
    }

    pub fn access_url(&self) -> String {
        format!("http://localhost:{}", self.listening_port)
    }

    pub fn notification_badge(&self) -> NotificationBadge {
        NotificationBadge::for_state(self.notifications_enabled)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Color hint for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Muted,
}

/// Icon, label and tone for the notification line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationBadge {
    pub icon: &'static str,
    pub label: &'static str,
    pub tone: Tone,
}

impl NotificationBadge {
    pub fn for_state(enabled: bool) -> Self {
        if enabled {
            Self { icon: "🔔", label: "ENABLED", tone: Tone::Positive }
        } else {
            Self { icon: "📵", label: "DISABLED", tone: Tone::Muted }
        }
    }
}

/// Everything a single lookup pass needs, with the full version-check
/// outcome kept for diagnostics.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: StatusRecord,
    pub version_check: VersionCheck,
}

/// Gathers the banner's dynamic values from the filesystem and environment.
///
/// Every lookup is total: failures degrade to a fixed fallback value.
#[derive(Debug, Clone)]
pub struct StatusResolver {
    local_version_path: PathBuf,
    version_check_script_path: PathBuf,
    version_check_timeout: Duration,
    notifications_var: String,
    port_var: String,
    credential_vars: Vec<String>,
}

impl StatusResolver {
    pub fn new(config: &WelcomeConfig) -> Self {
        Self {
            local_version_path: config.paths.local_version_file.clone(),
            version_check_script_path: config.paths.version_check_script.clone(),
            version_check_timeout: config.version_check.timeout(),
            notifications_var: config.env.notifications.clone(),
            port_var: config.env.port.clone(),
            credential_vars: config.env.credentials.clone(),
        }
    }

    pub fn local_version_path(&self) -> &Path {
        &self.local_version_path
    }

    pub fn version_check_script_path(&self) -> &Path {
        &self.version_check_script_path
    }

    pub fn port_var(&self) -> &str {
        &self.port_var
    }

    /// Run all lookups concurrently and assemble the record once every one
    /// has finished.
    pub async fn resolve(&self) -> StatusRecord {
        self.resolve_detailed().await.record
    }

    pub async fn resolve_detailed(&self) -> Resolution {
        let (local_version, version_check, notifications_enabled, listening_port) = tokio::join!(
            async { resolve_local_version(&self.local_version_path) },
            version_check::run(&self.version_check_script_path, self.version_check_timeout),
            async { resolve_notification_flag(&self.notifications_var) },
            async { resolve_port(&self.port_var) },
        );

        let notification_missing_vars = if notifications_enabled {
            missing_vars(&self.credential_vars)
        } else {
            Vec::new()
        };
        if !notification_missing_vars.is_empty() {
            debug!(
                missing = ?notification_missing_vars,
                "Notifications enabled but credentials are missing"
            );
        }

        let record = StatusRecord {
            local_version,
            version_check_text: version_check.text().to_string(),
            notifications_enabled,
            listening_port,
            notification_missing_vars,
        };
        debug!(?record, "Resolved status");

        Resolution { record, version_check }
    }
}

/// Read the local version file, trimmed, first line only.
///
/// Falls back to [`UNKNOWN_VERSION`] when the file is absent, unreadable or
/// blank.
pub fn resolve_local_version(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let version = content.trim().lines().next().unwrap_or("").trim();
            if version.is_empty() {
                debug!(path = %path.display(), "Version file is blank");
                UNKNOWN_VERSION.to_string()
            } else {
                version.to_string()
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Version file not found");
            UNKNOWN_VERSION.to_string()
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Failed to read version file");
            UNKNOWN_VERSION.to_string()
        }
    }
}

/// Run the version-check script and keep only its text.
pub async fn resolve_version_check(path: &Path, timeout: Duration) -> String {
    version_check::run(path, timeout).await.into_text()
}

/// True only when `env_var` is set to `true`, case-insensitively.
pub fn resolve_notification_flag(env_var: &str) -> bool {
    notification_flag_from(env_value(env_var).as_deref())
}

pub fn notification_flag_from(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.to_lowercase() == "true")
}

/// The raw port value, or [`DEFAULT_PORT`] when unset. Not validated.
pub fn resolve_port(env_var: &str) -> String {
    port_from(env_value(env_var).as_deref())
}

pub fn port_from(value: Option<&str>) -> String {
    value.unwrap_or(DEFAULT_PORT).to_string()
}

/// Value of a set variable, non-UTF-8 bytes replaced rather than treated
/// as unset.
fn env_value(name: &str) -> Option<String> {
    std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
}

fn missing_vars(names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|name| std::env::var_os(name.as_str()).map_or(true, |v| v.is_empty()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_is_case_insensitive_true() {
        assert!(notification_flag_from(Some("true")));
        assert!(notification_flag_from(Some("TRUE")));
        assert!(notification_flag_from(Some("True")));
    }

    #[test]
    fn flag_rejects_everything_else() {
        assert!(!notification_flag_from(Some("1")));
        assert!(!notification_flag_from(Some("")));
        assert!(!notification_flag_from(Some("yes")));
        assert!(!notification_flag_from(Some(" true")));
        assert!(!notification_flag_from(None));
    }

    #[test]
    fn port_falls_back_only_when_unset() {
        assert_eq!(port_from(None), "8080");
        assert_eq!(port_from(Some("abc")), "abc");
        assert_eq!(port_from(Some("9000")), "9000");
        assert_eq!(port_from(Some("")), "");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_port_is_kept_not_defaulted() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let var = "JDCODE_STATUS_TEST_RAW_PORT";
        std::env::set_var(var, OsStr::from_bytes(b"80\xff80"));
        assert_eq!(resolve_port(var), "80\u{fffd}80");
        std::env::remove_var(var);
    }

    #[test]
    fn badge_follows_flag() {
        let on = NotificationBadge::for_state(true);
        assert_eq!(on.label, "ENABLED");
        assert_eq!(on.tone, Tone::Positive);
        let off = NotificationBadge::for_state(false);
        assert_eq!(off.label, "DISABLED");
        assert_eq!(off.tone, Tone::Muted);
    }

    #[test]
    fn version_line_appends_check_text() {
        let mut record = StatusRecord {
            local_version: "1.4.0".into(),
            version_check_text: String::new(),
            notifications_enabled: false,
            listening_port: "8080".into(),
            notification_missing_vars: Vec::new(),
        };
        assert_eq!(record.version_line(), "Version: 1.4.0");
        record.version_check_text = "(update available)".into();
        assert_eq!(record.version_line(), "Version: 1.4.0 (update available)");
        assert_eq!(record.access_url(), "http://localhost:8080");
    }

    #[test]
    fn version_file_first_line_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("VERSION");
        std::fs::write(&path, "\n  3.1.0  \nbuild 42\n").unwrap();
        assert_eq!(resolve_local_version(&path), "3.1.0");
    }

    #[test]
    fn blank_version_file_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("VERSION");
        std::fs::write(&path, "   \n\t\n").unwrap();
        assert_eq!(resolve_local_version(&path), UNKNOWN_VERSION);
    }

    #[test]
    fn unreadable_version_path_is_unknown() {
        // A directory cannot be read as a string
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_local_version(dir.path()), UNKNOWN_VERSION);
    }

    #[test]
    fn missing_vars_lists_unset_and_empty() {
        std::env::set_var("JDCODE_STATUS_TEST_TOKEN", "123:abc");
        std::env::set_var("JDCODE_STATUS_TEST_CHAT", "");
        let missing = missing_vars(&[
            "JDCODE_STATUS_TEST_TOKEN".into(),
            "JDCODE_STATUS_TEST_CHAT".into(),
            "JDCODE_STATUS_TEST_NEVER_SET".into(),
        ]);
        assert_eq!(
            missing,
            vec!["JDCODE_STATUS_TEST_CHAT", "JDCODE_STATUS_TEST_NEVER_SET"]
        );
        std::env::remove_var("JDCODE_STATUS_TEST_TOKEN");
        std::env::remove_var("JDCODE_STATUS_TEST_CHAT");
    }
}
