use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default location of the optional config file.
pub const DEFAULT_CONFIG_PATH: &str = "/usr/local/share/jdcode/welcome.toml";

/// Top-level welcome banner configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WelcomeConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub version_check: VersionCheckConfig,
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default)]
    pub banner: BannerConfig,
}

/// Filesystem locations consulted by the resolver.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_local_version_file")]
    pub local_version_file: PathBuf,
    #[serde(default = "default_version_check_script")]
    pub version_check_script: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            local_version_file: default_local_version_file(),
            version_check_script: default_version_check_script(),
        }
    }
}

fn default_local_version_file() -> PathBuf { PathBuf::from("/usr/local/share/VERSION") }
fn default_version_check_script() -> PathBuf { PathBuf::from("/usr/local/bin/check-version.sh") }

#[derive(Debug, Clone, Deserialize)]
pub struct VersionCheckConfig {
    /// Seconds to wait for the check script before giving up (default: 5).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VersionCheckConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl VersionCheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 { 5 }

/// Names of the environment variables read at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvConfig {
    /// Feature flag for Telegram notifications.
    #[serde(default = "default_notifications_var")]
    pub notifications: String,
    /// Port of the web IDE, shown in the access URL.
    #[serde(default = "default_port_var")]
    pub port: String,
    /// Variables that must be non-empty for notifications to actually work.
    #[serde(default = "default_credential_vars")]
    pub credentials: Vec<String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            notifications: default_notifications_var(),
            port: default_port_var(),
            credentials: default_credential_vars(),
        }
    }
}

fn default_notifications_var() -> String { "TELEGRAM_ENABLED".into() }
fn default_port_var() -> String { "PORT".into() }
fn default_credential_vars() -> Vec<String> {
    vec!["TELEGRAM_BOT_TOKEN".into(), "TELEGRAM_CHAT_ID".into()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct BannerConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_cheat_sheet_url")]
    pub cheat_sheet_url: String,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            cheat_sheet_url: default_cheat_sheet_url(),
        }
    }
}

fn default_title() -> String { "Welcome to JDCode".into() }
fn default_cheat_sheet_url() -> String { "https://tmuxcheatsheet.com".into() }

impl WelcomeConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ConfigNotFound(path.display().to_string()),
            _ => Error::ConfigRead {
                path: path.display().to_string(),
                source: e,
            },
        })?;
        Self::parse(&content)
    }

    /// Parse config from a TOML string, with env var expansion.
    pub fn parse(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load an explicitly requested file, or fall back to the default
    /// location.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(explicit, Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Errors are returned only for an explicit path. A missing, unreadable
    /// or malformed `default_path` yields the built-in defaults.
    pub fn load_from(explicit: Option<&Path>, default_path: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::load(default_path) {
            Ok(config) => Ok(config),
            Err(Error::ConfigNotFound(_)) => {
                debug!(path = %default_path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => {
                warn!(path = %default_path.display(), error = %e, "Ignoring default config file");
                Ok(Self::default())
            }
        }
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                // Keep the reference if the variable is not set
                Err(_) => result.push_str(&format!("${{{}}}", var_name)),
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = WelcomeConfig::parse("").unwrap();
        assert_eq!(
            config.paths.local_version_file,
            PathBuf::from("/usr/local/share/VERSION")
        );
        assert_eq!(
            config.paths.version_check_script,
            PathBuf::from("/usr/local/bin/check-version.sh")
        );
        assert_eq!(config.version_check.timeout(), Duration::from_secs(5));
        assert_eq!(config.env.notifications, "TELEGRAM_ENABLED");
        assert_eq!(config.env.port, "PORT");
        assert_eq!(config.env.credentials.len(), 2);
        assert_eq!(config.banner.title, "Welcome to JDCode");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = WelcomeConfig::parse(
            r#"
[paths]
local_version_file = "/opt/jd/VERSION"
"#,
        )
        .unwrap();
        assert_eq!(config.paths.local_version_file, PathBuf::from("/opt/jd/VERSION"));
        assert_eq!(
            config.paths.version_check_script,
            PathBuf::from("/usr/local/bin/check-version.sh")
        );
    }

    #[test]
    fn unset_reference_is_kept() {
        let out = expand_env_vars("port = \"${JDCODE_CFG_TEST_SURELY_UNSET}\"");
        assert_eq!(out, "port = \"${JDCODE_CFG_TEST_SURELY_UNSET}\"");
    }

    #[test]
    fn set_reference_is_expanded() {
        std::env::set_var("JDCODE_CFG_TEST_EXPAND", "WEB_PORT");
        let out = expand_env_vars("port = \"${JDCODE_CFG_TEST_EXPAND}\"");
        assert_eq!(out, "port = \"WEB_PORT\"");
        std::env::remove_var("JDCODE_CFG_TEST_EXPAND");
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = WelcomeConfig::parse("[paths\nbroken").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unreadable_explicit_file_is_read_error() {
        // A directory exists but cannot be read as a file
        let dir = tempfile::tempdir().unwrap();
        let err = WelcomeConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn broken_default_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("welcome.toml");
        std::fs::write(&path, "[banner\ntitle = ").unwrap();

        let config = WelcomeConfig::load_from(None, &path).unwrap();
        assert_eq!(config.banner.title, "Welcome to JDCode");

        let err = WelcomeConfig::load_from(Some(&path), &path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unreadable_default_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = WelcomeConfig::load_from(None, dir.path()).unwrap();
        assert_eq!(config.env.port, "PORT");
    }

    #[test]
    fn missing_explicit_file_is_not_found() {
        let err = WelcomeConfig::load_or_default(Some(Path::new(
            "/nonexistent/jdcode/welcome.toml",
        )))
        .unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }
}
