pub mod config;
pub mod error;
pub mod status;
pub mod version_check;

pub use config::WelcomeConfig;
pub use error::{Error, Result};
pub use status::{NotificationBadge, StatusRecord, StatusResolver, Tone};
pub use version_check::VersionCheck;
