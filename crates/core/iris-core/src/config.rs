//! Configuration management and environment variable loading
//!
//! Everything the client reads from the environment is collected once into a
//! [`Settings`] value at start-up. After that the settings are only passed
//! around by reference; nothing re-reads the environment.

use crate::roles;
use crate::{IrisError, Result};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Default path segment under the base URL
pub const DEFAULT_API_BASE_PATH: &str = "rag";
/// Default banner title
pub const DEFAULT_APP_TITLE: &str = "AI Knowledge Assistant";
/// Default banner icon
pub const DEFAULT_APP_ICON: &str = "🤖";
/// Role used when none is configured
pub const DEFAULT_ROLE: &str = "admin";

/// Load environment variables from .env file
///
/// Returns the path of the file that was loaded. A missing file is not an
/// error; the system environment is used as is and `None` is returned.
///
/// # Example
///
/// ```no_run
/// use iris_core::load_env;
///
/// load_env().ok();
/// let api_url = std::env::var("API_URL").unwrap_or_default();
/// ```
pub fn load_env() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(dotenvy::Error::LineParse(line, pos)) => Err(IrisError::config(format!(
            "Failed to parse .env file at line {}, position {}",
            line, pos
        ))),
        Err(dotenvy::Error::Io(_)) => Ok(None),
        Err(e) => Err(IrisError::config(format!(
            "Failed to load .env file: {}",
            e
        ))),
    }
}

/// Load environment variables from a specific file
pub fn load_env_from_path<P: AsRef<Path>>(path: P) -> Result<()> {
    dotenvy::from_path(path.as_ref()).map_err(|e| {
        IrisError::config(format!(
            "Failed to load {} environment file: {}",
            path.as_ref().display(),
            e
        ))
    })
}

fn parse_bool(value: Option<&str>) -> Option<bool> {
    value.and_then(|v| match v.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    })
}

/// Page layout of the chat view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Full terminal width
    #[default]
    Wide,
    /// Narrow column in the middle of the terminal
    Centered,
}

impl FromStr for Layout {
    type Err = IrisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "wide" => Ok(Layout::Wide),
            "centered" => Ok(Layout::Centered),
            _ => Err(IrisError::config(format!(
                "APP_LAYOUT must be either 'wide' or 'centered' (got '{}')",
                s
            ))),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Wide => write!(f, "wide"),
            Layout::Centered => write!(f, "centered"),
        }
    }
}

/// Parse a log level name, accepting the usual aliases
pub fn parse_log_level(s: &str) -> Result<Level> {
    match s.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" => Ok(Level::ERROR),
        other => Err(IrisError::config(format!("Unknown LOG_LEVEL '{}'", other))),
    }
}

/// Resolved chat service endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Streaming query endpoint
    pub chat: String,
    /// Health check endpoint
    pub health: String,
}

impl Endpoints {
    /// Build both endpoint URLs from a base URL and a path segment
    pub fn resolve(base_url: &str, base_path: &str) -> Self {
        Self {
            chat: format!("{}/{}/query", base_url, base_path),
            health: format!("{}/{}/health", base_url, base_path),
        }
    }
}

/// Backend connection settings
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Base URL, e.g. `http://localhost:8000`
    pub api_url: String,
    /// Path segment, e.g. `rag`
    pub api_base_path: String,
    /// Endpoints derived from the two values above
    pub endpoints: Endpoints,
    /// Timeout for the health check
    pub health_timeout: Duration,
    /// Connect timeout and idle timeout between reads of a chat answer
    pub request_timeout: Duration,
}

impl ApiSettings {
    /// Create API settings with default timeouts
    pub fn new(api_url: impl Into<String>, api_base_path: impl Into<String>) -> Self {
        let api_url = api_url.into();
        let api_base_path = api_base_path.into();
        let endpoints = Endpoints::resolve(&api_url, &api_base_path);
        Self {
            api_url,
            api_base_path,
            endpoints,
            health_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_API_BASE_PATH)
    }
}

/// Display settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Banner title
    pub title: String,
    /// Banner icon
    pub icon: String,
    /// Layout of the chat view
    pub layout: Layout,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_APP_TITLE.to_string(),
            icon: DEFAULT_APP_ICON.to_string(),
            layout: Layout::Wide,
        }
    }
}

/// Logging toggles
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Minimum level written by every output
    pub level: Level,
    /// Write to the console (stderr)
    pub console: bool,
    /// Write rotating log files
    pub file: bool,
    /// Directory holding the log files
    pub dir: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            console: true,
            file: true,
            dir: PathBuf::from("logs"),
        }
    }
}

/// Chat session behaviour
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Role selected when a session starts
    pub default_role: String,
    /// Clear the transcript whenever the role changes
    pub reset_on_role_change: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            default_role: DEFAULT_ROLE.to_string(),
            reset_on_role_change: true,
        }
    }
}

/// All process-wide settings, read once at start-up
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Backend connection
    pub api: ApiSettings,
    /// Display
    pub app: AppSettings,
    /// Logging
    pub log: LogSettings,
    /// Session behaviour
    pub chat: ChatSettings,
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    ///
    /// Fails if `APP_LAYOUT` or `LOG_LEVEL` hold an unsupported value or if
    /// `DEFAULT_ROLE` names a role the registry does not know.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let get_bool = |key: &str, default: bool| parse_bool(lookup(key).as_deref()).unwrap_or(default);
        let get_secs = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(default)
        };

        let layout: Layout = get("APP_LAYOUT", "wide").parse()?;
        let level = parse_log_level(&get("LOG_LEVEL", "DEBUG"))?;

        let default_role = get("DEFAULT_ROLE", DEFAULT_ROLE);
        if !roles::is_known_role(&default_role) {
            return Err(IrisError::config(format!(
                "DEFAULT_ROLE '{}' is not a known role",
                default_role
            )));
        }

        let mut api = ApiSettings::new(
            get("API_URL", DEFAULT_API_URL),
            get("API_BASE_PATH", DEFAULT_API_BASE_PATH),
        );
        api.health_timeout = Duration::from_secs(get_secs("HEALTH_TIMEOUT_SECS", 5));
        api.request_timeout = Duration::from_secs(get_secs("REQUEST_TIMEOUT_SECS", 30));

        Ok(Self {
            api,
            app: AppSettings {
                title: get("APP_TITLE", DEFAULT_APP_TITLE),
                icon: get("APP_ICON", DEFAULT_APP_ICON),
                layout,
            },
            log: LogSettings {
                level,
                console: get_bool("CONSOLE_LOGGING", true),
                file: get_bool("FILE_LOGGING", true),
                dir: PathBuf::from(get("LOG_DIR", "logs")),
            },
            chat: ChatSettings {
                default_role,
                reset_on_role_change: get_bool("RESET_ON_ROLE_CHANGE", true),
            },
        })
    }
}
