//! # Configuration Module
//!
//! Two sources of configuration:
//!
//! - [`AppConfig`]: a YAML file describing the server address, the built-in guards
//!   and a route list, used by the `routewise serve` command
//! - [`RuntimeConfig`]: environment variables tuning the coroutine runtime
//!
//! ## Example
//!
//! ```yaml
//! server:
//!   addr: 127.0.0.1:8080
//!   expose_fault_details: false
//! session:
//!   header: authorization
//!   cookie: session
//!   login_redirect: /login
//!   tokens:
//!     t-alice: alice
//! csrf:
//!   enabled: true
//! routes:
//!   - { method: GET, template: /login, name: login, skip_middleware: [session] }
//!   - { method: GET, template: "/orders/:id", name: order }
//! ```
//!
//! ## Environment Variables
//!
//! ### `ROUTEWISE_STACK_SIZE`
//!
//! Stack size for coroutine handlers, decimal (`16384`) or hexadecimal (`0x4000`).
//! Default: `0x4000` (16 KB).

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use http::Method;
use serde::{Deserialize, Serialize};

use crate::dispatcher::DispatcherConfig;
use crate::router::{RouteOptions, SUPPORTED_METHODS};

/// Default coroutine stack size (16 KB)
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Error loading an [`AppConfig`]
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read
    Io { path: PathBuf, source: std::io::Error },
    /// The file is not valid YAML for this schema
    Parse { path: PathBuf, source: serde_yaml::Error },
    /// A route entry names a method that cannot be registered
    UnsupportedMethod { index: usize, method: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config {}: {source}", path.display())
            }
            ConfigError::UnsupportedMethod { index, method } => {
                write!(f, "routes[{index}]: unsupported method '{method}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::UnsupportedMethod { .. } => None,
        }
    }
}

fn default_addr() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default)]
    pub expose_fault_details: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            expose_fault_details: false,
        }
    }
}

fn default_session_header() -> String {
    "authorization".to_string()
}

fn default_session_cookie() -> Option<String> {
    Some("session".to_string())
}

/// Enables the session guard when present
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    #[serde(default = "default_session_header")]
    pub header: String,
    #[serde(default = "default_session_cookie")]
    pub cookie: Option<String>,
    /// Accepted token → subject
    #[serde(default)]
    pub tokens: HashMap<String, String>,
    /// Redirect rejected requests here instead of answering 401
    #[serde(default)]
    pub login_redirect: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_csrf_cookie() -> String {
    "csrf_token".to_string()
}

fn default_csrf_header() -> String {
    "x-csrf-token".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsrfSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_csrf_cookie")]
    pub cookie: String,
    #[serde(default = "default_csrf_header")]
    pub header: String,
}

/// One route served by the echo handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    pub method: String,
    pub template: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub skip_middleware: Vec<String>,
}

impl RouteEntry {
    /// Parsed method; `None` when it is not one of GET, POST, PUT, DELETE
    #[must_use]
    pub fn method(&self) -> Option<Method> {
        let method = self.method.to_ascii_uppercase();
        SUPPORTED_METHODS
            .iter()
            .find(|m| m.as_str() == method)
            .cloned()
    }

    #[must_use]
    pub fn options(&self) -> RouteOptions {
        RouteOptions {
            name: self.name.clone(),
            skip_middleware: self.skip_middleware.clone(),
        }
    }
}

/// Application configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub session: Option<SessionSection>,
    #[serde(default)]
    pub csrf: Option<CsrfSection>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl AppConfig {
    /// Load and validate a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is missing, malformed, or names a method
    /// the router cannot register.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (index, route) in self.routes.iter().enumerate() {
            if route.method().is_none() {
                return Err(ConfigError::UnsupportedMethod {
                    index,
                    method: route.method.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            expose_fault_details: self.server.expose_fault_details,
        }
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_value(env::var("ROUTEWISE_STACK_SIZE").ok().as_deref())
    }

    pub(crate) fn from_value(value: Option<&str>) -> Self {
        let stack_size = match value.map(str::trim) {
            Some(val) => match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
                Some(hex) => usize::from_str_radix(hex, 16).unwrap_or(DEFAULT_STACK_SIZE),
                None => val.parse().unwrap_or(DEFAULT_STACK_SIZE),
            },
            None => DEFAULT_STACK_SIZE,
        };
        RuntimeConfig { stack_size }
    }

    /// Apply to the global `may` scheduler; call before starting the server
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}
