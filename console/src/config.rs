//! Console configuration loaded via OrthoConfig.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_BASE_PATH: &str = "/";
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_TOKEN_FILE: &str = "$HOME/.config/chatbot-console/session.json";
const FALLBACK_TOKEN_FILE: &str = ".chatbot-console-session.json";

/// Raised when a configured value cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// `base_url` is not an absolute http(s) URL.
    #[error("invalid base URL `{value}`: {reason}")]
    BaseUrl {
        /// Configured value.
        value: String,
        /// Parser or scheme complaint.
        reason: String,
    },
}

/// Where the console talks to and where it keeps the credential.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CHATBOT_CONSOLE")]
pub struct ConsoleSettings {
    /// Backend origin.
    #[ortho_config(default = DEFAULT_BASE_URL.to_owned())]
    pub base_url: String,
    /// Application base path announced after a 401.
    #[ortho_config(default = DEFAULT_BASE_PATH.to_owned())]
    pub base_path: String,
    /// Login page path announced after logout.
    #[ortho_config(default = DEFAULT_LOGIN_PATH.to_owned())]
    pub login_path: String,
    /// File holding the persisted credential slot.
    pub token_file: Option<PathBuf>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            base_path: DEFAULT_BASE_PATH.to_owned(),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            token_file: None,
        }
    }
}

impl ConsoleSettings {
    /// Parsed backend origin.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BaseUrl`] when the value does not parse or
    /// uses a scheme other than `http`/`https`.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.base_url.as_str();
        let url = Url::parse(raw).map_err(|error| SettingsError::BaseUrl {
            value: raw.to_owned(),
            reason: error.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::BaseUrl {
                value: raw.to_owned(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        Ok(url)
    }

    /// Redirect target after the backend rejects the credential.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Redirect target after logout.
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Credential file, with `~` and environment variables expanded.
    ///
    /// A configured path naming an unset variable is used verbatim.
    pub fn token_file(&self) -> PathBuf {
        match &self.token_file {
            Some(path) => {
                let raw = path.to_string_lossy();
                expand(raw.as_ref()).unwrap_or_else(|| path.clone())
            }
            None => default_token_file(),
        }
    }
}

fn expand(raw: &str) -> Option<PathBuf> {
    shellexpand::full(raw)
        .ok()
        .map(|path| PathBuf::from(path.into_owned()))
}

fn default_token_file() -> PathBuf {
    expand(DEFAULT_TOKEN_FILE).unwrap_or_else(|| PathBuf::from(FALLBACK_TOKEN_FILE))
}
