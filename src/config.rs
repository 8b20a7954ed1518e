//! Run settings: API token, endpoints and the wp-cli binary

use crate::error::{Error, Result};
use ini::Ini;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "WPVULNDB_TOKEN";

/// Environment variable overriding the API base URL
pub const API_BASE_ENV: &str = "WPVULNDB_API_BASE";

/// Environment variable overriding the wp-cli binary
pub const WP_CLI_ENV: &str = "WPVULNDB_WP_CLI";

/// Settings file looked up in the working and home directories
pub const SETTINGS_FILE: &str = ".wpvulndb.ini";

/// Key holding the token in the settings file
const TOKEN_KEY: &str = "token";

/// WPVulnDB API base URL
pub const DEFAULT_API_BASE: &str = "https://wpvulndb.com/api/v3";

/// wp-cli binary, relative to the WordPress root
pub const DEFAULT_WP_CLI: &str = "./wp-cli.phar";

/// Every place a token may come from, in priority order
#[derive(Debug, Clone, Default)]
pub struct TokenSources {
    /// `-t <token>`
    pub short_flag: Option<String>,
    /// `--token <token>`
    pub long_flag: Option<String>,
    /// Value of [`TOKEN_ENV`]
    pub env: Option<String>,
    /// Settings files, read in order
    pub files: Vec<PathBuf>,
}

impl TokenSources {
    /// Collect sources from the command line, the environment and the
    /// default settings file locations
    pub fn from_env(short_flag: Option<String>, long_flag: Option<String>) -> Self {
        let mut files = vec![Path::new(".").join(SETTINGS_FILE)];
        if let Some(home) = dirs::home_dir() {
            files.push(home.join(SETTINGS_FILE));
        }

        Self {
            short_flag,
            long_flag,
            env: std::env::var(TOKEN_ENV).ok(),
            files,
        }
    }

    /// Pick the token
    ///
    /// Flags win over the environment, which wins over settings files. All
    /// settings files are read and the last one defining `token` wins.
    pub fn resolve(&self) -> Result<String> {
        let direct = [&self.short_flag, &self.long_flag, &self.env]
            .into_iter()
            .flatten()
            .map(|t| t.trim())
            .find(|t| !t.is_empty());
        if let Some(token) = direct {
            return Ok(token.to_string());
        }

        let mut token = None;
        for file in &self.files {
            if !file.is_file() {
                continue;
            }
            debug!(file = %file.display(), "reading settings");
            match read_token_file(file) {
                Ok(Some(found)) => token = Some(found),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "ignoring settings file"),
            }
        }

        token.ok_or_else(|| Error::MissingToken {
            env: TOKEN_ENV,
            files: self
                .files
                .iter()
                .map(|f| f.display().to_string())
                .collect(),
        })
    }
}

/// Read the `token` key from an INI file, in any section
fn read_token_file(path: &Path) -> Result<Option<String>> {
    let ini = Ini::load_from_file(path).map_err(|e| Error::Settings {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let token = ini
        .general_section()
        .get(TOKEN_KEY)
        .or_else(|| ini.iter().find_map(|(_, props)| props.get(TOKEN_KEY)))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(token)
}

/// Resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub debug: bool,
    pub api_base: String,
    pub wp_cli: PathBuf,
}

impl Settings {
    /// Resolve settings from command line values and the environment
    pub fn resolve(
        short_token: Option<String>,
        long_token: Option<String>,
        debug: bool,
    ) -> Result<Self> {
        let token = TokenSources::from_env(short_token, long_token).resolve()?;

        Ok(Self {
            token,
            debug,
            api_base: std::env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            wp_cli: std::env::var_os(WP_CLI_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WP_CLI)),
        })
    }
}
