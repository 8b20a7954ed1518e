//! Installed software inventory via wp-cli

use crate::error::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::process::Command;

/// A plugin line is exactly two whitespace-separated tokens: slug and version
static PLUGIN_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+(\S+)$").expect("valid plugin line regex"));

/// Plugin statuses that count as active; `active-network` is multisite-wide
const ACTIVE_STATUSES: &[&str] = &["active", "active-network"];

/// One row of `wp plugin list --format=json`
#[derive(Debug, Deserialize)]
struct PluginRow {
    name: String,
    status: String,
    #[serde(default)]
    version: Option<String>,
}

/// An active plugin as reported by the inventory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
    pub name: String,
    pub version: String,
}

/// Parse one plugin line, `None` if it is not `<slug> <version>`
pub fn parse_plugin_line(line: &str) -> Option<PluginEntry> {
    let caps = PLUGIN_LINE.captures(line.trim())?;
    Some(PluginEntry {
        name: caps[1].to_string(),
        version: caps[2].to_string(),
    })
}

/// Source of the installed core version and active plugins
pub trait Inventory {
    /// Installed WordPress core version
    fn core_version(&self) -> impl Future<Output = Result<String>>;

    /// One line per active plugin, expected to read `<slug> <version>`
    fn active_plugins(&self) -> impl Future<Output = Result<Vec<String>>>;
}

/// Inventory backed by the wp-cli binary
#[derive(Debug, Clone)]
pub struct WpCli {
    binary: PathBuf,
}

impl WpCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::Inventory(format!("could not run {}: {e}", self.binary.display())))?;

        if !output.status.success() {
            return Err(Error::Inventory(format!(
                "{} {} exited with {}: {}",
                self.binary.display(),
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Inventory for WpCli {
    async fn core_version(&self) -> Result<String> {
        Ok(self.run(&["core", "version"]).await?.trim().to_string())
    }

    async fn active_plugins(&self) -> Result<Vec<String>> {
        let json = self
            .run(&[
                "plugin",
                "list",
                "--fields=name,status,version",
                "--format=json",
            ])
            .await?;
        plugin_rows(&json)
    }
}

/// Turn `wp plugin list` JSON into `<name> <version>` lines for active plugins
fn plugin_rows(json: &str) -> Result<Vec<String>> {
    let rows: Vec<PluginRow> = serde_json::from_str(json.trim())
        .map_err(|e| Error::Inventory(format!("unreadable plugin list: {e}")))?;

    Ok(rows
        .into_iter()
        .filter(|row| ACTIVE_STATUSES.contains(&row.status.as_str()))
        .map(|row| format!("{} {}", row.name, row.version.unwrap_or_default()))
        .collect())
}
