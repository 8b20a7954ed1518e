//! WPVulnDB Report - WordPress core and plugin vulnerability report
//!
//! Reads the installed core version and active plugins through wp-cli, looks
//! each one up in the WPVulnDB API and tallies what is unknown, out of date
//! or vulnerable.
//!
//! # Example
//!
//! ```no_run
//! use wpvulndb_report::{Auditor, VulnDbClient, WpCli};
//!
//! #[tokio::main]
//! async fn main() -> wpvulndb_report::Result<()> {
//!     let client = VulnDbClient::new("my-api-token")?;
//!     let auditor = Auditor::new(client, WpCli::new("./wp-cli.phar"));
//!     let report = auditor.run(&mut std::io::stdout()).await?;
//!     println!("vulnerable: {}", report.vulnerable_count());
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod client;
pub mod config;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod report;
pub mod response;
pub mod version;

pub use audit::{Auditor, FATAL_EXIT_CODE, exit_code, run_exit_code};
pub use client::{VulnDbClient, VulnDbClientBuilder};
pub use config::{Settings, TokenSources};
pub use error::{Error, Result};
pub use inventory::{Inventory, PluginEntry, WpCli, parse_plugin_line};
pub use report::{Marker, Report, Tally};
pub use response::{ItemData, References, VulnId, VulnResponse, VulnerabilityRecord};
pub use version::compare_versions;
