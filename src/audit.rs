//! Orchestration of a full report run

use crate::client::VulnDbClient;
use crate::error::Result;
use crate::inventory::{Inventory, parse_plugin_line};
use crate::report::Report;
use crate::response::VulnResponse;
use std::io::Write;
use tracing::{info, warn};

/// Exit code for runs that could not start (no token, bad settings)
pub const FATAL_EXIT_CODE: u8 = 255;

/// Largest vulnerable count that still fits below [`FATAL_EXIT_CODE`]
const MAX_REPORT_EXIT_CODE: u32 = FATAL_EXIT_CODE as u32 - 1;

/// Category name the API uses for plugins
const PLUGINS_CATEGORY: &str = "plugins";

/// Map a vulnerable count onto a process exit code
pub fn exit_code(vulnerable: u32) -> u8 {
    // the clamp keeps the value in u8 range
    vulnerable.min(MAX_REPORT_EXIT_CODE) as u8
}

/// Exit code for a whole run: the vulnerable count, or
/// [`FATAL_EXIT_CODE`] if the run never got to report
pub fn run_exit_code(outcome: &Result<u32>) -> u8 {
    match outcome {
        Ok(vulnerable) => exit_code(*vulnerable),
        Err(_) => FATAL_EXIT_CODE,
    }
}

/// Checks core and active plugins, one query at a time
#[derive(Debug)]
pub struct Auditor<I> {
    client: VulnDbClient,
    inventory: I,
}

impl<I: Inventory> Auditor<I> {
    pub fn new(client: VulnDbClient, inventory: I) -> Self {
        Self { client, inventory }
    }

    /// Query every item, write status lines and the final report to `out`
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<Report> {
        let mut report = Report::new();

        let core = match self.inventory.core_version().await {
            Ok(version) => self.client.request("core", &version, "").await,
            Err(e) => {
                warn!(error = %e, "could not determine core version");
                VulnResponse::new("wordpress", "").with_error(e.to_string())
            }
        };
        core.report(&mut report, out)?;

        let plugins = match self.inventory.active_plugins().await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "could not list active plugins");
                Vec::new()
            }
        };

        for line in &plugins {
            let Some(plugin) = parse_plugin_line(line) else {
                warn!(line = %line.trim(), "skipping malformed plugin line");
                continue;
            };
            self.client
                .request(PLUGINS_CATEGORY, &plugin.name, &plugin.version)
                .await
                .report(&mut report, out)?;
        }

        report.print_report(out)?;
        info!(
            unknown = report.unknown_count(),
            out_of_date = report.out_of_date_count(),
            vulnerable = report.vulnerable_count(),
            "report complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenSources;
    use crate::error::Error;

    #[test]
    fn exit_code_matches_small_counts() {
        assert_eq!(exit_code(0), 0);
        assert_eq!(exit_code(1), 1);
        assert_eq!(exit_code(254), 254);
    }

    #[test]
    fn exit_code_never_reaches_fatal_code() {
        assert_eq!(exit_code(255), 254);
        assert_eq!(exit_code(10_000), 254);
        assert_ne!(exit_code(u32::MAX), FATAL_EXIT_CODE);
    }

    #[test]
    fn missing_token_exits_with_fatal_code() {
        let outcome = TokenSources::default().resolve().map(|_| 0);
        assert!(matches!(outcome, Err(Error::MissingToken { .. })));
        assert_eq!(run_exit_code(&outcome), FATAL_EXIT_CODE);
    }

    #[test]
    fn finished_run_exits_with_count() {
        assert_eq!(run_exit_code(&Ok(0)), 0);
        assert_eq!(run_exit_code(&Ok(3)), 3);
        assert_eq!(run_exit_code(&Ok(300)), 254);
    }
}
