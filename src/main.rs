//! WPVulnDB Report CLI - check a WordPress install against the vulnerability database

use clap::Parser;
use std::process::ExitCode;
use tracing::debug;

use wpvulndb_report::{Auditor, Settings, VulnDbClient, WpCli, logging, run_exit_code};

/// Report known vulnerabilities in WordPress core and active plugins.
///
/// Run from the WordPress root, next to wp-cli.phar. The exit code is the
/// number of vulnerabilities found; 255 means the report could not run.
#[derive(Parser, Debug)]
#[command(name = "wpvulndb")]
#[command(version, about, long_about = None)]
struct Args {
    /// API token (takes precedence over --token)
    #[arg(short = 't', value_name = "TOKEN")]
    short_token: Option<String>,

    /// API token; falls back to WPVULNDB_TOKEN, then .wpvulndb.ini in the
    /// current and home directories
    #[arg(long = "token", value_name = "TOKEN")]
    long_token: Option<String>,

    /// Show the calls made to the vulnerability database
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logging(args.debug);

    let outcome = run(args).await;
    if let Err(e) = &outcome {
        eprintln!("Error: {}", e);
    }
    ExitCode::from(run_exit_code(&outcome))
}

/// Token resolution comes first so a missing token fails before any request
async fn run(args: Args) -> wpvulndb_report::Result<u32> {
    let settings = Settings::resolve(args.short_token, args.long_token, args.debug)?;

    let client = VulnDbClient::builder(&settings.token)
        .api_base(&settings.api_base)
        .debug(settings.debug)
        .build()?;
    let inventory = WpCli::new(&settings.wp_cli);
    debug!(api_base = %settings.api_base, wp_cli = %inventory.binary().display(), "starting report");

    let auditor = Auditor::new(client, inventory);
    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    let report = auditor.run(&mut writer).await?;

    Ok(report.vulnerable_count())
}
