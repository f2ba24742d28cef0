use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use websnap::{
    visit, BatchOptions, BrowserOptions, Error, Output, VisitOptions, VisitSummary,
    DEFAULT_QUIET_MS, DEFAULT_TIMEOUT_MS,
};

#[derive(Parser)]
#[command(name = "websnap")]
#[command(about = "Idle-triggered page snapshots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Quiet period in milliseconds before the flush fires
    #[arg(long, global = true, default_value_t = DEFAULT_QUIET_MS)]
    quiet_ms: u64,

    /// Overall navigation timeout in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Run with a visible browser window
    #[arg(long, global = true)]
    headed: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Load a URL and write cookies, resources, and a screenshot to a directory
    Visit {
        /// Target URL
        url: Option<String>,

        /// Output directory for cookies.json, resources.json, capture.png
        #[arg(default_value = "data")]
        output_dir: PathBuf,
    },
    /// Load a URL and write only the cookie jar, echoing resource URLs
    Cookies {
        /// Target URL
        url: Option<String>,

        /// Output file for the cookie jar JSON
        #[arg(default_value = "cookies.json")]
        output_file: PathBuf,
    },
    /// Visit every site in a JSON list with a pool of workers
    Batch {
        /// JSON file holding an array of site URLs
        sites_file: PathBuf,

        /// Visit only a random sample of N sites
        #[arg(long, value_name = "N")]
        trial: Option<usize>,

        /// Number of concurrent workers
        #[arg(long, default_value_t = 8)]
        workers: usize,

        /// Root directory for per-site snapshot directories
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    let options = VisitOptions {
        quiet: Duration::from_millis(cli.quiet_ms),
        timeout: Duration::from_millis(cli.timeout_ms),
        browser: BrowserOptions { headed: cli.headed },
    };

    match cli.command {
        Command::Visit { url, output_dir } => {
            let url = require_url(url);
            let summary = run_visit(&url, Output::Archive(output_dir.clone()), &options).await?;
            println!("✓ Snapshot written to {}", output_dir.display());
            print_summary(&summary);
        }
        Command::Cookies { url, output_file } => {
            let url = require_url(url);
            let summary = run_visit(&url, Output::CookieJar(output_file.clone()), &options).await?;
            println!("✓ Cookie jar written to {}", output_file.display());
            print_summary(&summary);
        }
        Command::Batch {
            sites_file,
            trial,
            workers,
            data_dir,
        } => {
            let batch = BatchOptions {
                workers,
                trial,
                data_dir,
                visit: options,
            };
            let report = websnap::batch::run(&sites_file, &batch).await?;
            println!("✓ Visited {} sites", report.sites);
            if report.retries > 0 {
                println!("  Retries: {}", report.retries);
            }
        }
    }

    Ok(())
}

/// Canonical missing-URL diagnostic: stdout, then exit 1.
fn require_url(url: Option<String>) -> String {
    match url {
        Some(url) => url,
        None => {
            println!("ERROR: no url.");
            process::exit(1);
        }
    }
}

/// Run one visit, mapping failed loads to the canonical diagnostic.
async fn run_visit(
    url: &str,
    output: Output,
    options: &VisitOptions,
) -> anyhow::Result<VisitSummary> {
    match visit(url, &output, options).await {
        Ok(summary) => Ok(summary),
        Err(e @ (Error::PageLoad(_) | Error::Timeout(_))) => {
            tracing::debug!("load failed: {}", e);
            println!("ERROR: page open failed.");
            process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn print_summary(summary: &VisitSummary) {
    println!("  Resources: {}", summary.resources);
    println!("  Cookies: {}", summary.cookies);
    println!("  Duration: {}ms", summary.duration_ms);
}
