use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portmaster::poller::until_cancelled;
use portmaster::render::{self, final_report, history_list, open_port_badges, progress_line};
use portmaster::types::{Algorithm, ScanSnapshot};
use portmaster::{ClientConfig, HttpScanClient, ScanForm, ScanSession};

/// portmaster — terminal client for the PortMaster scanning service.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "portmaster",
    version,
    about = "Submit port scans to a PortMaster backend, follow their progress, browse history and download reports.",
    long_about = None
)]
struct Cli {
    /// Base URL of the scanning backend.
    #[arg(long, env = "PORTMASTER_URL", default_value = portmaster::config::DEFAULT_BASE_URL)]
    url: String,

    /// Status poll interval in milliseconds.
    #[arg(long = "poll-ms", env = "PORTMASTER_POLL_MS", default_value_t = 1000)]
    poll_ms: u64,

    /// Per-request timeout in seconds.
    #[arg(long = "timeout-secs", default_value_t = 30)]
    timeout_secs: u64,

    /// Disable ANSI colors (also honored: NO_COLOR).
    #[arg(long = "no-color", default_value_t = false)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Bfs,
    Dfs,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(a: AlgorithmArg) -> Self {
        match a {
            AlgorithmArg::Bfs => Algorithm::Bfs,
            AlgorithmArg::Dfs => Algorithm::Dfs,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Start a scan and follow it until it finishes.
    Scan {
        /// Host name or IP address to scan.
        target: String,

        #[arg(long, value_enum, default_value = "bfs")]
        algorithm: AlgorithmArg,

        /// Do not scan well-known ports ahead of the rest of the range.
        #[arg(long = "no-common-first", default_value_t = false)]
        no_common_first: bool,

        /// Worker threads the backend may use.
        #[arg(long, default_value = "10")]
        threads: String,

        /// First port of the range (inclusive).
        #[arg(long, default_value = "1")]
        start: String,

        /// Last port of the range (inclusive).
        #[arg(long, default_value = "1024")]
        end: String,

        /// Print risk description and recommendations under each port.
        #[arg(long, default_value_t = false)]
        details: bool,

        /// Download the PDF report into this directory once finished.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show a scan from history, following it if still running.
    Show {
        scan_id: String,

        #[arg(long, default_value_t = false)]
        details: bool,
    },

    /// List past scans, newest first.
    History,

    /// Download the PDF report of a scan.
    Export {
        scan_id: String,

        /// Directory to write the report into.
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "portmaster=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let color = !cli.no_color && render::supports_color();

    let config = ClientConfig::new(&cli.url)
        .with_context(|| format!("bad --url value: {}", cli.url))?
        .with_poll_interval(Duration::from_millis(cli.poll_ms))
        .with_request_timeout(Duration::from_secs(cli.timeout_secs));
    let client = HttpScanClient::new(&config).context("failed to build HTTP client")?;

    // Ctrl-C interrupts whatever command is running, not only a watch.
    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_ctrlc.cancel();
        }
    });

    let mut session = ScanSession::new(client)
        .with_poll_interval(config.poll_interval)
        .with_cancel(cancel.clone());

    until_cancelled(&cancel, run(cli.command, &mut session, color))
        .await
        .context("Interrupted")?
}

async fn run(command: Command, session: &mut ScanSession<HttpScanClient>, color: bool) -> Result<()> {
    match command {
        Command::Scan {
            target,
            algorithm,
            no_common_first,
            threads,
            start,
            end,
            details,
            export,
        } => {
            let form = ScanForm {
                target,
                algorithm: algorithm.into(),
                common_ports_first: !no_common_first,
                max_threads: threads,
                port_range_start: start,
                port_range_end: end,
            };
            let mut progress = ProgressPrinter::new(color);
            let done = session
                .start(&form, |s| progress.update(s))
                .await
                .context("Error starting scan")?;
            println!();
            print!("{}", final_report(&done, details, color));

            if let Some(dir) = export {
                if let Some(path) = session
                    .export_current(&dir)
                    .await
                    .context("Error exporting report")?
                {
                    println!("\nReport written to {}", path.display());
                }
            }
        }
        Command::Show { scan_id, details } => {
            let mut progress = ProgressPrinter::new(color);
            let snapshot = session
                .open(&scan_id, |s| progress.update(s))
                .await
                .context("Error loading scan details")?;
            print!("{}", final_report(&snapshot, details, color));
        }
        Command::History => {
            let scans = session.history().await.context("Error loading scan history")?;
            print!("{}", history_list(&scans, color));
        }
        Command::Export { scan_id, output } => {
            let path = session
                .export(&scan_id, &output)
                .await
                .context("Error exporting report")?;
            println!("Report written to {}", path.display());
        }
    }

    Ok(())
}

/// Prints a progress line per poll, and the open-port badges whenever the
/// set of open ports grows.
struct ProgressPrinter {
    color: bool,
    open_seen: usize,
}

impl ProgressPrinter {
    fn new(color: bool) -> Self {
        Self { color, open_seen: 0 }
    }

    fn update(&mut self, snapshot: &ScanSnapshot) {
        println!("{}", progress_line(snapshot, self.color));
        let open = snapshot.open_ports.len();
        if open != self.open_seen {
            if open < self.open_seen {
                warn!(before = self.open_seen, now = open, "open port list shrank");
            }
            self.open_seen = open;
            println!("  {}", open_port_badges(&snapshot.open_ports));
        }
    }
}
