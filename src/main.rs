//! CLI entrypoint for serving MCP tools and running one-off vulnerability scans.

mod config;
mod mcp;
mod report;
mod scanner;
mod service;
mod severity;
mod types;
mod vulnerability;

use clap::{Parser, Subcommand};
use mcp::GuardianServer;
use rmcp::ServiceExt;
use service::GuardianService;
use tracing_subscriber::EnvFilter;
use types::{FileType, ScanMode};

#[derive(Parser)]
#[command(
    name = "guardian-mcp",
    version,
    about = "MCP server that checks npm and Composer dependencies for known vulnerabilities"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server over stdio
    Serve,
    /// Run a one-off vulnerability scan and print the report
    Scan {
        /// Project directory containing package.json and/or composer.json
        path: Option<String>,
        /// Manifest to scan
        #[arg(long, value_enum, default_value_t = FileType::Both)]
        file_type: FileType,
        /// Report detail level
        #[arg(long, value_enum, default_value_t = ScanMode::Full)]
        scan_mode: ScanMode,
    },
}

fn init_tracing() {
    // stdout carries MCP traffic and reports; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Serve => {
            tracing::info!("guardian-mcp MCP server starting");

            let server = GuardianServer::new()?;
            let service = server.serve(rmcp::transport::stdio()).await?;
            service.waiting().await?;
        }
        Commands::Scan {
            path,
            file_type,
            scan_mode,
        } => {
            let service = GuardianService::new()?;
            let report = service
                .check_vulnerabilities(path.as_deref(), file_type, scan_mode)
                .await?;
            println!("{report}");
        }
    }

    Ok(())
}
