//! wolfies-whatsapp-daemon - Persistent daemon holding the store and read markers.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::info;

use wolfies_whatsapp::config::{StoreSettings, DEFAULT_SOCKET};
use wolfies_whatsapp::daemon::server::DaemonServer;
use wolfies_whatsapp::daemon::service::DaemonService;

#[derive(Parser)]
#[command(name = "wolfies-whatsapp-daemon")]
#[command(about = "Persistent daemon for wolfies-whatsapp")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon
    Start {
        /// Socket path
        #[arg(long, default_value = DEFAULT_SOCKET)]
        socket: String,

        /// Store snapshot (default: $WOLFIES_WHATSAPP_SNAPSHOT or ~/.wolfies-whatsapp/store.json)
        #[arg(long)]
        snapshot: Option<String>,

        /// Simulated metadata refresh latency in milliseconds
        #[arg(long, default_value_t = 0)]
        refresh_latency_ms: u64,

        /// Run in foreground (don't daemonize)
        #[arg(long)]
        foreground: bool,
    },

    /// Stop the daemon
    Stop {
        #[arg(long, default_value = DEFAULT_SOCKET)]
        socket: String,
    },

    /// Check daemon status
    Status {
        #[arg(long, default_value = DEFAULT_SOCKET)]
        socket: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            socket,
            snapshot,
            refresh_latency_ms,
            foreground,
        } => {
            let settings = StoreSettings::new(snapshot.as_deref(), refresh_latency_ms);
            cmd_start(socket, settings, foreground)
        }
        Commands::Stop { socket } => cmd_stop(socket),
        Commands::Status { socket } => cmd_status(socket),
    }
}

fn cmd_start(socket: String, settings: StoreSettings, foreground: bool) -> Result<()> {
    let socket_path = shellexpand::tilde(&socket).to_string();

    if let Some(parent) = Path::new(&socket_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Load before forking so snapshot errors reach the terminal.
    let service = DaemonService::new(&settings)?;

    if foreground {
        info!("starting in foreground");
    } else {
        use daemonize::Daemonize;

        let pid_file = format!("{}.pid", socket_path);
        Daemonize::new()
            .pid_file(&pid_file)
            .working_directory("/tmp")
            .start()
            .context("Failed to daemonize")?;
    }

    // The runtime is built after the fork; a forked process cannot reuse one.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let server = DaemonServer::new(&socket_path, service);
    runtime.block_on(server.serve())
}

fn cmd_stop(socket: String) -> Result<()> {
    let socket_path = shellexpand::tilde(&socket).to_string();
    let pid_file = format!("{}.pid", socket_path);

    let pid_str = std::fs::read_to_string(&pid_file)
        .with_context(|| format!("No pid file at {}", pid_file))?;
    let pid: i32 = pid_str.trim().parse()?;

    // SAFETY: kill(2) with a pid read from our own pid file; no memory is shared.
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }

    let _ = std::fs::remove_file(&pid_file);
    let _ = std::fs::remove_file(&socket_path);

    println!("Daemon stopped (pid {})", pid);

    Ok(())
}

fn cmd_status(socket: String) -> Result<()> {
    let socket_path = shellexpand::tilde(&socket).to_string();

    match std::os::unix::net::UnixStream::connect(&socket_path) {
        Ok(_) => {
            println!("Daemon running at {}", socket_path);
            Ok(())
        }
        Err(_) => {
            println!("Daemon not running");
            std::process::exit(1);
        }
    }
}
