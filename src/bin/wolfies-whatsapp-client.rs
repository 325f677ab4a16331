//! wolfies-whatsapp-client - Thin client for daemon mode.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use wolfies_whatsapp::config::DEFAULT_SOCKET;
use wolfies_whatsapp::daemon::protocol::{Request, Response};

#[derive(Parser)]
#[command(name = "wolfies-whatsapp-client")]
#[command(about = "Thin client for wolfies-whatsapp daemon")]
struct Cli {
    /// Method to call (e.g. get_unread_messages, get_group_admins)
    method: String,

    /// Socket path
    #[arg(long, default_value = DEFAULT_SOCKET)]
    socket: String,

    /// JSON parameters (as string), e.g. '{"id": "123@g.us"}'
    #[arg(long)]
    params: Option<String>,

    /// Request timeout (seconds)
    #[arg(long, default_value = "5.0")]
    timeout: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let params: HashMap<String, serde_json::Value> = match cli.params {
        Some(p) => serde_json::from_str(&p).context("--params must be a JSON object")?,
        None => HashMap::new(),
    };
    let request = Request::new(cli.method, params);

    let socket_path = shellexpand::tilde(&cli.socket).to_string();
    let stream = UnixStream::connect(&socket_path)
        .with_context(|| format!("Daemon not reachable at {}", socket_path))?;

    let timeout = Duration::from_secs_f64(cli.timeout);
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    (&stream).write_all(request.to_ndjson_line()?.as_bytes())?;

    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    if reader.read_line(&mut response_line)? == 0 {
        bail!("Empty response from daemon");
    }

    let response: Response =
        serde_json::from_str(&response_line).context("Failed to parse daemon response")?;

    if response.ok {
        println!(
            "{}",
            serde_json::to_string_pretty(&response.result.unwrap_or_default())?
        );
        Ok(())
    } else {
        let (code, message) = response
            .error
            .map(|e| (e.code, e.message))
            .unwrap_or_else(|| ("ERROR".to_string(), "Unknown error".to_string()));
        eprintln!("Error [{}]: {}", code, message);
        std::process::exit(1);
    }
}
