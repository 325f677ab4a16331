//! UNIX socket server for daemon mode.
//!
//! Listens on a UNIX socket and serves each connection on its own task.
//! The runtime is single-threaded, so requests interleave only where an
//! operation suspends (a group metadata refresh).
//!
//! CHANGELOG:
//! - 10/16/2026 - Moved to tokio; connections no longer block each other
//! - 10/15/2026 - Initial implementation

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use crate::daemon::protocol::{Request, Response};
use crate::daemon::service::{error_code, DaemonService};

/// Daemon server listening on UNIX socket.
pub struct DaemonServer {
    service: Arc<DaemonService>,
    socket_path: String,
}

impl DaemonServer {
    pub fn new(socket_path: impl AsRef<Path>, service: DaemonService) -> Self {
        Self {
            service: Arc::new(service),
            socket_path: socket_path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Bind the socket, replacing a stale one, owner-only permissions.
    pub fn bind(&self) -> Result<UnixListener> {
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!(socket = %self.socket_path, "daemon listening");
        Ok(listener)
    }

    /// Bind and serve until the process is stopped.
    pub async fn serve(&self) -> Result<()> {
        let listener = self.bind()?;
        self.accept_loop(listener).await
    }

    pub async fn accept_loop(&self, listener: UnixListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let service = Arc::clone(&self.service);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(&service, stream).await {
                            warn!(error = %e, "connection error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "accept error");
                }
            }
        }
    }
}

/// Serve one NDJSON request on a connection.
async fn handle_connection(service: &DaemonService, stream: UnixStream) -> Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    reader.read_line(&mut line).await?;

    if line.trim().is_empty() {
        return Ok(()); // Client disconnected
    }

    let response = respond(service, &line).await;

    writer.write_all(response.to_ndjson_line()?.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Build the response for one request line.
pub async fn respond(service: &DaemonService, line: &str) -> Response {
    let start = Instant::now();
    let elapsed_ms = || start.elapsed().as_secs_f64() * 1000.0;

    let request = match Request::from_ndjson_line(line) {
        Ok(request) => request,
        Err(e) => {
            return Response::error(String::new(), "INVALID_JSON", format!("{:#}", e), elapsed_ms());
        }
    };

    debug!(id = %request.id, method = %request.method, "dispatching request");

    match service.dispatch(&request.method, request.params).await {
        Ok(result) => Response::success(request.id, result, elapsed_ms()),
        Err(e) => Response::error(request.id, error_code(&e), e.to_string(), elapsed_ms()),
    }
}
