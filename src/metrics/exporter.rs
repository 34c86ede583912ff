//! Prometheus metrics exporter
//!
//! HTTP endpoint for Prometheus scraping. The listener is bound at most once
//! per exporter and served from a background Tokio task.

use once_cell::sync::OnceCell;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::registry::MetricsSource;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json";
/// Upper bound on the request line plus headers
const MAX_REQUEST_HEAD: u64 = 8 * 1024;

/// Outcome of a start request. Every variant means "metrics are being served".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExporterStatus {
    /// This call bound the listener
    Started(SocketAddr),
    /// An earlier call already bound the listener
    AlreadyRunning(SocketAddr),
    /// The port is held by another listener in this process or elsewhere
    PortInUse(SocketAddr),
}

/// Error type for exporter start-up.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// Binding failed for a reason other than the port being taken.
    #[error("failed to bind metrics listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// `start_once` was called outside a Tokio runtime.
    #[error("metrics exporter must be started from within a Tokio runtime")]
    NoRuntime,
}

struct BoundListener {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
}

/// Pull endpoint serving a [`MetricsSource`]
pub struct MetricsExporter {
    source: Arc<dyn MetricsSource>,
    path: Arc<str>,
    bound: OnceCell<BoundListener>,
}

impl MetricsExporter {
    /// Create an exporter serving `source` at `path`
    pub fn new(source: Arc<dyn MetricsSource>, path: impl Into<String>) -> Self {
        Self {
            source,
            path: Arc::from(path.into()),
            bound: OnceCell::new(),
        }
    }

    /// Bind the listener unless it is already bound
    ///
    /// Safe to call any number of times; only the first successful call binds.
    /// A port already held by someone else counts as success.
    pub fn start_once(&self, addr: SocketAddr) -> Result<ExporterStatus, ExporterError> {
        if let Some(bound) = self.bound.get() {
            debug!(addr = %bound.local_addr, "Metrics exporter already running");
            return Ok(ExporterStatus::AlreadyRunning(bound.local_addr));
        }

        let mut started = false;
        let result = self.bound.get_or_try_init(|| {
            started = true;
            self.bind(addr)
        });

        match result {
            Ok(bound) if started => {
                info!(addr = %bound.local_addr, path = %self.path, "Metrics exporter started");
                Ok(ExporterStatus::Started(bound.local_addr))
            }
            Ok(bound) => Ok(ExporterStatus::AlreadyRunning(bound.local_addr)),
            Err(ExporterError::Bind { source, .. }) if source.kind() == io::ErrorKind::AddrInUse => {
                debug!(%addr, "Metrics port already bound, treating as started");
                Ok(ExporterStatus::PortInUse(addr))
            }
            Err(e) => Err(e),
        }
    }

    /// Address of the bound listener, if this exporter bound one
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.bound.get().map(|bound| bound.local_addr)
    }

    /// Stop accepting scrapes. The exporter cannot be restarted afterwards.
    pub fn shutdown(&self) {
        if let Some(bound) = self.bound.get() {
            let _ = bound.shutdown_tx.send(true);
            info!(addr = %bound.local_addr, "Metrics exporter shutting down");
        }
    }

    fn bind(&self, addr: SocketAddr) -> Result<BoundListener, ExporterError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ExporterError::NoRuntime)?;
        let bind_error = |source: io::Error| ExporterError::Bind { addr, source };

        let std_listener = std::net::TcpListener::bind(addr).map_err(bind_error)?;
        std_listener.set_nonblocking(true).map_err(bind_error)?;
        let local_addr = std_listener.local_addr().map_err(bind_error)?;

        let listener = {
            let _guard = runtime.enter();
            TcpListener::from_std(std_listener).map_err(bind_error)?
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        runtime.spawn(serve(listener, self.source.clone(), self.path.clone(), shutdown_rx));

        Ok(BoundListener {
            local_addr,
            shutdown_tx,
        })
    }
}

async fn serve(
    listener: TcpListener,
    source: Arc<dyn MetricsSource>,
    path: Arc<str>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let source = source.clone();
                    let path = path.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_request(stream, source.as_ref(), &path).await {
                            debug!(%peer, error = %e, "Scrape handling error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept metrics connection");
                }
            }
        }
    }
    debug!("Metrics accept loop exited");
}

async fn handle_request(
    mut stream: TcpStream,
    source: &dyn MetricsSource,
    metrics_path: &str,
) -> io::Result<()> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader).take(MAX_REQUEST_HEAD);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await? == 0 {
        return Ok(());
    }

    // Drain headers so the client is not reset on close
    let mut header = String::new();
    loop {
        header.clear();
        let n = reader.read_line(&mut header).await?;
        if n == 0 || header.trim_end().is_empty() {
            break;
        }
    }

    // Parse request line
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("/");
    let path = target.split('?').next().unwrap_or(target);

    let (status, content_type, body) = if method != "GET" {
        (
            "405 Method Not Allowed",
            JSON_CONTENT_TYPE,
            r#"{"error": "Method not allowed"}"#.to_string(),
        )
    } else if path == metrics_path {
        ("200 OK", EXPOSITION_CONTENT_TYPE, source.render())
    } else if path == "/" {
        let help = format!(
            r#"{{
  "endpoints": {{
    "{}": "Prometheus metrics"
  }}
}}"#,
            metrics_path
        );
        ("200 OK", JSON_CONTENT_TYPE, help)
    } else {
        ("404 Not Found", JSON_CONTENT_TYPE, r#"{"error": "Not found"}"#.to_string())
    };

    let response = format!(
        "HTTP/1.1 {}\r\n\
         Content-Type: {}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        status,
        content_type,
        body.len(),
        body
    );

    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}
