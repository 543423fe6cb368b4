//! Server lifecycle management.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossbeam::channel::{Receiver, Sender};
use tiny_http::Server;
use tokio::net::TcpListener;

use crate::log;
use crate::runtime::Runtime;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the runtime watcher
static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Bind the HTTP server, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);
        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(anyhow!(
        "failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Bind the WebSocket listener (with the same port retry) and start the
/// runtime's accept loop on it. Must run inside the tokio runtime.
pub async fn attach_websocket(
    runtime: &Runtime,
    interface: IpAddr,
    base_port: u16,
) -> Result<SocketAddr> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)).await {
            Ok(listener) => {
                if offset > 0 {
                    log!("serve"; "ws port {} in use, using {} instead", base_port, port);
                }
                let addr = listener.local_addr().context("websocket listener address")?;
                runtime.attach(listener);
                return Ok(addr);
            }
            Err(e) => last_error = Some(e),
        }
    }
    let err = last_error.map(anyhow::Error::from).unwrap_or_else(|| anyhow!("no ports tried"));
    Err(err.context(format!("failed to bind websocket port {base_port}")))
}

/// Multi-threaded tokio runtime for the WebSocket side.
pub fn build_tokio() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")
}

/// Install the Ctrl+C handler: unblock the HTTP server and notify the
/// runtime watcher.
pub fn setup_shutdown_handler(server: Arc<Server>, shutdown_tx: Sender<()>) -> Result<()> {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);

    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }
        if let Some(server) = SERVER.get() {
            log!("serve"; "shutting down...");
            server.unblock();
        }
    })
    .map_err(|e| anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// Thread that shuts the runtime down (unmounting every root) once the
/// shutdown signal arrives.
pub fn spawn_shutdown_watcher(runtime: Runtime, shutdown_rx: Receiver<()>) -> JoinHandle<()> {
    thread::spawn(move || {
        if shutdown_rx.recv().is_ok() {
            runtime.shutdown();
            crate::debug!("serve"; "runtime shut down");
        }
    })
}

/// Wait for the watcher to finish (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
