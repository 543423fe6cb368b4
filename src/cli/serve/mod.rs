//! Demo server.
//!
//! ```text
//! main thread:   tiny_http request loop   GET /            -> page (new root)
//!                                         GET /purview.js  -> client script
//! tokio threads: WebSocket accept loop    one ConnectionActor per socket
//! watcher:       Ctrl+C -> Runtime::shutdown()
//! ```

mod lifecycle;
mod response;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::cli::demo;
use crate::config::PurviewConfig;
use crate::embed::serve::CLIENT_JS_URL;
use crate::runtime::Runtime;
use crate::{debug, log};

/// Serve the demo application until Ctrl+C.
pub fn serve(config: &PurviewConfig) -> Result<()> {
    let runtime = Runtime::new(config.runtime.clone());
    let tokio = lifecycle::build_tokio()?;

    let ws_addr = tokio.block_on(lifecycle::attach_websocket(
        &runtime,
        config.serve.interface,
        config.serve.ws_port,
    ))?;
    debug!("serve"; "ws://{}", ws_addr);

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(1);
    lifecycle::setup_shutdown_handler(Arc::clone(&server), shutdown_tx)?;
    let watcher = lifecycle::spawn_shutdown_watcher(runtime.clone(), shutdown_rx);

    log!("serve"; "http://{}", addr);
    run_request_loop(&server, &runtime, ws_addr.port());

    lifecycle::wait_for_shutdown(watcher);
    tokio.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

fn run_request_loop(server: &Server, runtime: &Runtime, ws_port: u16) {
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, runtime, ws_port) {
            log!("serve"; "request error: {e}");
        }
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, runtime: &Runtime, ws_port: u16) -> Result<()> {
    if lifecycle::is_shutdown() {
        return response::respond_unavailable(request);
    }
    if !response::is_get(&request) {
        return response::respond_method_not_allowed(request);
    }

    let path = request.url().split(['?', '#']).next().unwrap_or("/").to_string();
    debug!("serve"; "GET {}", path);

    match path.as_str() {
        "/" | "/index.html" => match runtime.render(&demo::app()).context("rendering demo app") {
            Ok(body) => response::respond_page(request, "purview", body),
            Err(e) => response::respond_error(request, &e),
        },
        CLIENT_JS_URL => response::respond_client_js(request, ws_port),
        _ => response::respond_not_found(request),
    }
}
