//! HTTP response handlers.

use anyhow::{Result, anyhow};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::embed::serve::{CLIENT_JS, ClientVars, PAGE_HTML, PageVars};

const HTML: &str = "text/html; charset=utf-8";
const JAVASCRIPT: &str = "application/javascript; charset=utf-8";
const PLAIN: &str = "text/plain; charset=utf-8";

/// Respond with the page shell around pre-rendered root markup.
pub fn respond_page(request: Request, title: &str, body: String) -> Result<()> {
    let page = PAGE_HTML.render(&PageVars {
        title: title.to_string(),
        body,
    });
    send_body(request, 200, HTML, page.into_bytes())
}

/// Respond with the client script, pointed at the WebSocket port.
pub fn respond_client_js(request: Request, ws_port: u16) -> Result<()> {
    let body = CLIENT_JS.render(&ClientVars { ws_port });
    send_body(request, 200, JAVASCRIPT, body.into_bytes())
}

/// Respond with 500 and the error chain as plain text.
pub fn respond_error(request: Request, error: &anyhow::Error) -> Result<()> {
    send_body(request, 500, PLAIN, format!("{error:#}").into_bytes())
}

pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    send_body(request, 405, PLAIN, b"405 Method Not Allowed".to_vec())
}

pub fn is_get(request: &Request) -> bool {
    matches!(request.method(), Method::Get | Method::Head)
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let head = request.method() == &Method::Head;
    let header = make_header("Content-Type", content_type)?;
    let response = Response::from_data(if head { Vec::new() } else { body })
        .with_status_code(StatusCode(status))
        .with_header(header);
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header {key}: {value}"))
}
