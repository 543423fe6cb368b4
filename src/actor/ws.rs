//! WebSocket transport.
//!
//! ```text
//! TcpListener --accept--> handshake --> pump(socket <-> ConnectionHandle)
//! ```
//!
//! One task per socket moves text frames into the connection queue and
//! server messages out. Socket tasks are tracked by the runtime, so shutdown
//! closes open sockets too. A failed send or a closed socket drops the
//! connection sender, which closes the connection.

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::error::TransportError;
use crate::runtime::Runtime;

/// Accept loop run by [`Runtime::attach`].
pub(crate) async fn accept_loop(runtime: Runtime, listener: TcpListener) {
    if let Ok(addr) = listener.local_addr() {
        crate::debug!("ws"; "listening on ws://{}", addr);
    }
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                crate::debug!("ws"; "accepted {}", peer);
                let socket_runtime = runtime.clone();
                runtime.spawn_tracked(async move {
                    if let Err(e) = serve_socket(socket_runtime, stream).await {
                        crate::log!("ws"; "connection from {} failed: {}", peer, e);
                    }
                });
            }
            Err(e) => {
                crate::log!("ws"; "accept failed: {}", e);
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        }
    }
}

async fn serve_socket(runtime: Runtime, stream: TcpStream) -> Result<(), TransportError> {
    let socket = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut frames) = socket.split();
    let (sender, mut outbound) = runtime.open_connection().split();

    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(Message::Text(text))) => sender.send_text(text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    crate::debug!("ws"; "read failed: {}", e);
                    break;
                }
            },
            msg = outbound.recv() => match msg {
                Some(msg) => {
                    if let Err(e) = sink.send(Message::Text(msg.to_json().into())).await {
                        crate::debug!("ws"; "send failed: {}", e);
                        break;
                    }
                }
                None => break,
            },
        }
    }

    drop(sender);
    let _ = sink.close().await;
    Ok(())
}
