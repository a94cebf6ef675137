//! Mock scoring engine for integration tests.
//!
//! A WebSocket server that:
//! - Accepts connections
//! - Records received frames (bootstrap snapshot requests included)
//! - Pushes snapshot/update/config frames to every connected hub

use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// A mock scoring engine server.
pub struct MockEngine {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    frame_tx: broadcast::Sender<String>,
    received: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
}

impl MockEngine {
    /// Start a mock engine on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(VecDeque::new()));
        let connections: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let (frame_tx, _) = broadcast::channel::<String>(64);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let received_clone = received.clone();
        let connections_clone = connections.clone();
        let frame_tx_clone = frame_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        let received = received_clone.clone();
                        let connections = connections_clone.clone();
                        let frame_rx = frame_tx_clone.subscribe();
                        tokio::spawn(handle_connection(stream, received, connections, frame_rx));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            frame_tx,
            received,
            connections,
        }
    }

    /// The engine's WebSocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Push a frame to every connected hub.
    pub fn push(&self, frame: serde_json::Value) {
        let _ = self.frame_tx.send(frame.to_string());
    }

    /// Push a raw (possibly malformed) text frame.
    pub fn push_raw(&self, frame: &str) {
        let _ = self.frame_tx.send(frame.to_string());
    }

    /// Number of connections accepted so far.
    pub async fn connection_count(&self) -> u32 {
        *self.connections.lock().await
    }

    /// All text frames received from hubs.
    pub async fn received_frames(&self) -> Vec<String> {
        self.received.lock().await.iter().cloned().collect()
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    received: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
    mut frame_rx: broadcast::Receiver<String>,
) {
    {
        let mut count = connections.lock().await;
        *count += 1;
    }

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let mut frames = received.lock().await;
                        frames.push_back(text.to_string());
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
            frame = frame_rx.recv() => {
                match frame {
                    Ok(text) => {
                        if write.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_engine_starts() {
        let engine = MockEngine::start().await;
        assert!(engine.url().starts_with("ws://127.0.0.1:"));
        engine.shutdown().await;
    }
}
