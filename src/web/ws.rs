//! `/ws` fan-out (§4.11). One endpoint, pushing a snapshot on connect and on
//! every state-change callback from the worker or either player. Grounded on
//! axum's built-in `extract::ws`; the peer set is a plain mutex-guarded Vec,
//! per §5's "own lock, iteration takes a snapshot of the set" rule.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::AppState;

struct Peer {
    id: u64,
    sender: mpsc::UnboundedSender<Message>,
}

#[derive(Default)]
pub struct WsPeers {
    next_id: AtomicU64,
    peers: Mutex<Vec<Peer>>,
}

impl WsPeers {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, sender: mpsc::UnboundedSender<Message>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.peers.lock().expect("ws peer list poisoned").push(Peer { id, sender });
        id
    }

    fn remove(&self, id: u64) {
        self.peers.lock().expect("ws peer list poisoned").retain(|peer| peer.id != id);
    }

    /// Sends `text` to every connected client, dropping any whose channel is
    /// closed. Takes a snapshot of the peer list before sending so the lock
    /// isn't held across I/O.
    pub fn broadcast(&self, text: String) {
        let peers: Vec<(u64, mpsc::UnboundedSender<Message>)> = {
            let guard = self.peers.lock().expect("ws peer list poisoned");
            guard.iter().map(|peer| (peer.id, peer.sender.clone())).collect()
        };

        let mut dead = Vec::new();
        for (id, sender) in peers {
            if sender.send(Message::Text(text.clone().into())).is_err() {
                dead.push(id);
            }
        }
        if !dead.is_empty() {
            let mut guard = self.peers.lock().expect("ws peer list poisoned");
            guard.retain(|peer| !dead.contains(&peer.id));
        }
    }
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let id = state.ws_peers.register(tx.clone());

    if let Ok(snapshot) = state.coordinator.snapshot(&state.worker).await {
        if let Ok(text) = serde_json::to_string(&snapshot) {
            let _ = tx.send(Message::Text(text.into()));
        }
    }

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    // Incoming client messages are discarded (§4.11); we only watch for
    // the connection closing so the peer can be removed promptly.
    while let Some(message) = stream.next().await {
        if message.is_err() {
            break;
        }
    }

    state.ws_peers.remove(id);
    send_task.abort();
}
