use axum::extract::ws::Message;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, Mutex};
use tracing::warn;
use uuid::Uuid;

use crate::error::GameError;
use crate::models::config::ServerConfig;
use crate::models::message::{ClientMessage, Outbound, Recipient, ServerMessage};
use crate::services::game_service::Session;

/// Outgoing queue of one websocket connection.
pub type ConnectionTx = mpsc::UnboundedSender<Message>;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub connections: Arc<Mutex<HashMap<Uuid, ConnectionTx>>>,
    pub config: Arc<ServerConfig>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let session = match config.rng_seed {
            Some(seed) => Session::with_seed(seed),
            None => Session::new(),
        };
        AppState {
            session: Arc::new(Mutex::new(session)),
            connections: Arc::new(Mutex::new(HashMap::new())),
            config: Arc::new(config),
        }
    }

    pub async fn register_connection(&self, id: Uuid, tx: ConnectionTx) {
        self.connections.lock().await.insert(id, tx);
    }

    /// Forgets the connection and, if it had joined, removes the player.
    pub async fn drop_connection(&self, id: Uuid, name: Option<&str>) {
        self.connections.lock().await.remove(&id);
        if let Some(name) = name {
            let mut session = self.session.lock().await;
            let out = session.leave(name);
            self.deliver(&session, out).await;
        }
    }

    /// Claims `name` for connection `id`.
    pub async fn join(&self, id: Uuid, name: &str) -> Result<String, GameError> {
        let mut session = self.session.lock().await;
        match session.join(id, name) {
            Ok(out) => {
                self.deliver(&session, out).await;
                Ok(name.trim().to_string())
            }
            Err(e) => {
                self.send_error(id, &e).await;
                Err(e)
            }
        }
    }

    /// Runs one command to completion and delivers its messages while the
    /// session is still locked, so all connections see one global order.
    pub async fn handle_command(&self, id: Uuid, sender: &str, command: ClientMessage) {
        let mut session = self.session.lock().await;
        match session.handle(sender, command) {
            Ok(out) => self.deliver(&session, out).await,
            Err(e) => self.send_error(id, &e).await,
        }
    }

    pub async fn send_error(&self, id: Uuid, error: &GameError) {
        let message = ServerMessage::Error {
            kind: error.kind(),
            message: error.to_string(),
        };
        self.send_to(&[id], &message).await;
    }

    async fn deliver(&self, session: &Session, out: Vec<Outbound>) {
        let everyone: Vec<String> = session.roster().names();
        for Outbound { to, message } in out {
            let names: Vec<String> = match to {
                Recipient::All => everyone.clone(),
                Recipient::AllExcept(skip) => {
                    everyone.iter().filter(|n| **n != skip).cloned().collect()
                }
                Recipient::Player(name) => vec![name],
                Recipient::Players(names) => names,
            };
            let ids: Vec<Uuid> = names
                .iter()
                .filter_map(|name| session.connection_of(name))
                .collect();
            self.send_to(&ids, &message).await;
        }
    }

    async fn send_to(&self, ids: &[Uuid], message: &ServerMessage) {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to encode message: {}", e);
                return;
            }
        };
        let connections = self.connections.lock().await;
        for id in ids {
            if let Some(tx) = connections.get(id) {
                if tx.send(Message::Text(text.clone())).is_err() {
                    warn!("connection {} already closed", id);
                }
            }
        }
    }
}
