use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::GameError;
use crate::models::message::ClientMessage;
use crate::state::AppState;

pub async fn handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

pub async fn handle_socket(ws: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    info!("New WebSocket connection established: {}", connection_id);

    let (mut sender, mut receiver) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    state.register_connection(connection_id, tx).await;

    // 送信キューの内容をそのままソケットへ流す
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(msg).await {
                warn!("Error sending message to {}: {}", connection_id, e);
                break;
            }
        }
    });

    let mut name: Option<String> = None;
    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let command = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(command) => command,
            Err(e) => {
                // 不正なメッセージフォーマットは送信者にだけ通知する
                debug!("Malformed frame from {}: {}", connection_id, e);
                state
                    .send_error(connection_id, &GameError::Malformed(e.to_string()))
                    .await;
                continue;
            }
        };

        if name.is_none() {
            match command {
                ClientMessage::AddUser { name: requested } => {
                    if let Ok(claimed) = state.join(connection_id, &requested).await {
                        name = Some(claimed);
                    }
                }
                _ => state.send_error(connection_id, &GameError::NotJoined).await,
            }
            continue;
        }
        if let Some(joined) = &name {
            state.handle_command(connection_id, joined, command).await;
        }
    }

    info!("WebSocket connection closed: {}", connection_id);
    state.drop_connection(connection_id, name.as_deref()).await;
    send_task.abort();
}
