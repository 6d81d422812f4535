use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{state::AppState, utils::websocket};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayersResponse {
    pub players: Vec<String>,
    pub leader: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DraftsResponse {
    pub drafts: Vec<BTreeMap<String, String>>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        // 接続中のプレイヤー一覧
        // curl http://localhost:8080/api/room/players
        .route("/players", get(get_players))
        // 役職ドラフト一覧
        // curl http://localhost:8080/api/room/drafts
        .route("/drafts", get(get_drafts))
        // WebSocket接続
        // websocat ws://localhost:8080/api/room/ws
        .route("/ws", get(websocket::handler))
        .with_state(state)
}

async fn get_players(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;
    let response = PlayersResponse {
        players: session.roster().names(),
        leader: session.leader(),
    };
    (StatusCode::OK, Json(response))
}

async fn get_drafts(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;
    let response = DraftsResponse {
        drafts: session.drafts().to_wire(),
    };
    (StatusCode::OK, Json(response))
}
