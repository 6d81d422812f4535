use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::game::{GameOutcome, GamePhase, QuestResult};
use crate::models::message::WaitingStatus;
use crate::state::AppState;

/// Public view of the session. Roles are only included in debug mode.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub quest_index: u8,
    pub vote_track: u8,
    pub quest_results: BTreeMap<u8, QuestResult>,
    pub leader: Option<String>,
    pub required_team_size: usize,
    pub team: Vec<String>,
    pub waiting: WaitingStatus,
    pub outcome: Option<GameOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<BTreeMap<String, String>>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        // curl http://localhost:8080/api/game/state
        .route("/state", get(get_game_state))
        .with_state(state)
}

pub async fn get_game_state(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;
    let game = session.game();
    let team = match (&game.quest_ballot, &game.team_proposal) {
        (Some(ballot), _) => ballot.team.clone(),
        (None, Some(proposal)) => proposal.team.clone(),
        (None, None) => Vec::new(),
    };
    let snapshot = GameSnapshot {
        phase: game.phase,
        quest_index: game.quest_index,
        vote_track: game.vote_track,
        quest_results: game.quest_results.clone(),
        leader: session.leader(),
        required_team_size: session.required_team_size(),
        team,
        waiting: session.waiting_status(),
        outcome: game.outcome.clone(),
        roles: state
            .config
            .show_player_roles
            .then(|| session.assignment().labels()),
    };
    (StatusCode::OK, Json(snapshot))
}
