use crate::models::config::ServerConfig;
use crate::routes;
use crate::state::AppState;
use axum::Router;

pub fn create_app() -> Router {
    create_app_with(ServerConfig::default())
}

pub fn create_app_with(config: ServerConfig) -> Router {
    let state = AppState::new(config);
    routes::create_routes(state)
}
