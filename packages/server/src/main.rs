use axum::http::{self, HeaderValue, Method};
use dotenvy::dotenv;
use env_logger::Builder;
use log::{info, warn, LevelFilter};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use avalon_server::{app, models::config::CONFIG};

// ログ設定
fn init_logger(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .filter_module("tower_http", level)
        .filter_module("axum", level)
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .format_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 環境変数をロード
    let dotenv_result = dotenv();

    let config = CONFIG.server.clone();
    init_logger(config.log_level);
    if let Err(e) = dotenv_result {
        warn!(".envファイルの読み込みに失敗しました: {}", e);
    }
    for warning in &CONFIG.warnings {
        warn!("{}", warning);
    }

    // CORSレイヤーの設定
    let cors = match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET])
            .allow_headers([http::header::CONTENT_TYPE]),
        Err(e) => {
            warn!("invalid CORS origin {:?}: {}", config.cors_origin, e);
            CorsLayer::new()
        }
    };

    let addr = config.addr();
    let app = app::create_app_with(config)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http() // HTTPトレースログを有効化
                .make_span_with(|request: &http::Request<_>| {
                    tracing::info_span!(
                        "HTTP request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
        );

    // サーバーの起動
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("サーバーを起動しました: http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
