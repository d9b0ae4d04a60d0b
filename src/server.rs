use std::path::Path;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::Router;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Static router: the rendered board at `/`, 404 for every other path.
/// There are no data endpoints; the board carries its own data.
pub fn board_router(board: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(board))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(TraceLayer::new_for_http())
}

/// Serves the board until Ctrl+C.
pub async fn serve_board(bind: &str, board: &Path) -> Result<()> {
    let app = board_router(board);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(%bind, board = %board.display(), "serving board");
    println!("Serving board on http://{bind} (Ctrl+C to stop)");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
