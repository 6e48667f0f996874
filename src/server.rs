use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{routing::post, Json, Router};
use log::{error, info, warn};

use crate::config::ServerConfig;
use crate::data::{SchedulingInput, SchedulingOutput};
use crate::error::SolveError;
use crate::solver;

async fn solve_handler(
    payload: Result<Json<SchedulingInput>, JsonRejection>,
) -> Result<Json<SchedulingOutput>, (StatusCode, String)> {
    // unknown roles and shifts are rejected here
    let Json(input) = payload.map_err(|rejection| {
        warn!("rejected request body: {}", rejection.body_text());
        (StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    // solves are CPU-bound; keep them off the async workers
    let result = tokio::task::spawn_blocking(move || solver::solve_input(input))
        .await
        .map_err(|e| {
            error!("solve task failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    match result {
        Ok(output) => Ok(Json(output)),
        Err(SolveError::Config(e)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            error!("{e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

pub fn router() -> Router {
    Router::new().route("/v1/schedule/solve", post(solve_handler))
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router()).await
}
