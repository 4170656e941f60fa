use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;

use tracing::{error, info};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::config::DEFAULT_RANKING_LIMIT;
use super::{log_requests, metrics::metrics_handler, state::*, ServerConfig};
use crate::cache::MomentumCache;
use crate::momentum::{MomentumError, MomentumResult};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    uptime: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize, Debug, Default)]
struct MomentumQuery {
    window_days: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
struct RankingQuery {
    limit: Option<usize>,
    window_days: Option<usize>,
}

#[derive(Serialize)]
struct RankingEntry<'a> {
    rank: usize,
    #[serde(flatten)]
    result: &'a MomentumResult,
}

#[derive(Serialize)]
struct RankingResponse<'a> {
    window_days: usize,
    generated_at: DateTime<Utc>,
    artists: Vec<RankingEntry<'a>>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn error_response(err: MomentumError) -> Response {
    let status = match &err {
        MomentumError::NotFound(_) => StatusCode::NOT_FOUND,
        MomentumError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        MomentumError::UpstreamUnavailable(_) | MomentumError::CacheCorruption(_) => {
            error!("Unexpected error reaching the route layer: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        uptime: format_uptime(state.start_time.elapsed()),
    })
}

async fn get_momentum(
    State(state): State<ServerState>,
    Path(artist): Path<String>,
    Query(query): Query<MomentumQuery>,
) -> Response {
    let window_days = query
        .window_days
        .unwrap_or(state.config.default_window_days);
    match state.cache.get_momentum(&artist, window_days).await {
        Ok(result) => Json(&*result).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_momentum(
    State(cache): State<MomentumCache>,
    Path(artist): Path<String>,
) -> Response {
    cache.invalidate(&artist).await;
    StatusCode::NO_CONTENT.into_response()
}

async fn get_ranking(State(state): State<ServerState>, Query(query): Query<RankingQuery>) -> Response {
    let window_days = query
        .window_days
        .unwrap_or(state.config.default_window_days);
    let limit = query.limit.unwrap_or(DEFAULT_RANKING_LIMIT);
    if limit == 0 {
        return error_response(MomentumError::InvalidInput(
            "limit must be greater than 0".to_string(),
        ));
    }

    match state
        .cache
        .rank(&state.config.tracked_artists, window_days, limit)
        .await
    {
        Ok(results) => Json(RankingResponse {
            window_days,
            generated_at: Utc::now(),
            artists: results
                .iter()
                .enumerate()
                .map(|(i, result)| RankingEntry {
                    rank: i + 1,
                    result: &**result,
                })
                .collect(),
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

pub fn make_app(config: ServerConfig, cache: MomentumCache) -> Router {
    let state = ServerState::new(config, cache);

    let momentum_routes: Router = Router::new()
        .route(
            "/momentum/{artist}",
            get(get_momentum).delete(delete_momentum),
        )
        .route("/ranking", get(get_ranking))
        .route("/health", get(health))
        .route_layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state);

    Router::new().nest("/v1", momentum_routes)
}

pub async fn run_server(config: ServerConfig, cache: MomentumCache) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, cache);

    let metrics_app = Router::new().route("/metrics", get(metrics_handler));
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, metrics_app).await {
            error!("Metrics server stopped: {}", e);
        }
    });
    info!("Metrics available at port {}", metrics_port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Serving momentum API at port {}", port);

    Ok(axum::serve(listener, app).await?)
}
