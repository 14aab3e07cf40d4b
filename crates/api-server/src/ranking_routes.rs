use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ranking_core::{RankedEtf, RankingError};
use std::sync::Arc;

use crate::{ApiResponse, AppError, AppState};

const RANKING_UNAVAILABLE: &str = "Unable to compute ETF ranking at the moment.";
const MARKET_DATA_UNAVAILABLE: &str = "Unable to retrieve market data at the moment.";

pub fn ranking_routes() -> Router<AppState> {
    Router::new()
        .route("/api/market", get(get_market_data))
        .route("/api/market/ranking", get(get_ranking))
        .route("/api/market/ranking/:symbol", get(get_ranked_etf))
        .route("/api/market/validation", get(get_empty_indicators))
}

/// Provider payload, passed through with its own status
async fn get_market_data(State(state): State<AppState>) -> Result<Response, AppError> {
    let snapshot = state.service.market_snapshot().await.map_err(|e| {
        tracing::error!("Market data fetch failed: {}", e);
        AppError::Unavailable(MARKET_DATA_UNAVAILABLE)
    })?;

    let status = StatusCode::from_u16(snapshot.status).unwrap_or(StatusCode::OK);
    Ok((status, Json(snapshot)).into_response())
}

async fn get_ranking(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Arc<Vec<RankedEtf>>>>, AppError> {
    let ranked = state.service.fetch_ranked_etfs().await.map_err(|e| {
        tracing::error!("Failed to compute ETF ranking: {}", e);
        AppError::Unavailable(RANKING_UNAVAILABLE)
    })?;

    Ok(Json(ApiResponse::success(ranked)))
}

async fn get_ranked_etf(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<RankedEtf>>, AppError> {
    match state.service.find_etf(&symbol).await {
        Ok(etf) => Ok(Json(ApiResponse::success(etf))),
        Err(RankingError::NotFound(symbol)) => {
            Err(AppError::NotFound(format!("ETF '{}' is not in the ranking", symbol)))
        }
        Err(e) => {
            tracing::error!("Failed to compute ETF ranking: {}", e);
            Err(AppError::Unavailable(RANKING_UNAVAILABLE))
        }
    }
}

async fn get_empty_indicators(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let empty = state.service.empty_indicators().await.map_err(|e| {
        tracing::error!("Indicator validation failed: {}", e);
        AppError::Unavailable(MARKET_DATA_UNAVAILABLE)
    })?;

    Ok(Json(ApiResponse::success(empty)))
}
