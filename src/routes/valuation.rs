use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::AnalysisResponse;
use crate::services::{csv_ingest_service, portfolio_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    // Trailing slash kept for the existing frontend.
    Router::new().route("/calculate_multi_year_gain/", post(calculate_multi_year_gain))
}

async fn calculate_multi_year_gain(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    info!("POST /calculate_multi_year_gain/ - Analyzing transaction export");

    let mut upload: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Unreadable multipart upload: {}", e)))?
    {
        if field.name() != Some("csv_file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        if !filename.to_lowercase().ends_with(".csv") {
            return Err(AppError::Validation(format!(
                "Expected a .csv upload, got '{}'",
                filename
            )));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read csv_file field: {}", e)))?;
        upload = Some(bytes.to_vec());
    }
    let upload = upload.ok_or_else(|| {
        AppError::Validation("Upload is missing the csv_file field".to_string())
    })?;

    let transactions = csv_ingest_service::parse_transactions(&upload).map_err(|e| {
        error!("Rejecting transaction export: {:#}", e);
        AppError::Csv(format!("{:#}", e))
    })?;

    let response = portfolio_service::analyze_portfolio(
        state.ticker_resolver.as_ref(),
        state.price_provider.as_ref(),
        &state.resolution_cache,
        &state.config,
        transactions,
        Utc::now().date_naive(),
    )
    .await;
    Ok(Json(response))
}
