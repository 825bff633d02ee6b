use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::AppState;
use crate::domain::{Decimal, TransferRecord};
use crate::engine::PortfolioValuation;
use crate::error::AppError;

const DEFAULT_METHOD: &str = "Bank Transfer";

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub method: Option<String>,
}

impl TransferRequest {
    fn into_parts(self) -> (Decimal, String) {
        let method = self
            .method
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_METHOD.to_string());
        (self.amount, method)
    }
}

pub async fn get_portfolio(
    State(state): State<AppState>,
) -> Result<Json<PortfolioValuation>, AppError> {
    Ok(Json(state.terminal.read(|sim| sim.portfolio()).await?))
}

pub async fn list_transfers(
    State(state): State<AppState>,
) -> Result<Json<Vec<TransferRecord>>, AppError> {
    Ok(Json(state.terminal.read(|sim| sim.transfers()).await?))
}

pub async fn deposit(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferRecord>), AppError> {
    let (amount, method) = request.into_parts();
    let record = state.terminal.deposit(amount, method).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferRecord>), AppError> {
    let (amount, method) = request.into_parts();
    let record = state.terminal.withdraw(amount, method).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
