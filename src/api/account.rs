use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::db::AccountState;
use crate::domain::{ChartLayout, Favorites, InstrumentId};
use crate::error::{AppError, CommandError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    pub name: String,
    pub broker_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub needs_setup: bool,
    #[serde(flatten)]
    pub account: AccountState,
}

impl From<AccountState> for AccountResponse {
    fn from(account: AccountState) -> Self {
        Self {
            needs_setup: account.needs_setup(),
            account,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub instrument_id: InstrumentId,
    pub favorite: bool,
    pub favorites: Favorites,
}

pub async fn get_account(State(state): State<AppState>) -> Result<Json<AccountResponse>, AppError> {
    Ok(Json(state.prefs.account().await?.into()))
}

pub async fn setup_account(
    State(state): State<AppState>,
    Json(request): Json<SetupRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state
        .prefs
        .complete_setup(&request.name, &request.broker_id)
        .await?;
    Ok(Json(account.into()))
}

pub async fn list_favorites(State(state): State<AppState>) -> Result<Json<Favorites>, AppError> {
    Ok(Json(state.prefs.favorites().await?))
}

pub async fn toggle_favorite(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ToggleResponse>, AppError> {
    let id = InstrumentId::new(id);
    let lookup = id.clone();
    let known = state
        .terminal
        .read(move |sim| sim.instrument(&lookup).is_some())
        .await?;
    if !known {
        return Err(CommandError::UnknownInstrument(id.to_string()).into());
    }

    let favorites = state.prefs.toggle_favorite(&id).await?;
    Ok(Json(ToggleResponse {
        favorite: favorites.contains(&id),
        instrument_id: id,
        favorites,
    }))
}

pub async fn list_layouts(State(state): State<AppState>) -> Result<Json<Vec<ChartLayout>>, AppError> {
    Ok(Json(state.prefs.layouts().await?))
}

pub async fn save_layout(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(mut layout): Json<ChartLayout>,
) -> Result<Json<Vec<ChartLayout>>, AppError> {
    if layout.name.trim().is_empty() {
        return Err(AppError::BadRequest("Layout name must not be empty".into()));
    }
    layout.id = id;
    Ok(Json(state.prefs.save_layout(layout).await?))
}

pub async fn delete_layout(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    if state.prefs.delete_layout(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Layout {}", id)))
    }
}
