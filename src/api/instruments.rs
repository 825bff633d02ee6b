use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::AppState;
use crate::commentary::{MarketInsight, NewsArticle};
use crate::domain::{Category, Instrument, InstrumentId};
use crate::error::{AppError, CommandError};

#[derive(Debug, Deserialize)]
pub struct InstrumentsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDto {
    #[serde(flatten)]
    pub instrument: Instrument,
    /// Price at the category's display precision.
    pub display_price: String,
    pub favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    /// Null when commentary is unavailable.
    pub insight: Option<MarketInsight>,
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub category: String,
    pub articles: Vec<NewsArticle>,
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    raw.parse::<Category>().map_err(AppError::BadRequest)
}

pub async fn list_instruments(
    Query(params): Query<InstrumentsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<InstrumentDto>>, AppError> {
    let category = params.category.as_deref().map(parse_category).transpose()?;
    let favorites = state.prefs.favorites().await?;

    let instruments = state
        .terminal
        .read(move |sim| {
            sim.instruments()
                .filter(|i| category.map_or(true, |c| i.category == c))
                .cloned()
                .collect::<Vec<_>>()
        })
        .await?;

    Ok(Json(
        instruments
            .into_iter()
            .map(|instrument| InstrumentDto {
                display_price: instrument.display_price(),
                favorite: favorites.contains(&instrument.id),
                instrument,
            })
            .collect(),
    ))
}

pub async fn get_insight(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<InsightResponse>, AppError> {
    let id = InstrumentId::new(id);
    let lookup = id.clone();
    let instrument = state
        .terminal
        .read(move |sim| sim.instrument(&lookup).cloned())
        .await?
        .ok_or_else(|| CommandError::UnknownInstrument(id.to_string()))?;

    let insight = match state
        .commentary
        .get_insight(&instrument.symbol, &instrument.name)
        .await
    {
        Ok(insight) => Some(insight),
        Err(e) => {
            warn!(symbol = %instrument.symbol, error = %e, "Commentary unavailable");
            None
        }
    };

    Ok(Json(InsightResponse { insight }))
}

pub async fn get_news(
    Query(params): Query<NewsQuery>,
    State(state): State<AppState>,
) -> Result<Json<NewsResponse>, AppError> {
    let category = match params.category.as_deref() {
        Some(raw) => parse_category(raw)?,
        None => Category::Crypto,
    };

    let articles = match state.news.get_news(category.as_str()).await {
        Ok(articles) => articles,
        Err(e) => {
            warn!(category = category.as_str(), error = %e, "News unavailable");
            Vec::new()
        }
    };

    Ok(Json(NewsResponse {
        category: category.as_str().to_string(),
        articles,
    }))
}
