use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{InstrumentId, Order, OrderId, OrderStatus};
use crate::engine::OpenTrade;
use crate::error::AppError;
use crate::terminal::PlaceOrder;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub instrument_id: Option<String>,
}

fn parse_order_id(raw: &str) -> Result<OrderId, AppError> {
    OrderId::from_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid order id: {}", raw)))
}

pub async fn list_orders(
    Query(params): Query<OrdersQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(|s| {
            OrderStatus::from_str(s)
                .map_err(|_| AppError::BadRequest(format!("Invalid status: {}", s)))
        })
        .transpose()?;
    let instrument = params.instrument_id.map(InstrumentId::new);

    let orders = state
        .terminal
        .read(move |sim| match instrument {
            Some(id) => sim
                .orders_for_instrument(&id)
                .into_iter()
                .filter(|o| status.map_or(true, |s| o.status == s))
                .collect(),
            None => sim.orders(status),
        })
        .await?;

    Ok(Json(orders))
}

pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = state.terminal.place_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn cancel_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Order>, AppError> {
    let id = parse_order_id(&id)?;
    Ok(Json(state.terminal.cancel_order(id).await?))
}

pub async fn move_stop_to_entry(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Order>, AppError> {
    let id = parse_order_id(&id)?;
    Ok(Json(state.terminal.move_stop_to_entry(id).await?))
}

pub async fn open_trades(State(state): State<AppState>) -> Result<Json<Vec<OpenTrade>>, AppError> {
    Ok(Json(state.terminal.read(|sim| sim.open_trades()).await?))
}
