pub mod account;
pub mod health;
pub mod instruments;
pub mod orders;
pub mod portfolio;

use crate::commentary::{CommentaryProvider, NewsProvider};
use crate::db::PreferencesStore;
use crate::terminal::TerminalHandle;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub terminal: TerminalHandle,
    pub prefs: Arc<PreferencesStore>,
    pub commentary: Arc<dyn CommentaryProvider>,
    pub news: Arc<dyn NewsProvider>,
}

impl AppState {
    pub fn new(
        terminal: TerminalHandle,
        prefs: Arc<PreferencesStore>,
        commentary: Arc<dyn CommentaryProvider>,
        news: Arc<dyn NewsProvider>,
    ) -> Self {
        Self {
            terminal,
            prefs,
            commentary,
            news,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/instruments", get(instruments::list_instruments))
        .route(
            "/v1/instruments/:id/insight",
            get(instruments::get_insight),
        )
        .route("/v1/news", get(instruments::get_news))
        .route(
            "/v1/orders",
            get(orders::list_orders).post(orders::place_order),
        )
        .route("/v1/orders/:id/cancel", post(orders::cancel_order))
        .route("/v1/orders/:id/move-stop", post(orders::move_stop_to_entry))
        .route("/v1/trades/open", get(orders::open_trades))
        .route("/v1/portfolio", get(portfolio::get_portfolio))
        .route("/v1/transfers", get(portfolio::list_transfers))
        .route("/v1/transfers/deposit", post(portfolio::deposit))
        .route("/v1/transfers/withdraw", post(portfolio::withdraw))
        .route("/v1/account", get(account::get_account))
        .route("/v1/account/setup", post(account::setup_account))
        .route("/v1/favorites", get(account::list_favorites))
        .route("/v1/favorites/:id/toggle", post(account::toggle_favorite))
        .route("/v1/layouts", get(account::list_layouts))
        .route(
            "/v1/layouts/:id",
            put(account::save_layout).delete(account::delete_layout),
        )
        .layer(cors)
        .with_state(state)
}
