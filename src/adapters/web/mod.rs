//! JSON HTTP adapter.
//!
//! Exposes the journal over a small REST surface:
//!
//! | Method | Path                     | Operation               |
//! |--------|--------------------------|-------------------------|
//! | GET    | `/api/trades`            | list (`?status=`)       |
//! | POST   | `/api/trades`            | create                  |
//! | GET    | `/api/trades/{id}`       | get                     |
//! | PUT    | `/api/trades/{id}`       | update                  |
//! | DELETE | `/api/trades/{id}`       | delete                  |
//! | PUT    | `/api/trades/{id}/close` | close                   |
//! | GET    | `/api/stats`             | dashboard statistics    |
//! | GET    | `/api/health`            | storage ping            |

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::domain::journal::Journal;
use crate::ports::trade_store::TradeStore;

pub type SharedStore = Arc<dyn TradeStore + Send + Sync>;

pub struct AppState {
    pub journal: Journal<SharedStore>,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        AppState {
            journal: Journal::new(store),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::welcome))
        .route("/api/health", get(handlers::health))
        .route(
            "/api/trades",
            get(handlers::list_trades).post(handlers::create_trade),
        )
        .route(
            "/api/trades/{id}",
            get(handlers::get_trade)
                .put(handlers::update_trade)
                .delete(handlers::delete_trade),
        )
        .route("/api/trades/{id}/close", put(handlers::close_trade))
        .route("/api/stats", get(handlers::stats))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
