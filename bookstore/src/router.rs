use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoint;
use crate::books::book_operations::CachedBookModel;
use crate::config::Config;

#[derive(Clone)]
pub struct State {
    pub book_model: Arc<CachedBookModel>,
    pub config: Config,
}

pub fn router(book_model: Arc<CachedBookModel>, config: Config) -> Router {
    let state = State {
        book_model,
        config: config.clone(),
    };

    // liveness checks
    let status_router = Router::new()
        .route("/", get(index))
        .route("/_liveness", get(liveness));

    let book_router = Router::new()
        .route("/book/add", post(endpoint::add))
        .route("/book/check", post(endpoint::check))
        .route("/book/update", post(endpoint::update))
        .route("/book/remove", post(endpoint::remove))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrency));

    Router::new()
        .merge(status_router)
        .merge(book_router)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn index() -> &'static str {
    "bookstore"
}

async fn liveness() -> &'static str {
    "ok"
}
