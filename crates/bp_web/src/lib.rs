use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/posts", get(handlers::list_posts))
        .route("/api/posts/:id", get(handlers::get_post))
        .route("/api/fetch", get(handlers::fetch_status).post(handlers::trigger_fetch))
        .route("/api/proxy-image", get(handlers::proxy_image))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use bp_core::{Error, Post, Result};
    pub use crate::{create_app, AppState};
}
