use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{export, handlers, middleware::metrics_middleware, summary};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Rendering routes
    let render_routes = Router::new()
        .route("/export", post(export::export))
        .route("/summary", post(summary::summary));

    Router::new()
        .nest("/openscad/v1", render_routes.clone())
        // Unversioned aliases
        .merge(render_routes)
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
