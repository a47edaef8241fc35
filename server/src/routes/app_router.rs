use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{server_config::cfg, ServerState};

use super::handlers::{classify, health};

pub struct AppRouter;

impl AppRouter {
    pub fn create(state: ServerState) -> Router {
        let origins = cfg
            .http
            .cors_origins
            .iter()
            .map(|origin| origin.parse::<HeaderValue>().expect("Invalid CORS origin"))
            .collect::<Vec<_>>();

        let cors_layer = CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any);

        Router::new()
            .route("/", get(|| async { "Mailtriage server" }))
            .route("/health", get(health::health_check))
            .nest(
                "/classify",
                Router::new()
                    .route("/text", post(classify::classify_text))
                    .route(
                        "/file",
                        post(classify::classify_file)
                            .layer(DefaultBodyLimit::max(cfg.http.max_upload_bytes)),
                    )
                    .with_state(state.clone()),
            )
            .layer(cors_layer)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
