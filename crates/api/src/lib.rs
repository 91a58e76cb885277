pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    // An empty origin list means a development setup: allow everything.
    let cors = if state.settings.app.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = state
            .settings
            .app
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Auth routes
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me));

    // Post routes (listing / search-ad surface for the resolver)
    let post_routes = Router::new()
        .route("/property", post(routes::post::create_property))
        .route("/search-ad", post(routes::post::create_search_ad));

    // Collaboration lifecycle routes
    let collaboration_routes = Router::new()
        .route("/", get(routes::collaboration::list))
        .route("/", post(routes::collaboration::propose))
        .route(
            "/post/{post_type}/{post_id}",
            get(routes::collaboration::by_post),
        )
        .route("/{id}", get(routes::collaboration::get))
        .route("/{id}/respond", post(routes::collaboration::respond))
        .route("/{id}/note", post(routes::collaboration::add_note))
        .route("/{id}/progress", put(routes::collaboration::update_progress))
        .route("/{id}/cancel", post(routes::collaboration::cancel))
        .route("/{id}/complete", post(routes::collaboration::complete))
        .route("/{id}/contract", get(routes::contract::get))
        .route("/{id}/contract", put(routes::contract::update))
        .route("/{id}/contract/sign", post(routes::contract::sign));

    // Admin override routes
    let admin_routes = Router::new()
        .route(
            "/collaboration/{id}/force-close",
            post(routes::admin::force_close),
        )
        .route(
            "/collaboration/{id}/force-complete",
            post(routes::admin::force_complete),
        )
        .route("/collaboration/{id}", put(routes::admin::update))
        .route("/collaboration/{id}", delete(routes::admin::delete));

    // Compose API
    let api = Router::new()
        .nest("/auth", auth_routes)
        .merge(post_routes)
        .nest("/collaboration", collaboration_routes)
        .nest("/admin", admin_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
