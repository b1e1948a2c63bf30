use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use palisade_core::rate_limit::RateLimiter;
use palisade_core::session::SessionStore;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod audit;
mod clients;
mod config;
mod error;
mod extract;
mod middleware;
mod pipeline;
mod routes;
mod state;

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palisade_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::AppConfig::from_env();

    // Guard-stage state, constructed once and shared by reference.
    let limiter = Arc::new(RateLimiter::new(config.rate_limit));
    let sessions = Arc::new(SessionStore::new(config.session));

    let agent = Arc::new(clients::agent::HttpAgentClient::new(
        config.agent_url.clone(),
    ));
    let object_store = Arc::new(clients::object_store::HttpObjectStore::new(
        config.object_store_url.clone(),
    ));

    let pipeline = Arc::new(pipeline::Pipeline::new(
        config.max_input_length,
        config.debug_audit,
        limiter,
        sessions.clone(),
        agent,
        object_store,
    ));

    let app_state = state::AppState { pipeline, sessions };

    // Router with per-endpoint edge rate limiting
    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::ask::router().layer(middleware::rate_limit::ask_layer()))
        .merge(routes::session::router().layer(middleware::rate_limit::session_layer()))
        .layer(middleware::access_log::AccessLogLayer::new())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(
                    middleware::security_headers::apply,
                )),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Palisade API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
