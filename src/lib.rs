pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod redis;
pub mod services;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, redis::RedisClient};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: Arc<RedisClient>,
    pub config: Arc<Config>,
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid allowed origin: {}", origin);
                        None
                    }
                })
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    // Public and optionally authenticated routes
    let read_routes = Router::new()
        .route(
            "/api/reactions/types",
            get(handlers::reactions::get_reaction_types),
        )
        .route(
            "/api/reactions/batch",
            post(handlers::reactions::batch_reactions),
        )
        .route(
            "/api/posts/{post_id}/reactions/list",
            get(handlers::reactions::list_post_reactions),
        );

    // Reacting requires a session; reading the tally does not
    let reaction_routes = Router::new().route(
        "/api/posts/{post_id}/reactions",
        get(handlers::reactions::get_post_reactions)
            .put(handlers::reactions::react_to_post)
            .delete(handlers::reactions::remove_post_reaction),
    );

    Router::new()
        .merge(read_routes)
        .merge(reaction_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
