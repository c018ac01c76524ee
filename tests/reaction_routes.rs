use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use post_reactions::{AppState, config::Config, create_app, redis::RedisClient};
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

// Neither Postgres nor Redis is contacted: every request below is answered
// before the handlers reach the database or the cache.
fn app() -> Router {
    let config = Config {
        database_url: "postgres://reactions@127.0.0.1:5432/reactions".to_string(),
        redis_url: "redis://127.0.0.1:6379".to_string(),
        jwt_secret: "test-secret".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        allowed_origins: vec!["http://localhost:5173".to_string()],
        db_max_connections: 1,
        db_min_connections: 0,
        db_acquire_timeout_secs: 1,
        reaction_rate_limit: 100,
        reaction_rate_window_secs: 3600,
        counts_cache_ttl_secs: 60,
    };

    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .unwrap();
    let redis = RedisClient::new(&config.redis_url).unwrap();

    create_app(AppState {
        db,
        redis: Arc::new(redis),
        config: Arc::new(config),
    })
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn list_rejects_unknown_type_filter() {
    let uri = format!("/api/posts/{}/reactions/list?type=lol", Uuid::new_v4());
    let (status, body) = send(get(&uri)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));
    assert!(body["error"].as_str().unwrap().contains("lol"));
}

#[tokio::test]
async fn list_rejects_out_of_range_limit() {
    let uri = format!("/api/posts/{}/reactions/list?limit=0", Uuid::new_v4());
    let (status, body) = send(get(&uri)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn reaction_types_are_served() {
    let (status, body) = send(get("/api/reactions/types")).await;

    assert_eq!(status, StatusCode::OK);
    let reactions = body["reactions"].as_array().unwrap();
    assert_eq!(reactions.len(), 5);
    assert_eq!(reactions[0], json!({ "type": "LIKE", "emoji": "👍", "label": "Like" }));
}

#[tokio::test]
async fn batch_requires_at_least_one_post() {
    let request = json_request("POST", "/api/reactions/batch", json!({ "postIds": [] }));
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));
}

#[tokio::test]
async fn reacting_requires_a_bearer_token() {
    let uri = format!("/api/posts/{}/reactions", Uuid::new_v4());
    let request = json_request("PUT", &uri, json!({ "type": "FIRE" }));
    let (status, body) = send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Missing authorization header"));
}

#[tokio::test]
async fn removing_requires_a_bearer_token() {
    let uri = format!("/api/posts/{}/reactions", Uuid::new_v4());
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
