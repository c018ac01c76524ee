use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Path, Query, Request, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::{AppError, Result},
    models::{
        BatchReactionsRequest, ReactRequest, ReactResponse, ReactionCounts, ReactionData,
        ReactionEvent, ReactionType, reaction_catalog,
    },
    services::reaction_service,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ListReactionsQuery {
    #[validate(range(min = 1, message = "Page starts at 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u32>,
    #[serde(rename = "type")]
    pub reaction_type: Option<String>,
}

/// Request body of `PUT /api/posts/{post_id}/reactions`, parsed strictly.
///
/// Both a malformed body and an unknown `type` literal are rejected with the
/// standard JSON error body and a 400.
#[derive(Debug)]
pub struct ReactionChoice(pub ReactionType);

impl<S> FromRequest<S> for ReactionChoice
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(payload) = Json::<ReactRequest>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        Ok(ReactionChoice(payload.reaction_type.parse()?))
    }
}

pub async fn get_reaction_types() -> Json<Value> {
    Json(json!({ "reactions": reaction_catalog() }))
}

pub async fn get_post_reactions(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<ReactionData>> {
    let counts = load_counts(&state, post_id).await?;
    let data =
        reaction_service::get_reaction_data(&state.db, post_id, counts, viewer.user_id()).await?;

    Ok(Json(data))
}

pub async fn react_to_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
    ReactionChoice(reaction_type): ReactionChoice,
) -> Result<Json<ReactResponse>> {
    // Rate limiting for reacting
    let rate_limit_key = format!("react_post:{}", auth_user.user_id);
    if !state
        .redis
        .check_rate_limit(
            &rate_limit_key,
            state.config.reaction_rate_limit,
            state.config.reaction_rate_window_secs,
        )
        .await?
    {
        return Err(AppError::RateLimit);
    }

    let reaction =
        reaction_service::upsert_reaction(&state.db, post_id, auth_user.user_id, reaction_type)
            .await?;

    let counts = refresh_counts(&state, post_id).await?;
    let data = ReactionData::new(counts, Some(reaction.reaction_type));

    tracing::info!(
        "{} reacted {} to post {}",
        auth_user.username,
        reaction.reaction_type,
        post_id
    );
    announce(&state, post_id, auth_user.user_id, &data).await;

    Ok(Json(ReactResponse { reaction, data }))
}

pub async fn remove_post_reaction(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let removed = reaction_service::remove_reaction(&state.db, post_id, auth_user.user_id).await?;

    if !removed {
        return Err(AppError::NotFound("Reaction not found".to_string()));
    }

    let counts = refresh_counts(&state, post_id).await?;
    let data = ReactionData::new(counts, None);

    tracing::info!("{} removed their reaction from post {}", auth_user.username, post_id);
    announce(&state, post_id, auth_user.user_id, &data).await;

    Ok(Json(json!({
        "message": "Reaction removed successfully",
        "data": data
    })))
}

pub async fn list_post_reactions(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(query): Query<ListReactionsQuery>,
) -> Result<Json<Value>> {
    query.validate()?;

    let reaction_type = query
        .reaction_type
        .as_deref()
        .map(str::parse::<ReactionType>)
        .transpose()?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(25);
    let offset = (page - 1).saturating_mul(limit);

    let reactions =
        reaction_service::list_post_reactions(&state.db, post_id, reaction_type, limit, offset)
            .await?;
    let total = reaction_service::count_post_reactions(&state.db, post_id, reaction_type).await?;

    Ok(Json(json!({
        "reactions": reactions,
        "total": total,
        "page": page,
        "limit": limit
    })))
}

pub async fn batch_reactions(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Json(payload): Json<BatchReactionsRequest>,
) -> Result<Json<HashMap<Uuid, ReactionData>>> {
    payload.validate()?;

    let data =
        reaction_service::get_reaction_data_batch(&state.db, &payload.post_ids, viewer.user_id())
            .await?;

    Ok(Json(data))
}

// Cache-aside read of a post's counts. Redis trouble falls back to the database.
async fn load_counts(state: &AppState, post_id: Uuid) -> Result<ReactionCounts> {
    match state.redis.get_cached_reaction_counts(post_id).await {
        Ok(Some(counts)) => return Ok(counts),
        Ok(None) => {}
        Err(e) => tracing::warn!("Reaction count cache read failed for {}: {}", post_id, e),
    }

    refresh_counts(state, post_id).await
}

// Reads the tally from the database and overwrites the cached copy. Writers
// call this after their change, so pre-write counts stored by an earlier
// read-through are replaced rather than deleted.
async fn refresh_counts(state: &AppState, post_id: Uuid) -> Result<ReactionCounts> {
    let counts = reaction_service::get_reaction_counts(&state.db, post_id).await?;

    if let Err(e) = state
        .redis
        .cache_reaction_counts(post_id, &counts, state.config.counts_cache_ttl_secs)
        .await
    {
        tracing::warn!("Reaction count cache write failed for {}: {}", post_id, e);
    }

    Ok(counts)
}

async fn announce(state: &AppState, post_id: Uuid, user_id: Uuid, data: &ReactionData) {
    let event = ReactionEvent {
        post_id,
        user_id,
        user_reaction: data.user_reaction,
        counts: data.counts,
        occurred_at: chrono::Utc::now(),
    };

    if let Err(e) = state.redis.publish_reaction_event(&event).await {
        tracing::warn!("Failed to publish reaction event for {}: {}", post_id, e);
    }
}
