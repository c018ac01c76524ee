use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{Reaction, ReactionCounts, ReactionData, ReactionType},
};

pub async fn get_user_reaction(
    db: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Reaction>> {
    let reaction = sqlx::query_as::<_, Reaction>(
        "SELECT * FROM post_reactions WHERE post_id = $1 AND user_id = $2",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(reaction)
}

/// Creates the user's reaction to a post or switches it to `reaction_type`.
///
/// The unique (user_id, post_id) index keeps a single live row per pair. The
/// row is locked for the rest of the transaction, so concurrent changes by the
/// same user are applied one after the other. The original `id` and
/// `created_at` are always kept.
pub async fn upsert_reaction(
    db: &PgPool,
    post_id: Uuid,
    user_id: Uuid,
    reaction_type: ReactionType,
) -> Result<Reaction> {
    let now = Utc::now();
    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO post_reactions (id, reaction_type, user_id, post_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        ON CONFLICT (user_id, post_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(reaction_type)
    .bind(user_id)
    .bind(post_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let mut reaction = sqlx::query_as::<_, Reaction>(
        "SELECT * FROM post_reactions WHERE post_id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    if reaction.change_type(reaction_type, now) {
        sqlx::query("UPDATE post_reactions SET reaction_type = $1, updated_at = $2 WHERE id = $3")
            .bind(reaction.reaction_type)
            .bind(reaction.updated_at)
            .bind(reaction.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    tracing::debug!(
        "Reaction {} on post {} by user {} is now {}",
        reaction.id,
        post_id,
        user_id,
        reaction.reaction_type
    );

    Ok(reaction)
}

/// Returns `false` when the user had no reaction on the post.
pub async fn remove_reaction(db: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM post_reactions WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_post_reactions(
    db: &PgPool,
    post_id: Uuid,
    reaction_type: Option<ReactionType>,
    limit: u32,
    offset: u32,
) -> Result<Vec<Reaction>> {
    let reactions = sqlx::query_as::<_, Reaction>(
        r#"
        SELECT * FROM post_reactions
        WHERE post_id = $1 AND ($2::reaction_type IS NULL OR reaction_type = $2)
        ORDER BY created_at DESC, id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(post_id)
    .bind(reaction_type)
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(db)
    .await?;

    Ok(reactions)
}

pub async fn count_post_reactions(
    db: &PgPool,
    post_id: Uuid,
    reaction_type: Option<ReactionType>,
) -> Result<u64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM post_reactions
        WHERE post_id = $1 AND ($2::reaction_type IS NULL OR reaction_type = $2)
        "#,
    )
    .bind(post_id)
    .bind(reaction_type)
    .fetch_one(db)
    .await?;

    Ok(count.max(0) as u64)
}

pub async fn get_reaction_counts(db: &PgPool, post_id: Uuid) -> Result<ReactionCounts> {
    let rows = sqlx::query_as::<_, (ReactionType, i64)>(
        r#"
        SELECT reaction_type, COUNT(*) AS count
        FROM post_reactions
        WHERE post_id = $1
        GROUP BY reaction_type
        "#,
    )
    .bind(post_id)
    .fetch_all(db)
    .await?;

    Ok(ReactionCounts::from_pairs(rows))
}

/// Single-post read-model. `counts` comes from the caller so that it can be
/// served from the cache; only the viewer's own reaction is read here.
pub async fn get_reaction_data(
    db: &PgPool,
    post_id: Uuid,
    counts: ReactionCounts,
    viewer_id: Option<Uuid>,
) -> Result<ReactionData> {
    let user_reaction = match viewer_id {
        Some(user_id) => get_user_reaction(db, post_id, user_id)
            .await?
            .map(|r| r.reaction_type),
        None => None,
    };

    Ok(ReactionData::new(counts, user_reaction))
}

/// Read-model for a page of posts. Every requested id gets an entry, zeroed
/// when the post has no reactions.
pub async fn get_reaction_data_batch(
    db: &PgPool,
    post_ids: &[Uuid],
    viewer_id: Option<Uuid>,
) -> Result<HashMap<Uuid, ReactionData>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let count_rows = sqlx::query_as::<_, (Uuid, ReactionType, i64)>(
        r#"
        SELECT post_id, reaction_type, COUNT(*) AS count
        FROM post_reactions
        WHERE post_id = ANY($1)
        GROUP BY post_id, reaction_type
        "#,
    )
    .bind(post_ids)
    .fetch_all(db)
    .await?;

    let viewer_rows = match viewer_id {
        Some(user_id) => {
            sqlx::query_as::<_, (Uuid, ReactionType)>(
                r#"
                SELECT post_id, reaction_type
                FROM post_reactions
                WHERE user_id = $1 AND post_id = ANY($2)
                "#,
            )
            .bind(user_id)
            .bind(post_ids)
            .fetch_all(db)
            .await?
        }
        None => Vec::new(),
    };

    Ok(assemble_batch(post_ids, count_rows, viewer_rows))
}

fn assemble_batch(
    post_ids: &[Uuid],
    count_rows: Vec<(Uuid, ReactionType, i64)>,
    viewer_rows: Vec<(Uuid, ReactionType)>,
) -> HashMap<Uuid, ReactionData> {
    let mut grouped: HashMap<Uuid, Vec<(ReactionType, i64)>> = HashMap::new();
    for (post_id, reaction_type, count) in count_rows {
        grouped.entry(post_id).or_default().push((reaction_type, count));
    }

    let viewer: HashMap<Uuid, ReactionType> = viewer_rows.into_iter().collect();

    post_ids
        .iter()
        .map(|post_id| {
            let counts = grouped
                .get(post_id)
                .map(|rows| ReactionCounts::from_pairs(rows.iter().copied()))
                .unwrap_or_default();
            (*post_id, ReactionData::new(counts, viewer.get(post_id).copied()))
        })
        .collect()
}
