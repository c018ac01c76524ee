use std::{fmt, ops::Index, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// The closed set of reactions a user can leave on a post.
///
/// The wire and database literal is the upper-case variant name. Adding a
/// variant means adding a row to both [`REACTION_EMOJIS`] and [`REACTION_LABELS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "reaction_type", rename_all = "UPPERCASE")]
pub enum ReactionType {
    Like,
    Dislike,
    Fire,
    Heart,
    Cry,
}

impl ReactionType {
    pub const COUNT: usize = 5;

    pub const ALL: [ReactionType; Self::COUNT] = [
        ReactionType::Like,
        ReactionType::Dislike,
        ReactionType::Fire,
        ReactionType::Heart,
        ReactionType::Cry,
    ];

    /// Position in [`ReactionType::ALL`], used to index the display tables.
    pub const fn index(self) -> usize {
        match self {
            ReactionType::Like => 0,
            ReactionType::Dislike => 1,
            ReactionType::Fire => 2,
            ReactionType::Heart => 3,
            ReactionType::Cry => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ReactionType::Like => "LIKE",
            ReactionType::Dislike => "DISLIKE",
            ReactionType::Fire => "FIRE",
            ReactionType::Heart => "HEART",
            ReactionType::Cry => "CRY",
        }
    }

    pub const fn emoji(self) -> &'static str {
        REACTION_EMOJIS.get(self)
    }

    pub const fn label(self) -> &'static str {
        REACTION_LABELS.get(self)
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown reaction type: {0}")]
pub struct ParseReactionTypeError(pub String);

// Exact literals only, "fire" or " FIRE" are rejected.
impl FromStr for ReactionType {
    type Err = ParseReactionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(ReactionType::Like),
            "DISLIKE" => Ok(ReactionType::Dislike),
            "FIRE" => Ok(ReactionType::Fire),
            "HEART" => Ok(ReactionType::Heart),
            "CRY" => Ok(ReactionType::Cry),
            _ => Err(ParseReactionTypeError(s.to_string())),
        }
    }
}

/// Read-only lookup from every [`ReactionType`] to a display string.
#[derive(Debug)]
pub struct DisplayTable([&'static str; ReactionType::COUNT]);

impl DisplayTable {
    pub const fn get(&self, reaction_type: ReactionType) -> &'static str {
        self.0[reaction_type.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReactionType, &'static str)> + '_ {
        ReactionType::ALL.into_iter().map(|t| (t, self.get(t)))
    }
}

impl Index<ReactionType> for DisplayTable {
    type Output = str;

    fn index(&self, reaction_type: ReactionType) -> &str {
        self.get(reaction_type)
    }
}

// Rows follow the order of ReactionType::ALL.
pub const REACTION_EMOJIS: DisplayTable = DisplayTable(["👍", "👎", "🔥", "❤️", "😭"]);

pub const REACTION_LABELS: DisplayTable =
    DisplayTable(["Like", "Dislike", "Fire", "Love", "Sad"]);

/// One user's reaction to one post, as stored in `post_reactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub reaction_type: ReactionType,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reaction {
    /// Switches the reaction to `reaction_type`. Returns `false` and leaves
    /// `updated_at` alone when the type is unchanged.
    pub fn change_type(&mut self, reaction_type: ReactionType, now: DateTime<Utc>) -> bool {
        if self.reaction_type == reaction_type {
            return false;
        }

        self.reaction_type = reaction_type;
        self.updated_at = now;
        true
    }
}

/// Per-post tally with one entry for every reaction type.
///
/// Deserialization requires all five keys and nothing else, so a partial map
/// coming from outside is rejected instead of being zero-filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", deny_unknown_fields)]
pub struct ReactionCounts {
    like: u64,
    dislike: u64,
    fire: u64,
    heart: u64,
    cry: u64,
}

impl ReactionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a total tally from `(type, count)` rows. Missing types stay at
    /// zero, repeated types are summed and negative counts are clamped.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ReactionType, i64)>,
    {
        let mut counts = Self::new();
        for (reaction_type, count) in pairs {
            let count = u64::try_from(count).unwrap_or(0);
            let slot = counts.slot_mut(reaction_type);
            *slot = slot.saturating_add(count);
        }
        counts
    }

    pub fn get(&self, reaction_type: ReactionType) -> u64 {
        match reaction_type {
            ReactionType::Like => self.like,
            ReactionType::Dislike => self.dislike,
            ReactionType::Fire => self.fire,
            ReactionType::Heart => self.heart,
            ReactionType::Cry => self.cry,
        }
    }

    pub fn set(&mut self, reaction_type: ReactionType, count: u64) {
        *self.slot_mut(reaction_type) = count;
    }

    pub fn increment(&mut self, reaction_type: ReactionType) {
        let slot = self.slot_mut(reaction_type);
        *slot = slot.saturating_add(1);
    }

    pub fn decrement(&mut self, reaction_type: ReactionType) {
        let slot = self.slot_mut(reaction_type);
        *slot = slot.saturating_sub(1);
    }

    pub fn total(&self) -> u64 {
        self.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReactionType, u64)> + '_ {
        ReactionType::ALL.into_iter().map(|t| (t, self.get(t)))
    }

    fn slot_mut(&mut self, reaction_type: ReactionType) -> &mut u64 {
        match reaction_type {
            ReactionType::Like => &mut self.like,
            ReactionType::Dislike => &mut self.dislike,
            ReactionType::Fire => &mut self.fire,
            ReactionType::Heart => &mut self.heart,
            ReactionType::Cry => &mut self.cry,
        }
    }
}

/// What a display layer needs for one post: the tally plus the viewer's own
/// reaction, `null` when they have not reacted or are anonymous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionData {
    pub counts: ReactionCounts,
    pub user_reaction: Option<ReactionType>,
}

impl ReactionData {
    pub fn new(counts: ReactionCounts, user_reaction: Option<ReactionType>) -> Self {
        Self {
            counts,
            user_reaction,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionMeta {
    #[serde(rename = "type")]
    pub reaction_type: ReactionType,
    pub emoji: &'static str,
    pub label: &'static str,
}

pub fn reaction_catalog() -> Vec<ReactionMeta> {
    ReactionType::ALL
        .into_iter()
        .map(|reaction_type| ReactionMeta {
            reaction_type,
            emoji: reaction_type.emoji(),
            label: reaction_type.label(),
        })
        .collect()
}

// Reaction request. The type is kept as a raw string so that unknown literals
// surface as a validation error instead of a body rejection.
#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    #[serde(rename = "type")]
    pub reaction_type: String,
}

// Reaction response
#[derive(Debug, Serialize)]
pub struct ReactResponse {
    pub reaction: Reaction,
    pub data: ReactionData,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchReactionsRequest {
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 post ids are allowed"))]
    pub post_ids: Vec<Uuid>,
}

/// Published on `post_reactions:{post_id}` after every change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionEvent {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub user_reaction: Option<ReactionType>,
    pub counts: ReactionCounts,
    pub occurred_at: DateTime<Utc>,
}
