use chrono::{TimeZone, Utc};
use post_reactions::error::AppError;
use post_reactions::handlers::reactions::get_reaction_types;
use post_reactions::models::{
    BatchReactionsRequest, REACTION_EMOJIS, REACTION_LABELS, Reaction, ReactionCounts,
    ReactionData, ReactionType,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

fn sample_reaction(reaction_type: ReactionType) -> Reaction {
    let created_at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
    Reaction {
        id: Uuid::new_v4(),
        reaction_type,
        user_id: Uuid::new_v4(),
        post_id: Uuid::new_v4(),
        created_at,
        updated_at: created_at,
    }
}

#[test]
fn reaction_keeps_wire_field_names() {
    let reaction = sample_reaction(ReactionType::Fire);
    let value = serde_json::to_value(&reaction).unwrap();

    assert_eq!(value["type"], json!("FIRE"));
    for field in ["id", "type", "userId", "postId", "createdAt", "updatedAt"] {
        assert!(value.get(field).is_some(), "missing {field}");
    }

    let back: Reaction = serde_json::from_value(value).unwrap();
    assert_eq!(back.reaction_type, ReactionType::Fire);
    assert_eq!(back, reaction);
}

#[test]
fn reaction_with_unknown_type_is_rejected() {
    let mut value = serde_json::to_value(sample_reaction(ReactionType::Like)).unwrap();
    value["type"] = json!("LOL");

    assert!(serde_json::from_value::<Reaction>(value).is_err());

    let error: AppError = "LOL".parse::<ReactionType>().unwrap_err().into();
    assert!(matches!(error, AppError::Validation(_)));
}

#[test]
fn zero_reactions_yield_total_counts() {
    let counts = ReactionCounts::from_pairs(std::iter::empty());

    assert_eq!(
        serde_json::to_value(counts).unwrap(),
        json!({ "LIKE": 0, "DISLIKE": 0, "FIRE": 0, "HEART": 0, "CRY": 0 })
    );
}

#[test]
fn reaction_data_round_trips_viewer_state() {
    let mut counts = ReactionCounts::new();
    counts.increment(ReactionType::Heart);

    let data = ReactionData::new(counts, Some(ReactionType::Heart));
    let value = serde_json::to_value(data).unwrap();
    assert_eq!(value["counts"]["HEART"], json!(1));
    assert_eq!(value["userReaction"], json!("HEART"));

    let anonymous: ReactionData = serde_json::from_value(json!({
        "counts": { "LIKE": 2, "DISLIKE": 0, "FIRE": 0, "HEART": 0, "CRY": 0 },
        "userReaction": null
    }))
    .unwrap();
    assert_eq!(anonymous.user_reaction, None);
    assert_eq!(anonymous.counts.get(ReactionType::Like), 2);
}

#[test]
fn display_tables_match_expected_glyphs() {
    let expected = [
        (ReactionType::Like, "👍", "Like"),
        (ReactionType::Dislike, "👎", "Dislike"),
        (ReactionType::Fire, "🔥", "Fire"),
        (ReactionType::Heart, "❤️", "Love"),
        (ReactionType::Cry, "😭", "Sad"),
    ];

    for (reaction_type, emoji, label) in expected {
        assert_eq!(&REACTION_EMOJIS[reaction_type], emoji);
        assert_eq!(&REACTION_LABELS[reaction_type], label);
    }
}

#[test]
fn batch_request_bounds_post_ids() {
    let empty = BatchReactionsRequest { post_ids: vec![] };
    assert!(empty.validate().is_err());

    let too_many = BatchReactionsRequest {
        post_ids: (0..101).map(|_| Uuid::new_v4()).collect(),
    };
    assert!(too_many.validate().is_err());

    let ok: BatchReactionsRequest =
        serde_json::from_value(json!({ "postIds": [Uuid::new_v4()] })).unwrap();
    assert!(ok.validate().is_ok());
}

#[tokio::test]
async fn reaction_types_endpoint_lists_catalog() {
    let body = get_reaction_types().await.0;
    let reactions = body["reactions"].as_array().unwrap();

    assert_eq!(reactions.len(), ReactionType::COUNT);
    assert_eq!(
        reactions[3],
        json!({ "type": "HEART", "emoji": "❤️", "label": "Love" })
    );
}
