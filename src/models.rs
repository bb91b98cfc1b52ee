use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub title: String,
    pub content: String,
    pub game_name: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: Option<u8>, // 1-10
    #[serde(default)]
    pub cover_image: Option<String>,
    pub author_id: String,
    pub author_username: String,
    #[serde(default)]
    pub collaborators: Vec<String>, // user ids
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub review_id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularGame {
    pub game_name: String,
    pub review_count: u32,
    pub total_likes: i64,
    #[serde(default)]
    pub avg_rating: Option<f64>,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub popularity_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty() && self.users.is_empty()
    }
}

/// Body of a successful `auth/login` or `auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LikeState {
    pub liked: bool,
}

/// Payload for both creating and updating a review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReview {
    pub title: String,
    pub content: String,
    pub game_name: String,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Registration<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewComment<'a> {
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssistRequest<'a> {
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssistReply {
    pub suggestion: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExplainRequest<'a> {
    pub word: &'a str,
    pub context: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExplainReply {
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Categories {
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PopularGames {
    pub popular_games: Vec<PopularGame>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Acknowledgement {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn review_fills_missing_counters() {
        let review: Review = serde_json::from_value(json!({
            "id": "r1",
            "title": "Worth it",
            "content": "Long read",
            "game_name": "Hades",
            "category": "Rogue-like",
            "author_id": "u1",
            "author_username": "zag",
            "created_at": "2025-03-01T12:00:00Z"
        }))
        .unwrap();
        assert!(review.tags.is_empty());
        assert_eq!(review.likes_count, 0);
        assert_eq!(review.rating, None);
        assert_eq!(review.updated_at, None);
    }

    #[test]
    fn new_review_omits_absent_optionals() {
        let body = serde_json::to_value(NewReview {
            title: "t".into(),
            content: "c".into(),
            game_name: "g".into(),
            category: "RPG".into(),
            tags: vec![],
            rating: None,
            cover_image: None,
        })
        .unwrap();
        assert!(body.get("rating").is_none());
        assert!(body.get("cover_image").is_none());
        assert_eq!(body["tags"], json!([]));
    }
}
