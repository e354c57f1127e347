use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{NotificationType, ToggleOutcome};

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// Public view of a user embedded in posts, comments and threads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub tags: Vec<String>,
    pub category: String,
    pub sponsored: bool,
    pub is_draft: bool,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub saves_count: i64,
    pub shares_count: i64,
}

/// Feed entry: a post with its author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: UserSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: UserSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<UserSummary>,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageThread {
    pub id: Uuid,
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
    pub unread_for_user_a: i64,
    pub unread_for_user_b: i64,
}

impl MessageThread {
    pub fn has_participant(&self, user_id: &Uuid) -> bool {
        self.user_a_id == *user_id || self.user_b_id == *user_id
    }

    /// The participant that is not `user_id`. Returns `None` for outsiders.
    pub fn other_participant(&self, user_id: &Uuid) -> Option<Uuid> {
        if self.user_a_id == *user_id {
            Some(self.user_b_id)
        } else if self.user_b_id == *user_id {
            Some(self.user_a_id)
        } else {
            None
        }
    }

    /// Unread count on `user_id`'s side; zero when `user_id` is on neither side.
    pub fn unread_for(&self, user_id: &Uuid) -> i64 {
        if self.user_a_id == *user_id {
            self.unread_for_user_a
        } else if self.user_b_id == *user_id {
            self.unread_for_user_b
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// Inbox listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    #[serde(flatten)]
    pub thread: MessageThread,
    pub other_user: UserSummary,
    pub last_message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub data: serde_json::Value,
    pub is_read: bool,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary_range: Option<String>,
    pub tags: Vec<String>,
    pub level: String,
    pub remote: bool,
    #[serde(with = "datetime_format")]
    pub posted_at: DateTime<Utc>,
    pub blurb: String,
    pub apply_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub posts: Vec<Post>,
    pub is_following: bool,
}

// Request/Response types for API

/// Tags arrive either as a JSON array or as one comma-separated string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl Default for TagsInput {
    fn default() -> Self {
        TagsInput::List(Vec::new())
    }
}

impl TagsInput {
    pub fn into_tags(self) -> Vec<String> {
        let raw = match self {
            TagsInput::List(tags) => tags,
            TagsInput::Csv(s) => s.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub body: String,
    #[serde(default)]
    pub tags: TagsInput,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sponsored: bool,
    #[serde(default)]
    pub is_draft: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateThreadRequest {
    #[serde(default)]
    pub other_user_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub level: String,
    #[serde(default)]
    pub remote: bool,
    pub blurb: String,
    pub apply_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub session_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub message: String,
    pub outcome: ToggleOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(a: Uuid, b: Uuid) -> MessageThread {
        MessageThread {
            id: Uuid::new_v4(),
            user_a_id: a,
            user_b_id: b,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            unread_for_user_a: 2,
            unread_for_user_b: 5,
        }
    }

    #[test]
    fn test_thread_sides() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let t = thread(a, b);

        assert_eq!(t.unread_for(&a), 2);
        assert_eq!(t.unread_for(&b), 5);
        assert_eq!(t.unread_for(&outsider), 0);
        assert_eq!(t.other_participant(&a), Some(b));
        assert_eq!(t.other_participant(&outsider), None);
        assert!(!t.has_participant(&outsider));
    }

    #[test]
    fn test_tags_input_accepts_csv_and_list() {
        let csv: CreatePostRequest = serde_json::from_str(
            r#"{"title":"t","body":"b","tags":" rust, ,web ","category":"tech"}"#,
        )
        .unwrap();
        assert_eq!(csv.tags.into_tags(), vec!["rust", "web"]);

        let list: CreatePostRequest =
            serde_json::from_str(r#"{"title":"t","body":"b","tags":["a","b"]}"#).unwrap();
        assert_eq!(list.tags.into_tags(), vec!["a", "b"]);

        let missing: CreatePostRequest =
            serde_json::from_str(r#"{"title":"t","body":"b"}"#).unwrap();
        assert!(missing.tags.into_tags().is_empty());
    }

    #[test]
    fn test_notification_serializes_type_field() {
        let n = Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: NotificationType::Like,
            data: serde_json::json!({"postId": "x"}),
            is_read: false,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "LIKE");
        assert_eq!(value["is_read"], false);
    }
}
