use serde::{Deserialize, Serialize};

/// Feed ordering requested by `GET /api/posts?sort=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedSort {
    Trending,
    #[default]
    Recent,
}

impl FeedSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSort::Trending => "trending",
            FeedSort::Recent => "recent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trending" => Some(FeedSort::Trending),
            "recent" => Some(FeedSort::Recent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Like,
    Comment,
    Follow,
    Mention,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "LIKE",
            NotificationType::Comment => "COMMENT",
            NotificationType::Follow => "FOLLOW",
            NotificationType::Mention => "MENTION",
            NotificationType::System => "SYSTEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LIKE" => Some(NotificationType::Like),
            "COMMENT" => Some(NotificationType::Comment),
            "FOLLOW" => Some(NotificationType::Follow),
            "MENTION" => Some(NotificationType::Mention),
            "SYSTEM" => Some(NotificationType::System),
            _ => None,
        }
    }
}

/// Result of a like/save/follow toggle.
///
/// `Applied` means the junction row was inserted (or deleted) and the
/// counter moved with it; `Unchanged` means the relationship was already in
/// the requested state and nothing was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Applied,
    Unchanged,
}

impl ToggleOutcome {
    pub fn from_rows_affected(rows: usize) -> Self {
        if rows > 0 {
            ToggleOutcome::Applied
        } else {
            ToggleOutcome::Unchanged
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, ToggleOutcome::Applied)
    }
}
