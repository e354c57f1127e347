//! Feed query construction: sort order, cursor predicates and page limits.
//!
//! Cursors are compound keys matching the sort order, so paging stays stable
//! while rows are being inserted:
//!
//! * recent:   `<created_at>` or `<created_at>,<id>`
//! * trending: `<likes>,<comments>,<created_at>,<id>`
//!
//! A bare timestamp is the legacy format and is accepted by both sorts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use portal_types::{FeedPost, FeedSort, Post};
use rusqlite::types::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Feed as FeedLimits;
use crate::db::timestamp;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("unknown sort '{0}', expected 'trending' or 'recent'")]
    UnknownSort(String),
    #[error("limit must be a positive integer")]
    InvalidLimit,
    #[error("malformed cursor '{0}'")]
    MalformedCursor(String),
    #[error("a trending cursor cannot be used to page the recent feed")]
    CursorSortMismatch,
}

impl FeedError {
    /// Query parameter the error refers to
    pub fn field(&self) -> &'static str {
        match self {
            FeedError::UnknownSort(_) => "sort",
            FeedError::InvalidLimit => "limit",
            FeedError::MalformedCursor(_) | FeedError::CursorSortMismatch => "cursor",
        }
    }
}

/// Apply the default when absent, reject non-positive values, cap at the maximum.
pub fn resolve_limit(requested: Option<i64>, limits: &FeedLimits) -> Result<u32, FeedError> {
    match requested {
        None => Ok(limits.default_limit),
        Some(n) if n < 1 => Err(FeedError::InvalidLimit),
        Some(n) => Ok(n.min(i64::from(limits.max_limit)) as u32),
    }
}

/// Parse an ISO 8601 / RFC 3339 timestamp cursor
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCursor {
    Recent {
        created_at: DateTime<Utc>,
        id: Option<Uuid>,
    },
    Trending {
        likes: i64,
        comments: i64,
        created_at: DateTime<Utc>,
        id: Uuid,
    },
}

impl FeedCursor {
    /// Cursor pointing just past `post` in the given ordering
    pub fn after(sort: FeedSort, post: &Post) -> Self {
        match sort {
            FeedSort::Recent => FeedCursor::Recent {
                created_at: post.created_at,
                id: Some(post.id),
            },
            FeedSort::Trending => FeedCursor::Trending {
                likes: post.likes_count,
                comments: post.comments_count,
                created_at: post.created_at,
                id: post.id,
            },
        }
    }
}

impl fmt::Display for FeedCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedCursor::Recent { created_at, id: None } => write!(f, "{}", timestamp(created_at)),
            FeedCursor::Recent {
                created_at,
                id: Some(id),
            } => write!(f, "{},{}", timestamp(created_at), id),
            FeedCursor::Trending {
                likes,
                comments,
                created_at,
                id,
            } => write!(f, "{},{},{},{}", likes, comments, timestamp(created_at), id),
        }
    }
}

/// Stored timestamps carry microseconds. A finer cursor moves up to the next
/// storable instant, where no row can sit, so its id tie-break becomes the
/// lowest possible one.
fn align_to_storage(created_at: DateTime<Utc>, id: Option<Uuid>) -> (DateTime<Utc>, Option<Uuid>) {
    let truncated = created_at.trunc_subsecs(6);
    if truncated == created_at {
        return (created_at, id);
    }
    (truncated + Duration::microseconds(1), id.map(|_| Uuid::nil()))
}

impl FromStr for FeedCursor {
    type Err = FeedError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || FeedError::MalformedCursor(raw.to_string());
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();

        match parts.as_slice() {
            [ts] => {
                let created_at = parse_timestamp(ts).ok_or_else(malformed)?;
                let (created_at, id) = align_to_storage(created_at, None);
                Ok(FeedCursor::Recent { created_at, id })
            }
            [ts, id] => {
                let created_at = parse_timestamp(ts).ok_or_else(malformed)?;
                let id = Uuid::parse_str(id).map_err(|_| malformed())?;
                let (created_at, id) = align_to_storage(created_at, Some(id));
                Ok(FeedCursor::Recent { created_at, id })
            }
            [likes, comments, ts, id] => {
                let likes = likes.parse().map_err(|_| malformed())?;
                let comments = comments.parse().map_err(|_| malformed())?;
                let created_at = parse_timestamp(ts).ok_or_else(malformed)?;
                let id = Uuid::parse_str(id).map_err(|_| malformed())?;
                let (created_at, id) = align_to_storage(created_at, Some(id));
                Ok(FeedCursor::Trending {
                    likes,
                    comments,
                    created_at,
                    id: id.unwrap_or(Uuid::nil()),
                })
            }
            _ => Err(malformed()),
        }
    }
}

/// A validated feed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub sort: FeedSort,
    pub cursor: Option<FeedCursor>,
    pub limit: u32,
}

impl FeedQuery {
    /// Build a query from raw request parameters
    pub fn from_params(
        sort: Option<&str>,
        cursor: Option<&str>,
        limit: Option<i64>,
        limits: &FeedLimits,
    ) -> Result<Self, FeedError> {
        let sort = match sort.map(str::trim).filter(|s| !s.is_empty()) {
            None => FeedSort::default(),
            Some(raw) => FeedSort::parse(raw).ok_or_else(|| FeedError::UnknownSort(raw.to_string()))?,
        };

        let cursor = cursor
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(FeedCursor::from_str)
            .transpose()?;

        if sort == FeedSort::Recent && matches!(cursor, Some(FeedCursor::Trending { .. })) {
            return Err(FeedError::CursorSortMismatch);
        }

        Ok(Self {
            sort,
            cursor,
            limit: resolve_limit(limit, limits)?,
        })
    }

    /// ORDER BY clause; every key descends and `id` makes the order total.
    pub fn order_by(&self) -> &'static str {
        match self.sort {
            FeedSort::Recent => "ORDER BY p.created_at DESC, p.id DESC",
            FeedSort::Trending => {
                "ORDER BY p.likes_count DESC, p.comments_count DESC, p.created_at DESC, p.id DESC"
            }
        }
    }

    /// Predicate excluding everything up to and including the cursor row
    pub fn cursor_predicate(&self) -> Option<(&'static str, Vec<Value>)> {
        let cursor = self.cursor.as_ref()?;
        let predicate = match (self.sort, cursor) {
            (FeedSort::Recent, FeedCursor::Recent { created_at, id: Some(id) }) => (
                "(p.created_at, p.id) < (?, ?)",
                vec![Value::Text(timestamp(created_at)), Value::Text(id.to_string())],
            ),
            // Legacy timestamp cursor; for trending this mirrors the old behavior
            (_, FeedCursor::Recent { created_at, .. }) => (
                "p.created_at < ?",
                vec![Value::Text(timestamp(created_at))],
            ),
            (
                _,
                FeedCursor::Trending {
                    likes,
                    comments,
                    created_at,
                    id,
                },
            ) => (
                "(p.likes_count, p.comments_count, p.created_at, p.id) < (?, ?, ?, ?)",
                vec![
                    Value::Integer(*likes),
                    Value::Integer(*comments),
                    Value::Text(timestamp(created_at)),
                    Value::Text(id.to_string()),
                ],
            ),
        };
        Some(predicate)
    }

    /// Cursor for the following page, or `None` when this page was the last
    pub fn next_cursor(&self, page: &[FeedPost]) -> Option<FeedCursor> {
        if page.len() < self.limit as usize {
            return None;
        }
        page.last().map(|entry| FeedCursor::after(self.sort, &entry.post))
    }
}
