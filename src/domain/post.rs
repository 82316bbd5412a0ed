use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::vote::VoteTally;

/// A post as stored. Posts have no edit path, so this is also what callers
/// get back from creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub user_id: i64,
    pub subreddit_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubredditRef {
    pub id: i64,
    pub name: String,
}

/// Post joined with its author, subreddit and vote aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author: Author,
    pub subreddit: Option<SubredditRef>,
    pub votes: VoteTally,
    /// Score the feed was ordered by. Absent for `new` and single-post reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_score: Option<f64>,
}
