//! Feed ordering.
//!
//! Every mode orders the same candidate set: all posts in scope joined with
//! their vote tally. Posts without votes carry a zero tally and are never
//! filtered out. Ties on the primary key fall back to `id` descending.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::post::FeedPost;
use crate::domain::vote::VoteTally;

pub const DEFAULT_FEED_LIMIT: i64 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort mode {0:?}, expected one of new, top, hot, controversial")]
pub struct UnknownSortMode(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    New,
    Top,
    Hot,
    Controversial,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Top => "top",
            Self::Hot => "hot",
            Self::Controversial => "controversial",
        }
    }

    /// Ranking score for scored modes; `None` for `new`, which orders by
    /// creation time only.
    pub fn score(&self, tally: &VoteTally, age_seconds: f64) -> Option<f64> {
        match self {
            Self::New => None,
            Self::Top => Some(tally.score as f64),
            Self::Hot => Some(hot_score(tally.score, age_seconds)),
            Self::Controversial => Some(controversial_score(tally)),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = UnknownSortMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "top" => Ok(Self::Top),
            "hot" => Ok(Self::Hot),
            "controversial" => Ok(Self::Controversial),
            other => Err(UnknownSortMode(other.to_string())),
        }
    }
}

/// Which posts a feed is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    All,
    Subreddit(i64),
    Author(i64),
}

impl FeedScope {
    pub fn subreddit_id(&self) -> Option<i64> {
        match self {
            Self::Subreddit(id) => Some(*id),
            _ => None,
        }
    }

    pub fn author_id(&self) -> Option<i64> {
        match self {
            Self::Author(id) => Some(*id),
            _ => None,
        }
    }
}

/// Seconds elapsed between creation and `now`. Negative when the post is
/// stamped in the future relative to `now`.
pub fn age_seconds(created_at: OffsetDateTime, now: OffsetDateTime) -> f64 {
    (now - created_at).as_seconds_f64()
}

/// Vote score per second of age. Posts younger than one second score their
/// raw vote score.
pub fn hot_score(vote_score: i64, age_seconds: f64) -> f64 {
    if age_seconds < 1.0 {
        return vote_score as f64;
    }
    vote_score as f64 / age_seconds
}

/// `total * min(up, down) / max(up, down)`. Zero when either side has no
/// votes.
pub fn controversial_score(tally: &VoteTally) -> f64 {
    if tally.upvotes <= 0 || tally.downvotes <= 0 {
        return 0.0;
    }
    let high = tally.upvotes.max(tally.downvotes) as f64;
    let low = tally.upvotes.min(tally.downvotes) as f64;
    tally.total() as f64 * low / high
}

/// Orders `posts` for `mode`, filling in `rank_score`. The feed query
/// applies the same ordering in SQL before paging.
pub fn rank(mut posts: Vec<FeedPost>, mode: SortMode, now: OffsetDateTime) -> Vec<FeedPost> {
    for post in &mut posts {
        post.rank_score = mode.score(&post.votes, age_seconds(post.created_at, now));
    }

    match mode {
        SortMode::New => posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        }),
        SortMode::Top | SortMode::Hot | SortMode::Controversial => posts.sort_by(|a, b| {
            compare_scores(b.rank_score, a.rank_score).then_with(|| b.id.cmp(&a.id))
        }),
    }

    posts
}

fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(0.0).total_cmp(&b.unwrap_or(0.0))
}
