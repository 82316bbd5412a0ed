use std::sync::Arc;

use crate::app::error::ServiceResult;
use crate::app::page::Page;
use crate::app::posts::{feed_post_from_row, POSTS_WITH_VOTES};
use crate::domain::feed::{self, FeedScope, SortMode};
use crate::domain::post::FeedPost;
use crate::infra::clock::Clock;
use crate::infra::db::Db;

/// Read-only ranking over posts and their vote aggregates.
#[derive(Clone)]
pub struct FeedService {
    db: Db,
    clock: Arc<dyn Clock>,
}

impl FeedService {
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// One page of the scoped feed. Ordering and paging run in the database;
    /// the returned rows carry the same `rank_score` that `feed::rank` gives.
    pub async fn get_feed(
        &self,
        mode: SortMode,
        scope: FeedScope,
        page: Page,
    ) -> ServiceResult<Vec<FeedPost>> {
        let now = self.clock.now();
        let rows = sqlx::query(&format!(
            "SELECT * FROM ( \
                 SELECT scoped.*, \
                        EXTRACT(EPOCH FROM ($3::TIMESTAMPTZ - scoped.created_at))::FLOAT8 \
                            AS age_seconds \
                 FROM ({} \
                       WHERE ($1::BIGINT IS NULL OR p.subreddit_id = $1) \
                         AND ($2::BIGINT IS NULL OR p.user_id = $2)) scoped \
             ) ranked \
             ORDER BY {}, id DESC \
             LIMIT $4 OFFSET $5",
            POSTS_WITH_VOTES,
            order_key(mode)
        ))
        .bind(scope.subreddit_id())
        .bind(scope.author_id())
        .bind(now)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.db.pool())
        .await?;

        let posts: Vec<FeedPost> = rows.iter().map(feed_post_from_row).collect();
        let ranked = feed::rank(posts, mode, now);

        tracing::debug!(
            sort = %mode,
            returned = ranked.len(),
            limit = page.limit,
            offset = page.offset,
            "feed ranked"
        );

        Ok(ranked)
    }
}

/// Primary sort key for `mode`, over the columns of `POSTS_WITH_VOTES` plus
/// `age_seconds`. Mirrors the scores in `domain::feed`.
fn order_key(mode: SortMode) -> &'static str {
    match mode {
        SortMode::New => "created_at DESC",
        SortMode::Top => "score DESC",
        SortMode::Hot => {
            "CASE \
                 WHEN age_seconds < 1 THEN score::FLOAT8 \
                 ELSE score::FLOAT8 / age_seconds \
             END DESC"
        }
        SortMode::Controversial => {
            "CASE \
                 WHEN upvotes > 0 AND downvotes > 0 \
                 THEN (upvotes + downvotes)::FLOAT8 * LEAST(upvotes, downvotes) \
                      / GREATEST(upvotes, downvotes) \
                 ELSE 0 \
             END DESC"
        }
    }
}
