use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::Row;
use url::Url;

use crate::app::error::{missing_reference, ServiceError, ServiceResult};
use crate::domain::post::{Author, FeedPost, Post, SubredditRef};
use crate::domain::vote::VoteTally;
use crate::infra::clock::Clock;
use crate::infra::db::Db;

const MAX_TITLE_LEN: usize = 300;
const MAX_URL_LEN: usize = 2048;

/// Posts joined with author, subreddit and the grouped vote aggregate.
/// The aggregate is LEFT JOINed so unvoted posts stay in the result.
pub(crate) const POSTS_WITH_VOTES: &str = "\
    SELECT p.id, p.title, p.url, p.created_at, \
           u.id AS author_id, u.username AS author_username, \
           s.id AS subreddit_id, s.name AS subreddit_name, \
           COALESCE(v.score, 0)::BIGINT AS score, \
           COALESCE(v.upvotes, 0)::BIGINT AS upvotes, \
           COALESCE(v.downvotes, 0)::BIGINT AS downvotes \
    FROM posts p \
    JOIN users u ON u.id = p.user_id \
    LEFT JOIN subreddits s ON s.id = p.subreddit_id \
    LEFT JOIN ( \
        SELECT post_id, \
               SUM(value) AS score, \
               COUNT(*) FILTER (WHERE value = 1) AS upvotes, \
               COUNT(*) FILTER (WHERE value = -1) AS downvotes \
        FROM votes \
        GROUP BY post_id \
    ) v ON v.post_id = p.id";

#[derive(Clone)]
pub struct PostService {
    db: Db,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(db: Db, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn create_post(
        &self,
        user_id: i64,
        title: &str,
        url: &str,
        subreddit_id: Option<i64>,
    ) -> ServiceResult<Post> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::validation("title cannot be empty"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ServiceError::validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        let url = validate_url(url)?;

        let row = sqlx::query(
            "INSERT INTO posts (user_id, title, url, subreddit_id, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, title, url, user_id, subreddit_id, created_at",
        )
        .bind(user_id)
        .bind(title)
        .bind(url)
        .bind(subreddit_id)
        .bind(self.clock.now())
        .fetch_one(self.db.pool())
        .await
        .map_err(|err| {
            missing_reference(err, &[("subreddit_id", "subreddit"), ("user_id", "user")])
        })?;

        let post = Post {
            id: row.get("id"),
            title: row.get("title"),
            url: row.get("url"),
            user_id: row.get("user_id"),
            subreddit_id: row.get("subreddit_id"),
            created_at: row.get("created_at"),
        };
        tracing::info!(post_id = post.id, user_id, "post created");

        Ok(post)
    }

    pub async fn get_post(&self, post_id: i64) -> ServiceResult<Option<FeedPost>> {
        let row = sqlx::query(&format!("{} WHERE p.id = $1", POSTS_WITH_VOTES))
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|row| feed_post_from_row(&row)))
    }
}

fn validate_url(raw: &str) -> ServiceResult<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ServiceError::validation("url cannot be empty"));
    }
    if raw.len() > MAX_URL_LEN {
        return Err(ServiceError::validation(format!(
            "url must be at most {} characters",
            MAX_URL_LEN
        )));
    }
    let parsed = Url::parse(raw).map_err(|_| ServiceError::validation("url is not valid"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        _ => Err(ServiceError::validation("url must use http or https")),
    }
}

pub(crate) fn feed_post_from_row(row: &PgRow) -> FeedPost {
    let subreddit_id: Option<i64> = row.get("subreddit_id");
    let subreddit_name: Option<String> = row.get("subreddit_name");
    let subreddit = match (subreddit_id, subreddit_name) {
        (Some(id), Some(name)) => Some(SubredditRef { id, name }),
        _ => None,
    };

    FeedPost {
        id: row.get("id"),
        title: row.get("title"),
        url: row.get("url"),
        created_at: row.get("created_at"),
        author: Author {
            id: row.get("author_id"),
            username: row.get("author_username"),
        },
        subreddit,
        votes: VoteTally {
            score: row.get("score"),
            upvotes: row.get("upvotes"),
            downvotes: row.get("downvotes"),
        },
        rank_score: None,
    }
}
