use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::app::error::{missing_reference, ServiceError, ServiceResult};
use crate::domain::vote::{Vote, VoteTally, VoteValue};
use crate::infra::db::Db;

/// Owns the votes table: at most one row per (user, post).
#[derive(Clone)]
pub struct VoteService {
    db: Db,
}

impl VoteService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Records `value` as the user's vote on the post, replacing any earlier
    /// vote by the same user on the same post.
    pub async fn create_or_update_vote(
        &self,
        user_id: i64,
        post_id: i64,
        value: i64,
    ) -> ServiceResult<Vote> {
        if user_id <= 0 {
            return Err(ServiceError::validation("user_id is required"));
        }
        if post_id <= 0 {
            return Err(ServiceError::validation("post_id is required"));
        }
        let value = VoteValue::try_from(value)?;

        let row = sqlx::query(
            "INSERT INTO votes (user_id, post_id, value) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, post_id) \
             DO UPDATE SET value = EXCLUDED.value, updated_at = now() \
             RETURNING user_id, post_id, value, created_at, updated_at",
        )
        .bind(user_id)
        .bind(post_id)
        .bind(value.as_i16())
        .fetch_one(self.db.pool())
        .await
        .map_err(|err| missing_reference(err, &[("user_id", "user"), ("post_id", "post")]))?;

        tracing::debug!(user_id, post_id, value = value.as_i16(), "vote recorded");

        vote_from_row(&row)
    }

    pub async fn get_vote(&self, user_id: i64, post_id: i64) -> ServiceResult<Option<Vote>> {
        let row = sqlx::query(
            "SELECT user_id, post_id, value, created_at, updated_at \
             FROM votes WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|row| vote_from_row(&row)).transpose()
    }

    pub async fn get_tally(&self, post_id: i64) -> ServiceResult<VoteTally> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(value), 0)::BIGINT AS score, \
                    COUNT(*) FILTER (WHERE value = 1) AS upvotes, \
                    COUNT(*) FILTER (WHERE value = -1) AS downvotes \
             FROM votes WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(VoteTally {
            score: row.get("score"),
            upvotes: row.get("upvotes"),
            downvotes: row.get("downvotes"),
        })
    }
}

fn vote_from_row(row: &PgRow) -> ServiceResult<Vote> {
    let raw: i16 = row.get("value");
    let value = VoteValue::from_db(raw)
        .ok_or_else(|| anyhow::anyhow!("unexpected vote value in store: {}", raw))?;

    Ok(Vote {
        user_id: row.get("user_id"),
        post_id: row.get("post_id"),
        value,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
