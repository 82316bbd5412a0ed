use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::app::error::{missing_reference, ServiceError, ServiceResult};
use crate::domain::comment::{build_thread, Comment, CommentNode, MAX_REPLY_DEPTH};
use crate::infra::db::Db;

const MAX_COMMENT_LEN: usize = 10_000;

#[derive(Clone)]
pub struct CommentService {
    db: Db,
}

impl CommentService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_comment(
        &self,
        user_id: i64,
        post_id: i64,
        text: &str,
        parent_id: Option<i64>,
    ) -> ServiceResult<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::validation("comment text cannot be empty"));
        }
        if text.chars().count() > MAX_COMMENT_LEN {
            return Err(ServiceError::validation(
                "comment text must be at most 10000 characters",
            ));
        }

        let depth = match parent_id {
            Some(parent_id) => self.reply_depth(post_id, parent_id).await?,
            None => 0,
        };

        let row = sqlx::query(
            "WITH inserted AS ( \
                INSERT INTO comments (post_id, user_id, parent_id, text, depth) \
                VALUES ($1, $2, $3, $4, $5) \
                RETURNING id, post_id, user_id, parent_id, text, created_at \
             ) \
             SELECT c.*, u.username \
             FROM inserted c \
             JOIN users u ON u.id = c.user_id",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(parent_id)
        .bind(text)
        .bind(depth)
        .fetch_one(self.db.pool())
        .await
        .map_err(|err| {
            missing_reference(
                err,
                &[
                    ("user_id", "user"),
                    ("parent_id", "parent comment"),
                    ("post_id", "post"),
                ],
            )
        })?;

        Ok(comment_from_row(&row))
    }

    /// Depth a reply to `parent_id` would sit at.
    async fn reply_depth(&self, post_id: i64, parent_id: i64) -> ServiceResult<i32> {
        let parent = sqlx::query("SELECT post_id, depth FROM comments WHERE id = $1")
            .bind(parent_id)
            .fetch_optional(self.db.pool())
            .await?;
        let Some(parent) = parent else {
            return Err(ServiceError::not_found("parent comment"));
        };

        let parent_post: i64 = parent.get("post_id");
        if parent_post != post_id {
            return Err(ServiceError::validation(
                "parent comment belongs to a different post",
            ));
        }

        let depth = parent.get::<i32, _>("depth") + 1;
        if depth > MAX_REPLY_DEPTH {
            return Err(ServiceError::validation(format!(
                "replies cannot be nested more than {} levels deep",
                MAX_REPLY_DEPTH
            )));
        }
        Ok(depth)
    }

    /// All comments on a post as reply trees.
    pub async fn get_thread(&self, post_id: i64) -> ServiceResult<Vec<CommentNode>> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await?;
        if !exists {
            return Err(ServiceError::not_found("post"));
        }

        let rows = sqlx::query(
            "SELECT c.id, c.post_id, c.user_id, c.parent_id, c.text, c.created_at, u.username \
             FROM comments c \
             JOIN users u ON u.id = c.user_id \
             WHERE c.post_id = $1 \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(build_thread(rows.iter().map(comment_from_row).collect()))
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        parent_id: row.get("parent_id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}
