use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::app::error::{unique_violation, ServiceError, ServiceResult};
use crate::app::page::Page;
use crate::domain::subreddit::Subreddit;
use crate::infra::db::Db;

const MAX_NAME_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(Clone)]
pub struct SubredditService {
    db: Db,
}

impl SubredditService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_subreddit(
        &self,
        name: &str,
        description: Option<String>,
    ) -> ServiceResult<Subreddit> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("name cannot be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ServiceError::validation("name must be at most 64 characters"));
        }
        let description = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        if let Some(text) = &description {
            if text.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(ServiceError::validation(
                    "description must be at most 1000 characters",
                ));
            }
        }

        let row = sqlx::query(
            "INSERT INTO subreddits (name, description) VALUES ($1, $2) \
             RETURNING id, name, description, created_at",
        )
        .bind(name)
        .bind(description)
        .fetch_one(self.db.pool())
        .await
        .map_err(|err| match unique_violation(&err) {
            Some(_) => ServiceError::conflict("a subreddit with this name already exists"),
            None => ServiceError::Storage(err),
        })?;

        Ok(subreddit_from_row(&row))
    }

    pub async fn get_subreddit(&self, subreddit_id: i64) -> ServiceResult<Option<Subreddit>> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at FROM subreddits WHERE id = $1",
        )
        .bind(subreddit_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| subreddit_from_row(&row)))
    }

    pub async fn list_subreddits(&self, page: Page) -> ServiceResult<Vec<Subreddit>> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at \
             FROM subreddits \
             ORDER BY created_at ASC, id ASC \
             LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(subreddit_from_row).collect())
    }
}

fn subreddit_from_row(row: &PgRow) -> Subreddit {
    Subreddit {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}
