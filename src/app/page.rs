use crate::app::error::{ServiceError, ServiceResult};
use crate::domain::feed::DEFAULT_FEED_LIMIT;

/// Validated `limit`/`offset` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub fn new(limit: Option<i64>, offset: Option<i64>, max_limit: i64) -> ServiceResult<Self> {
        let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT);
        if !(1..=max_limit).contains(&limit) {
            return Err(ServiceError::validation(format!(
                "limit must be between 1 and {}",
                max_limit
            )));
        }
        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err(ServiceError::validation("offset cannot be negative"));
        }
        Ok(Self { limit, offset })
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FEED_LIMIT,
            offset: 0,
        }
    }
}
