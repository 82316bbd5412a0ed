pub mod auth;
pub mod comments;
pub mod error;
pub mod feed;
pub mod page;
pub mod posts;
pub mod subreddits;
pub mod users;
pub mod votes;

pub use error::{ErrorKind, ServiceError, ServiceResult};
