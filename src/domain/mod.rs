pub mod comment;
pub mod feed;
pub mod post;
pub mod subreddit;
pub mod user;
pub mod vote;
