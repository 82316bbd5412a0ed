use axum::{routing::get, routing::post, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::get_current_user))
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/users/:id", get(handlers::get_user))
        .route("/users/:id/posts", get(handlers::list_user_posts))
}

pub fn subreddits() -> Router<AppState> {
    Router::new()
        .route(
            "/subreddits",
            post(handlers::create_subreddit).get(handlers::list_subreddits),
        )
        .route("/subreddits/:id", get(handlers::get_subreddit))
        .route("/subreddits/:id/posts", get(handlers::list_subreddit_posts))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/posts", post(handlers::create_post))
        .route("/posts/:id", get(handlers::get_post))
        .route("/posts/:id/vote", post(handlers::vote_post))
        .route(
            "/posts/:id/comments",
            post(handlers::comment_post).get(handlers::list_post_comments),
        )
}

pub fn feed() -> Router<AppState> {
    Router::new().route("/feed", get(handlers::feed))
}
