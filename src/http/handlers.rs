use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::app::auth::AuthService;
use crate::app::comments::CommentService;
use crate::app::feed::FeedService;
use crate::app::page::Page;
use crate::app::posts::PostService;
use crate::app::subreddits::SubredditService;
use crate::app::users::UserService;
use crate::app::votes::VoteService;
use crate::domain::comment::{Comment, CommentNode};
use crate::domain::feed::{FeedScope, SortMode};
use crate::domain::post::{FeedPost, Post};
use crate::domain::subreddit::Subreddit;
use crate::domain::user::User;
use crate::domain::vote::{Vote, VoteTally, VoteValue};
use crate::http::{AppError, AuthUser};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub sort: SortMode,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<FeedPost>,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.db.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<User>, AppError> {
    let service = AuthService::new(state.db.clone());
    let user = service.signup(&payload.username, &payload.password).await?;
    Ok(Json(user))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("username and password are required"));
    }

    let service = AuthService::new(state.db.clone());
    match service.login(&payload.username, &payload.password).await? {
        Some(session) => Ok(Json(SessionResponse {
            token: session.token,
            user_id: session.user_id,
            created_at: session.created_at,
        })),
        None => Err(AppError::unauthorized("invalid credentials")),
    }
}

pub async fn logout(auth: AuthUser, State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let service = AuthService::new(state.db.clone());
    service.logout(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let service = UserService::new(state.db.clone());
    match service.get_user(auth.user_id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn get_user(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let service = UserService::new(state.db.clone());
    match service.get_user(id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

pub async fn list_user_posts(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let users = UserService::new(state.db.clone());
    if users.get_user(id).await?.is_none() {
        return Err(AppError::not_found("user not found"));
    }
    ranked_feed(&state, FeedScope::Author(id), query).await
}

// ---------------------------------------------------------------------------
// Subreddits
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreateSubredditRequest {
    pub name: String,
    pub description: Option<String>,
}

pub async fn create_subreddit(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateSubredditRequest>,
) -> Result<Json<Subreddit>, AppError> {
    let service = SubredditService::new(state.db.clone());
    let subreddit = service
        .create_subreddit(&payload.name, payload.description)
        .await?;
    Ok(Json(subreddit))
}

pub async fn list_subreddits(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<Subreddit>>, AppError> {
    let page = Page::new(query.limit, query.offset, state.feed_max_limit)?;
    let service = SubredditService::new(state.db.clone());
    let items = service.list_subreddits(page).await?;
    Ok(Json(ListResponse { items }))
}

pub async fn get_subreddit(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Subreddit>, AppError> {
    let service = SubredditService::new(state.db.clone());
    match service.get_subreddit(id).await? {
        Some(subreddit) => Ok(Json(subreddit)),
        None => Err(AppError::not_found("subreddit not found")),
    }
}

pub async fn list_subreddit_posts(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let subreddits = SubredditService::new(state.db.clone());
    if subreddits.get_subreddit(id).await?.is_none() {
        return Err(AppError::not_found("subreddit not found"));
    }
    ranked_feed(&state, FeedScope::Subreddit(id), query).await
}

// ---------------------------------------------------------------------------
// Posts, votes and comments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub url: String,
    pub subreddit_id: Option<i64>,
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<Post>, AppError> {
    let service = PostService::new(state.db.clone(), state.clock.clone());
    let post = service
        .create_post(auth.user_id, &payload.title, &payload.url, payload.subreddit_id)
        .await?;
    Ok(Json(post))
}

pub async fn get_post(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<FeedPost>, AppError> {
    let service = PostService::new(state.db.clone(), state.clock.clone());
    match service.get_post(id).await? {
        Some(post) => Ok(Json(post)),
        None => Err(AppError::not_found("post not found")),
    }
}

#[derive(Deserialize)]
pub struct VoteRequest {
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Serialize)]
pub struct VoteResponse {
    pub vote: Vote,
    pub votes: VoteTally,
}

pub async fn vote_post(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, AppError> {
    let value = VoteValue::from_json(&payload.value)
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let service = VoteService::new(state.db.clone());
    let vote = service
        .create_or_update_vote(auth.user_id, id, value.into())
        .await?;
    let votes = service.get_tally(id).await?;

    Ok(Json(VoteResponse { vote, votes }))
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub text: String,
    pub parent_id: Option<i64>,
}

pub async fn comment_post(
    Path(id): Path<i64>,
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<Comment>, AppError> {
    let service = CommentService::new(state.db.clone());
    let comment = service
        .create_comment(auth.user_id, id, &payload.text, payload.parent_id)
        .await?;
    Ok(Json(comment))
}

pub async fn list_post_comments(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<CommentNode>>, AppError> {
    let service = CommentService::new(state.db.clone());
    let items = service.get_thread(id).await?;
    Ok(Json(ListResponse { items }))
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

pub async fn feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    ranked_feed(&state, FeedScope::All, query).await
}

async fn ranked_feed(
    state: &AppState,
    scope: FeedScope,
    query: FeedQuery,
) -> Result<Json<FeedResponse>, AppError> {
    let sort = match query.sort.as_deref() {
        Some(sort) => sort
            .parse::<SortMode>()
            .map_err(|err| AppError::bad_request(err.to_string()))?,
        None => SortMode::New,
    };
    let page = Page::new(query.limit, query.offset, state.feed_max_limit)?;

    let service = FeedService::new(state.db.clone(), state.clock.clone());
    let items = service.get_feed(sort, scope, page).await?;

    Ok(Json(FeedResponse {
        sort,
        limit: page.limit,
        offset: page.offset,
        items,
    }))
}
