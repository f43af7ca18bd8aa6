//! Blog route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::header::CACHE_CONTROL,
    response::IntoResponse,
};
use tracing::instrument;

use crate::blog::{Post, PostSummary};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Posts change only on deploy.
const BLOG_CACHE_CONTROL: &str = "public, max-age=300";

/// Post summaries, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let posts: Vec<PostSummary<'_>> = state.blog().posts().map(PostSummary::from).collect();
    ([(CACHE_CONTROL, BLOG_CACHE_CONTROL)], Json(posts)).into_response()
}

/// A rendered post.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<impl IntoResponse> {
    let post: &Post = state
        .blog()
        .get(&slug)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    Ok(([(CACHE_CONTROL, BLOG_CACHE_CONTROL)], Json(post.clone())).into_response())
}
