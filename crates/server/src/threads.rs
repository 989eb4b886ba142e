//! Thread endpoints.

use api_types::{
    Created,
    thread::{ThreadList, ThreadNew, ThreadSummaries, ThreadSummaryView, ThreadView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState, user};

fn thread_view(thread: engine::Thread) -> ThreadView {
    ThreadView {
        id: thread.id,
        name: thread.name,
        group_id: thread.group_id,
        created_by: thread.created_by,
    }
}

pub async fn thread_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ThreadNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let id = state
        .engine
        .new_thread(&payload.name, payload.group_id, user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(thread_id): Path<i32>,
) -> Result<Json<ThreadView>, ServerError> {
    let thread = state.engine.thread(thread_id, user.id).await?;
    Ok(Json(thread_view(thread)))
}

pub async fn group_threads(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<i32>,
) -> Result<Json<ThreadList>, ServerError> {
    let threads = state
        .engine
        .group_threads(group_id, user.id)
        .await?
        .into_iter()
        .map(thread_view)
        .collect();
    Ok(Json(ThreadList { threads }))
}

pub async fn summaries(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ThreadSummaries>, ServerError> {
    let threads = state
        .engine
        .user_thread_summaries(user.id)
        .await?
        .into_iter()
        .map(|s| ThreadSummaryView {
            thread_id: s.thread_id,
            thread_name: s.thread_name,
            total_balance: s.total_balance,
        })
        .collect();
    Ok(Json(ThreadSummaries { threads }))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(thread_id): Path<i32>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_thread(thread_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
