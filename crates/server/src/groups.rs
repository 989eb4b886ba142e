//! Group endpoints.

use api_types::{
    Created,
    group::{
        GroupList, GroupNew, GroupRole, GroupSummaries, GroupSummaryView, GroupView, MemberView,
        MembersAdd, MembersAdded, MembersResponse,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState, user};

fn role(role: engine::GroupRole) -> GroupRole {
    match role {
        engine::GroupRole::Admin => GroupRole::Admin,
        engine::GroupRole::Member => GroupRole::Member,
    }
}

pub async fn group_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let id = state
        .engine
        .new_group(&payload.name, user.id, &payload.member_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// Groups of the caller.
pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<GroupList>, ServerError> {
    let groups = state
        .engine
        .user_groups(user.id)
        .await?
        .into_iter()
        .map(|g| GroupView {
            id: g.id,
            name: g.name,
        })
        .collect();
    Ok(Json(GroupList { groups }))
}

pub async fn summaries(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<GroupSummaries>, ServerError> {
    let groups = state
        .engine
        .user_group_summaries(user.id)
        .await?
        .into_iter()
        .map(|s| GroupSummaryView {
            group_id: s.group_id,
            group_name: s.group_name,
            total_balance: s.total_balance,
        })
        .collect();
    Ok(Json(GroupSummaries { groups }))
}

pub async fn members(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<i32>,
) -> Result<Json<MembersResponse>, ServerError> {
    let group = state.engine.group_members(group_id, user.id).await?;
    Ok(Json(MembersResponse {
        group_id: group.group_id,
        group_name: group.group_name,
        members: group
            .members
            .into_iter()
            .map(|m| MemberView {
                user_id: m.user_id,
                username: m.username,
                role: role(m.role),
            })
            .collect(),
    }))
}

pub async fn members_add(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<i32>,
    Json(payload): Json<MembersAdd>,
) -> Result<Json<MembersAdded>, ServerError> {
    let added = state
        .engine
        .add_group_members(group_id, &payload.user_ids, user.id)
        .await?;
    Ok(Json(MembersAdded { added }))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<i32>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_group(group_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
