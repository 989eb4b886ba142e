//! Credentials table as seen by the HTTP layer, plus user endpoints.

use api_types::user::{Register, UserList, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use sea_orm::entity::prelude::*;

use crate::{ServerError, credentials, server::ServerState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn user_view(user: engine::User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        email: user.email,
    }
}

/// Creates an account. The only route reachable without credentials.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    if payload.password.is_empty() {
        return Err(ServerError::Generic("password required".to_string()));
    }
    let hash = credentials::hash_password(&payload.password).map_err(|err| {
        tracing::error!("cannot hash password: {err}");
        ServerError::Generic("cannot register user".to_string())
    })?;

    let id = state
        .engine
        .new_user(&payload.username, &payload.email, &hash)
        .await?;
    let user = state.engine.user(id).await?;

    Ok((StatusCode::CREATED, Json(user_view(user))))
}

pub async fn list(
    _: Extension<Model>,
    State(state): State<ServerState>,
) -> Result<Json<UserList>, ServerError> {
    let users = state
        .engine
        .list_users()
        .await?
        .into_iter()
        .map(user_view)
        .collect();
    Ok(Json(UserList { users }))
}

/// The authenticated caller.
pub async fn me(
    Extension(user): Extension<Model>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user(user.id).await?;
    Ok(Json(user_view(user)))
}
