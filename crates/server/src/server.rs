use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{balances, credentials, expenses, groups, threads, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Basic auth against the stored Argon2 hashes. On success the caller's
/// `user::Model` is available to handlers as an `Extension`.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("cannot load credentials: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match credentials::verify_password(auth_header.password(), &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            tracing::error!(user_id = user.id, "unreadable password hash: {err}");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/users", get(user::list))
        .route("/me", get(user::me))
        .route("/groups", post(groups::group_new).get(groups::list))
        .route("/groups/summary", get(groups::summaries))
        .route("/groups/{group_id}", axum::routing::delete(groups::delete))
        .route(
            "/groups/{group_id}/members",
            get(groups::members).post(groups::members_add),
        )
        .route("/groups/{group_id}/threads", get(threads::group_threads))
        .route("/groups/{group_id}/expenses", get(expenses::group_list))
        .route("/groups/{group_id}/balances", get(balances::group))
        .route("/threads", post(threads::thread_new))
        .route("/threads/summary", get(threads::summaries))
        .route(
            "/threads/{thread_id}",
            get(threads::get).delete(threads::delete),
        )
        .route("/threads/{thread_id}/expenses", get(expenses::thread_list))
        .route("/threads/{thread_id}/balances", get(balances::thread))
        .route("/expenses", post(expenses::expense_new))
        .route(
            "/expenses/{expense_id}",
            get(expenses::get).delete(expenses::delete),
        )
        .route("/settle", post(expenses::settle))
        .route("/dashboard", get(balances::dashboard))
        .route("/balances/{user_id}", get(balances::between))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/register", post(user::register))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}
