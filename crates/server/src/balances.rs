//! Balance endpoints. Every figure is computed on read.

use api_types::balance::{BalanceList, BalanceView, DashboardResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState, user};

fn balance_view(balance: engine::Balance) -> BalanceView {
    BalanceView {
        user_id: balance.user_id,
        username: balance.username,
        amount_owed: balance.amount_owed,
        amount_due: balance.amount_due,
        net_balance: balance.net_balance,
    }
}

fn balance_list(balances: Vec<engine::Balance>) -> BalanceList {
    BalanceList {
        balances: balances.into_iter().map(balance_view).collect(),
    }
}

/// Personal balances of the caller against everybody.
pub async fn dashboard(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
) -> Result<Json<DashboardResponse>, ServerError> {
    let dashboard = state.engine.dashboard_balances(user.id).await?;
    Ok(Json(DashboardResponse {
        total_owed: dashboard.total_owed,
        total_due: dashboard.total_due,
        net_balance: dashboard.net_balance,
        counterparties: dashboard
            .counterparties
            .into_iter()
            .map(balance_view)
            .collect(),
    }))
}

pub async fn between(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(counterparty): Path<i32>,
) -> Result<Json<BalanceView>, ServerError> {
    let balance = state.engine.balance_between(user.id, counterparty).await?;
    Ok(Json(balance_view(balance)))
}

pub async fn group(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<i32>,
) -> Result<Json<BalanceList>, ServerError> {
    let balances = state.engine.group_balances(group_id, user.id).await?;
    Ok(Json(balance_list(balances)))
}

pub async fn thread(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(thread_id): Path<i32>,
) -> Result<Json<BalanceList>, ServerError> {
    let balances = state.engine.thread_balances(thread_id, user.id).await?;
    Ok(Json(balance_list(balances)))
}
