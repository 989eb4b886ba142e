//! Expense and settlement endpoints.

use api_types::{
    Created,
    expense::{ExpenseList, ExpenseNew, ExpenseView, ParticipantView, SettleNew},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{NewExpense, Scope, SplitRequest};

use crate::{ServerError, server::ServerState, user};

/// Picks the split mode from whichever of `split_with` / `amounts` is set.
fn split_request(payload: &mut ExpenseNew) -> Result<SplitRequest, ServerError> {
    match (payload.split_with.take(), payload.amounts.take()) {
        (Some(ids), None) => Ok(SplitRequest::EqualShare(ids)),
        (None, Some(amounts)) => Ok(SplitRequest::ExplicitShares(amounts)),
        (Some(_), Some(_)) => Err(ServerError::Generic(
            "split_with and amounts are mutually exclusive".to_string(),
        )),
        (None, None) => Err(ServerError::Generic(
            "split_with or amounts required".to_string(),
        )),
    }
}

fn expense_view(expense: engine::ExpenseDetail) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        title: expense.title,
        amount: expense.amount,
        paid_by: expense.paid_by,
        group_id: expense.group_id,
        thread_id: expense.thread_id,
        thread_name: expense.thread_name,
        participants: expense
            .participants
            .into_iter()
            .map(|p| ParticipantView {
                user_id: p.user_id,
                username: p.username,
                amount_owed: p.amount_owed,
            })
            .collect(),
    }
}

fn expense_list(expenses: Vec<engine::ExpenseDetail>) -> ExpenseList {
    ExpenseList {
        expenses: expenses.into_iter().map(expense_view).collect(),
    }
}

pub async fn expense_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(mut payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let split = split_request(&mut payload)?;
    let expense = NewExpense {
        title: payload.title,
        amount: payload.amount,
        paid_by: payload.paid_by.unwrap_or(user.id),
        scope: Scope {
            group_id: payload.group_id,
            thread_id: payload.thread_id,
        },
        split,
    };

    let id = state.engine.record_expense(expense, user.id).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn settle(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<SettleNew>,
) -> Result<(StatusCode, Json<Created>), ServerError> {
    let id = state
        .engine
        .record_settlement(
            payload.from_user,
            payload.to_user,
            payload.amount,
            payload.group_id,
            user.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<i32>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(expense_id, user.id).await?;
    Ok(Json(expense_view(expense)))
}

pub async fn delete(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<i32>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(expense_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn group_list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<i32>,
) -> Result<Json<ExpenseList>, ServerError> {
    let expenses = state.engine.group_expenses(group_id, user.id).await?;
    Ok(Json(expense_list(expenses)))
}

pub async fn thread_list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(thread_id): Path<i32>,
) -> Result<Json<ExpenseList>, ServerError> {
    let expenses = state.engine.thread_expenses(thread_id, user.id).await?;
    Ok(Json(expense_list(expenses)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn split_with_selects_equal_shares() {
        let mut payload = ExpenseNew {
            split_with: Some(vec![1, 2]),
            ..Default::default()
        };
        assert!(matches!(
            split_request(&mut payload),
            Ok(SplitRequest::EqualShare(ids)) if ids == vec![1, 2]
        ));
    }

    #[test]
    fn amounts_select_explicit_shares() {
        let mut payload = ExpenseNew {
            amounts: Some(BTreeMap::from([(3, 7.5)])),
            ..Default::default()
        };
        assert!(matches!(
            split_request(&mut payload),
            Ok(SplitRequest::ExplicitShares(_))
        ));
    }

    #[test]
    fn both_or_neither_is_rejected() {
        let mut both = ExpenseNew {
            split_with: Some(vec![1]),
            amounts: Some(BTreeMap::from([(1, 1.0)])),
            ..Default::default()
        };
        assert!(matches!(split_request(&mut both), Err(ServerError::Generic(_))));

        let mut neither = ExpenseNew::default();
        assert!(matches!(
            split_request(&mut neither),
            Err(ServerError::Generic(_))
        ));
    }
}
