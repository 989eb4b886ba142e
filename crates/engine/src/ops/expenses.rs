use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, ExpenseDetail, NewExpense, Participant, ResultEngine, Scope, SplitRequest,
    expenses, shares::validate_amount, splits, threads,
};

use super::{Engine, normalize_required_name, with_tx};

/// Title given to the expense a settlement is recorded as.
pub const SETTLEMENT_TITLE: &str = "Settlement";

impl Engine {
    /// Records an expense and its splits atomically.
    ///
    /// The split is validated before touching the database; payer,
    /// participants, group and thread must exist. An expense in a group
    /// thread is also scoped to that group. The caller must be a member of
    /// the resolved group, or, outside groups, the payer, a participant or
    /// the creator of the thread.
    pub async fn record_expense(&self, expense: NewExpense, user_id: i32) -> ResultEngine<i32> {
        let title = normalize_required_name(&expense.title, "title")?;
        let shares = expense.split.shares(
            expense.amount,
            expense.paid_by,
            expense.scope.is_personal(),
        )?;
        let participant_ids: Vec<i32> = shares.iter().map(|s| s.user_id).collect();

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, expense.paid_by).await?;
            self.require_users(&db_tx, &participant_ids).await?;

            let (scope, thread) = self.resolve_scope(&db_tx, expense.scope).await?;
            match scope.group_id {
                Some(group_id) => {
                    self.require_group_member(&db_tx, group_id, user_id).await?;
                }
                None => {
                    let involved =
                        user_id == expense.paid_by || participant_ids.contains(&user_id);
                    let thread_creator = thread.is_some_and(|t| t.created_by == user_id);
                    if !involved && !thread_creator {
                        return Err(EngineError::Forbidden(format!(
                            "user {user_id} is not part of this expense"
                        )));
                    }
                }
            }

            let model = expenses::ActiveModel {
                title: ActiveValue::Set(title.clone()),
                amount: ActiveValue::Set(expense.amount),
                paid_by: ActiveValue::Set(expense.paid_by),
                group_id: ActiveValue::Set(scope.group_id),
                thread_id: ActiveValue::Set(scope.thread_id),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            let now = Utc::now();
            let rows = shares.iter().map(|share| splits::ActiveModel {
                expense_id: ActiveValue::Set(model.id),
                user_id: ActiveValue::Set(share.user_id),
                amount_owed: ActiveValue::Set(share.amount_owed),
                created_at: ActiveValue::Set(now),
            });
            splits::Entity::insert_many(rows)
                .exec_without_returning(&db_tx)
                .await?;

            tracing::info!(
                expense_id = model.id,
                paid_by = expense.paid_by,
                amount = expense.amount,
                participants = shares.len(),
                group_id = ?scope.group_id,
                thread_id = ?scope.thread_id,
                "expense recorded"
            );
            Ok(model.id)
        })
    }

    /// Records a direct payment from `payer` to `payee`.
    ///
    /// Stored as an expense paid by `payer` whose only split makes `payee`
    /// owe the full amount, so it nets out an existing debt of `payer`
    /// toward `payee`.
    pub async fn record_settlement(
        &self,
        payer: i32,
        payee: i32,
        amount: f64,
        group_id: Option<i32>,
        user_id: i32,
    ) -> ResultEngine<i32> {
        validate_amount(amount)?;
        if payer == payee {
            return Err(EngineError::InvalidAmount(
                "cannot settle with yourself".to_string(),
            ));
        }

        let expense = NewExpense {
            title: SETTLEMENT_TITLE.to_string(),
            amount,
            paid_by: payer,
            scope: Scope {
                group_id,
                thread_id: None,
            },
            split: SplitRequest::ExplicitShares(BTreeMap::from([(payee, amount)])),
        };
        let expense_id = self.record_expense(expense, user_id).await?;
        tracing::info!(expense_id, payer, payee, amount, "settlement recorded");
        Ok(expense_id)
    }

    /// One expense with its participants.
    pub async fn expense(&self, expense_id: i32, user_id: i32) -> ResultEngine<ExpenseDetail> {
        with_tx!(self, |db_tx| {
            let row = expenses::Entity::find_by_id(expense_id)
                .find_also_related(threads::Entity)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("expense {expense_id}")))?;
            self.require_expense_access(&db_tx, &row.0, user_id).await?;

            let mut details = self.expense_details(&db_tx, vec![row]).await?;
            details
                .pop()
                .ok_or_else(|| EngineError::NotFound(format!("expense {expense_id}")))
        })
    }

    /// Expenses of a group, thread ones included, by id (members only).
    pub async fn group_expenses(
        &self,
        group_id: i32,
        user_id: i32,
    ) -> ResultEngine<Vec<ExpenseDetail>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.require_group_member(&db_tx, group_id, user_id).await?;

            let rows = expenses::Entity::find()
                .filter(expenses::Column::GroupId.eq(group_id))
                .find_also_related(threads::Entity)
                .order_by_asc(expenses::Column::Id)
                .all(&db_tx)
                .await?;
            self.expense_details(&db_tx, rows).await
        })
    }

    /// Expenses of a thread, by id.
    pub async fn thread_expenses(
        &self,
        thread_id: i32,
        user_id: i32,
    ) -> ResultEngine<Vec<ExpenseDetail>> {
        with_tx!(self, |db_tx| {
            let thread = self.require_thread(&db_tx, thread_id).await?;
            self.require_thread_read(&db_tx, &thread, user_id).await?;

            let rows = expenses::Entity::find()
                .filter(expenses::Column::ThreadId.eq(thread_id))
                .find_also_related(threads::Entity)
                .order_by_asc(expenses::Column::Id)
                .all(&db_tx)
                .await?;
            self.expense_details(&db_tx, rows).await
        })
    }

    /// Resolves the effective scope: a thread inside a group pulls the group
    /// in. A group that does not own the thread is reported as `NotFound`.
    async fn resolve_scope(
        &self,
        db: &DatabaseTransaction,
        scope: Scope,
    ) -> ResultEngine<(Scope, Option<threads::Model>)> {
        let mut resolved = scope;
        let mut thread = None;

        if let Some(thread_id) = scope.thread_id {
            let model = self.require_thread(db, thread_id).await?;
            match (scope.group_id, model.group_id) {
                (None, owner) => resolved.group_id = owner,
                (Some(requested), owner) if owner != Some(requested) => {
                    return Err(EngineError::NotFound(format!(
                        "thread {thread_id} in group {requested}"
                    )));
                }
                _ => {}
            }
            thread = Some(model);
        }
        if let Some(group_id) = resolved.group_id {
            self.require_group(db, group_id).await?;
        }

        Ok((resolved, thread))
    }

    /// Group expenses follow group membership; the others are visible to the
    /// payer, the participants and the creator of their thread.
    pub(super) async fn require_expense_access(
        &self,
        db: &DatabaseTransaction,
        expense: &expenses::Model,
        user_id: i32,
    ) -> ResultEngine<()> {
        if let Some(group_id) = expense.group_id {
            self.require_group_member(db, group_id, user_id).await?;
            return Ok(());
        }
        if expense.paid_by == user_id {
            return Ok(());
        }
        if splits::Entity::find_by_id((expense.id, user_id))
            .one(db)
            .await?
            .is_some()
        {
            return Ok(());
        }
        if let Some(thread_id) = expense.thread_id
            && let Some(thread) = threads::Entity::find_by_id(thread_id).one(db).await?
            && thread.created_by == user_id
        {
            return Ok(());
        }
        Err(EngineError::Forbidden(format!(
            "user {user_id} is not part of expense {}",
            expense.id
        )))
    }

    async fn expense_details(
        &self,
        db: &DatabaseTransaction,
        rows: Vec<(expenses::Model, Option<threads::Model>)>,
    ) -> ResultEngine<Vec<ExpenseDetail>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let split_rows = splits::Entity::find()
            .filter(splits::Column::ExpenseId.is_in(rows.iter().map(|(e, _)| e.id)))
            .order_by_asc(splits::Column::ExpenseId)
            .order_by_asc(splits::Column::UserId)
            .all(db)
            .await?;
        let names = self
            .usernames(db, split_rows.iter().map(|s| s.user_id))
            .await?;

        let mut participants: HashMap<i32, Vec<Participant>> = HashMap::new();
        for split in split_rows {
            participants
                .entry(split.expense_id)
                .or_default()
                .push(Participant {
                    user_id: split.user_id,
                    username: names.get(&split.user_id).cloned().unwrap_or_default(),
                    amount_owed: split.amount_owed,
                });
        }

        Ok(rows
            .into_iter()
            .map(|(expense, thread)| ExpenseDetail {
                participants: participants.remove(&expense.id).unwrap_or_default(),
                id: expense.id,
                title: expense.title,
                amount: expense.amount,
                paid_by: expense.paid_by,
                group_id: expense.group_id,
                thread_id: expense.thread_id,
                thread_name: thread.map(|t| t.name),
            })
            .collect())
    }
}
