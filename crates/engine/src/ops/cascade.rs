//! Cascading deletes.
//!
//! Each delete runs in one DB transaction and removes rows in dependency
//! order (splits, expenses, threads, memberships, group), so a failure at
//! any step leaves the ledger untouched. Deleting an id that does not exist
//! is a no-op.

use sea_orm::{Condition, DatabaseTransaction, QueryFilter, QuerySelect, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, expenses, group_memberships, groups, splits, threads};

use super::{Engine, with_tx};

impl Engine {
    /// Deletes an expense and its splits (payer or group member).
    pub async fn delete_expense(&self, expense_id: i32, user_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let Some(expense) = expenses::Entity::find_by_id(expense_id).one(&db_tx).await? else {
                return Ok(());
            };
            match expense.group_id {
                Some(group_id) => {
                    self.require_group_member(&db_tx, group_id, user_id).await?;
                }
                None if expense.paid_by != user_id => {
                    return Err(EngineError::Forbidden(format!(
                        "only the payer can delete expense {expense_id}"
                    )));
                }
                None => {}
            }

            let splits_deleted = self.delete_expense_rows(&db_tx, vec![expense_id]).await?;
            tracing::info!(expense_id, splits_deleted, "expense deleted");
            Ok(())
        })
    }

    /// Deletes a thread with its expenses and their splits (thread creator or
    /// group admin).
    pub async fn delete_thread(&self, thread_id: i32, user_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let Some(thread) = threads::Entity::find_by_id(thread_id).one(&db_tx).await? else {
                return Ok(());
            };
            self.require_thread_owner(&db_tx, &thread, user_id).await?;

            let expense_ids = self
                .expense_ids(&db_tx, Condition::all().add(expenses::Column::ThreadId.eq(thread_id)))
                .await?;
            let expenses_deleted = expense_ids.len();
            let splits_deleted = self.delete_expense_rows(&db_tx, expense_ids).await?;
            threads::Entity::delete_by_id(thread_id).exec(&db_tx).await?;

            tracing::info!(thread_id, expenses_deleted, splits_deleted, "thread deleted");
            Ok(())
        })
    }

    /// Deletes a group with everything that hangs off it (admin-only):
    /// splits, expenses (direct or through one of its threads), threads,
    /// memberships and finally the group row.
    pub async fn delete_group(&self, group_id: i32, user_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            if groups::Entity::find_by_id(group_id).one(&db_tx).await?.is_none() {
                return Ok(());
            }
            self.require_group_admin(&db_tx, group_id, user_id).await?;

            let thread_ids: Vec<i32> = threads::Entity::find()
                .select_only()
                .column(threads::Column::Id)
                .filter(threads::Column::GroupId.eq(group_id))
                .into_tuple()
                .all(&db_tx)
                .await?;
            let expense_ids = self
                .expense_ids(
                    &db_tx,
                    Condition::any()
                        .add(expenses::Column::GroupId.eq(group_id))
                        .add(expenses::Column::ThreadId.is_in(thread_ids.iter().copied())),
                )
                .await?;
            let expenses_deleted = expense_ids.len();
            let splits_deleted = self.delete_expense_rows(&db_tx, expense_ids).await?;

            let threads_deleted = threads::Entity::delete_many()
                .filter(threads::Column::GroupId.eq(group_id))
                .exec(&db_tx)
                .await?
                .rows_affected;
            let members_deleted = group_memberships::Entity::delete_many()
                .filter(group_memberships::Column::GroupId.eq(group_id))
                .exec(&db_tx)
                .await?
                .rows_affected;
            groups::Entity::delete_by_id(group_id).exec(&db_tx).await?;

            tracing::info!(
                group_id,
                expenses_deleted,
                splits_deleted,
                threads_deleted,
                members_deleted,
                "group deleted"
            );
            Ok(())
        })
    }

    async fn expense_ids(
        &self,
        db: &DatabaseTransaction,
        condition: Condition,
    ) -> ResultEngine<Vec<i32>> {
        expenses::Entity::find()
            .select_only()
            .column(expenses::Column::Id)
            .filter(condition)
            .into_tuple()
            .all(db)
            .await
            .map_err(Into::into)
    }

    /// Splits first, then the expenses. Returns the number of splits removed.
    async fn delete_expense_rows(
        &self,
        db: &DatabaseTransaction,
        expense_ids: Vec<i32>,
    ) -> ResultEngine<u64> {
        if expense_ids.is_empty() {
            return Ok(0);
        }
        let splits_deleted = splits::Entity::delete_many()
            .filter(splits::Column::ExpenseId.is_in(expense_ids.iter().copied()))
            .exec(db)
            .await?
            .rows_affected;
        expenses::Entity::delete_many()
            .filter(expenses::Column::Id.is_in(expense_ids))
            .exec(db)
            .await?;
        tracing::debug!(splits_deleted, "expense rows deleted");
        Ok(splits_deleted)
    }
}
