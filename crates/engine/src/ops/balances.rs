use sea_orm::{
    Condition, DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    Balance, DashboardBalances, GroupSummary, LedgerEntry, ResultEngine, ThreadSummary,
    balances::with_usernames, expenses, member_balances, personal_balances, splits, threads,
};

use super::{Engine, with_tx};

impl Engine {
    /// Every personal relationship of `user_id`, over all expenses they paid
    /// or take part in, with totals.
    pub async fn dashboard_balances(&self, user_id: i32) -> ResultEngine<DashboardBalances> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let entries = self
                .ledger_entries(
                    &db_tx,
                    Condition::any()
                        .add(splits::Column::UserId.eq(user_id))
                        .add(expenses::Column::PaidBy.eq(user_id)),
                )
                .await?;
            let rows = personal_balances(user_id, &entries);
            let names = self.usernames(&db_tx, rows.iter().map(|b| b.user_id)).await?;
            Ok(DashboardBalances::from_counterparties(with_usernames(
                rows, &names,
            )))
        })
    }

    /// The dashboard row of `counterparty` seen from `user_id`; zeros when
    /// the two never shared an expense.
    pub async fn balance_between(&self, user_id: i32, counterparty: i32) -> ResultEngine<Balance> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let other = self.require_user(&db_tx, counterparty).await?;

            let entries = self
                .ledger_entries(
                    &db_tx,
                    Condition::any()
                        .add(
                            Condition::all()
                                .add(expenses::Column::PaidBy.eq(user_id))
                                .add(splits::Column::UserId.eq(counterparty)),
                        )
                        .add(
                            Condition::all()
                                .add(expenses::Column::PaidBy.eq(counterparty))
                                .add(splits::Column::UserId.eq(user_id)),
                        ),
                )
                .await?;
            let balance = personal_balances(user_id, &entries)
                .into_iter()
                .find(|b| b.user_id == counterparty)
                .unwrap_or(Balance {
                    user_id: counterparty,
                    ..Default::default()
                });
            Ok(Balance {
                username: other.username,
                ..balance
            })
        })
    }

    /// Net position of every member appearing in the group ledger
    /// (members only).
    pub async fn group_balances(&self, group_id: i32, user_id: i32) -> ResultEngine<Vec<Balance>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.require_group_member(&db_tx, group_id, user_id).await?;
            self.scope_balances(
                &db_tx,
                Condition::all().add(expenses::Column::GroupId.eq(group_id)),
            )
            .await
        })
    }

    /// Net position of every user appearing in the thread ledger
    /// (thread readers only).
    pub async fn thread_balances(
        &self,
        thread_id: i32,
        user_id: i32,
    ) -> ResultEngine<Vec<Balance>> {
        with_tx!(self, |db_tx| {
            let thread = self.require_thread(&db_tx, thread_id).await?;
            self.require_thread_read(&db_tx, &thread, user_id).await?;
            self.scope_balances(
                &db_tx,
                Condition::all().add(expenses::Column::ThreadId.eq(thread_id)),
            )
            .await
        })
    }

    /// The groups of `user_id` with their own net balance in each one.
    pub async fn user_group_summaries(&self, user_id: i32) -> ResultEngine<Vec<GroupSummary>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let mut summaries = Vec::new();
            for group in self.member_groups(&db_tx, user_id).await? {
                let entries = self
                    .ledger_entries(
                        &db_tx,
                        Condition::all().add(expenses::Column::GroupId.eq(group.id)),
                    )
                    .await?;
                summaries.push(GroupSummary {
                    group_id: group.id,
                    group_name: group.name,
                    total_balance: net_of(user_id, &entries),
                });
            }
            Ok(summaries)
        })
    }

    /// Threads of the user's groups plus the threads they created, with the
    /// user's net balance in each one.
    pub async fn user_thread_summaries(&self, user_id: i32) -> ResultEngine<Vec<ThreadSummary>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let group_ids: Vec<i32> = self
                .member_groups(&db_tx, user_id)
                .await?
                .into_iter()
                .map(|g| g.id)
                .collect();
            let visible = threads::Entity::find()
                .filter(
                    Condition::any()
                        .add(threads::Column::GroupId.is_in(group_ids))
                        .add(threads::Column::CreatedBy.eq(user_id)),
                )
                .order_by_asc(threads::Column::Id)
                .all(&db_tx)
                .await?;

            let mut summaries = Vec::with_capacity(visible.len());
            for thread in visible {
                let entries = self
                    .ledger_entries(
                        &db_tx,
                        Condition::all().add(expenses::Column::ThreadId.eq(thread.id)),
                    )
                    .await?;
                summaries.push(ThreadSummary {
                    thread_id: thread.id,
                    thread_name: thread.name,
                    total_balance: net_of(user_id, &entries),
                });
            }
            Ok(summaries)
        })
    }

    async fn scope_balances(
        &self,
        db: &DatabaseTransaction,
        condition: Condition,
    ) -> ResultEngine<Vec<Balance>> {
        let entries = self.ledger_entries(db, condition).await?;
        let rows = member_balances(&entries);
        let names = self.usernames(db, rows.iter().map(|b| b.user_id)).await?;
        Ok(with_usernames(rows, &names))
    }

    /// Splits joined with the payer of their expense, filtered by `condition`
    /// over both tables.
    async fn ledger_entries(
        &self,
        db: &DatabaseTransaction,
        condition: Condition,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        splits::Entity::find()
            .select_only()
            .column_as(splits::Column::ExpenseId, "expense_id")
            .column_as(expenses::Column::PaidBy, "payer_id")
            .column_as(splits::Column::UserId, "debtor_id")
            .column_as(splits::Column::AmountOwed, "amount_owed")
            .join(JoinType::InnerJoin, splits::Relation::Expenses.def())
            .filter(condition)
            .order_by_asc(splits::Column::ExpenseId)
            .into_model::<LedgerEntry>()
            .all(db)
            .await
            .map_err(Into::into)
    }
}

fn net_of(user_id: i32, entries: &[LedgerEntry]) -> f64 {
    member_balances(entries)
        .into_iter()
        .find(|b| b.user_id == user_id)
        .map_or(0.0, |b| b.net_balance)
}
