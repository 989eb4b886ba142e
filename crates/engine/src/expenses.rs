//! Expense primitives.
//!
//! An expense is the central fact of the ledger: somebody paid `amount` and
//! one [split](crate::splits) per participant records what each one owes for
//! it. Expenses carry no computed fields; balances are always derived from
//! the splits.

use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::SplitRequest;

/// Where an expense lives. Both `None` means a personal expense.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scope {
    pub group_id: Option<i32>,
    pub thread_id: Option<i32>,
}

impl Scope {
    pub fn personal() -> Self {
        Self::default()
    }

    pub fn group(group_id: i32) -> Self {
        Self {
            group_id: Some(group_id),
            thread_id: None,
        }
    }

    pub fn thread(thread_id: i32) -> Self {
        Self {
            group_id: None,
            thread_id: Some(thread_id),
        }
    }

    pub fn is_personal(&self) -> bool {
        self.group_id.is_none() && self.thread_id.is_none()
    }
}

/// Command for [`Engine::record_expense`](crate::Engine::record_expense).
#[derive(Clone, Debug, PartialEq)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub paid_by: i32,
    pub scope: Scope,
    pub split: SplitRequest,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Participant {
    pub user_id: i32,
    pub username: String,
    pub amount_owed: f64,
}

/// Expense with its participants, as listed for a group or a thread.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExpenseDetail {
    pub id: i32,
    pub title: String,
    pub amount: f64,
    pub paid_by: i32,
    pub group_id: Option<i32>,
    pub thread_id: Option<i32>,
    pub thread_name: Option<String>,
    pub participants: Vec<Participant>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub amount: f64,
    pub paid_by: i32,
    pub group_id: Option<i32>,
    pub thread_id: Option<i32>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
    #[sea_orm(
        belongs_to = "super::threads::Entity",
        from = "Column::ThreadId",
        to = "super::threads::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Threads,
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl Related<super::threads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Threads.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
