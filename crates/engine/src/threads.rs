//! Threads: sub-conversations, optionally inside a group.

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Thread {
    pub id: i32,
    pub name: String,
    pub group_id: Option<i32>,
    pub created_by: i32,
}

/// Caller's net position inside one thread.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThreadSummary {
    pub thread_id: i32,
    pub thread_name: String,
    pub total_balance: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "threads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub group_id: Option<i32>,
    pub created_by: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Groups,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Thread {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            group_id: model.group_id,
            created_by: model.created_by,
        }
    }
}
