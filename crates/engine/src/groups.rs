//! Groups: named collections of users owning threads and expenses.

use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::GroupRole;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: i32,
    pub name: String,
}

/// A group member with the username resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Member {
    pub user_id: i32,
    pub username: String,
    pub role: GroupRole,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupMembers {
    pub group_id: i32,
    pub group_name: String,
    pub members: Vec<Member>,
}

/// Caller's net position inside one group.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group_id: i32,
    pub group_name: String,
    pub total_balance: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_memberships::Entity")]
    Memberships,
    #[sea_orm(has_many = "super::threads::Entity")]
    Threads,
}

impl Related<super::group_memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::threads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Threads.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Group {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}
