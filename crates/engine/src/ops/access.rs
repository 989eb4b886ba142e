use std::collections::{BTreeSet, HashMap};

use sea_orm::{Condition, DatabaseTransaction, JoinType, QueryFilter, QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, ResultEngine, expenses, group_memberships, groups, splits, threads, users,
};

use super::Engine;

/// Role of a user inside a group.
///
/// - `admin`: can add members and delete the group (the creator).
/// - `member`: can read the group and record expenses in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Admin,
    Member,
}

impl GroupRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub(super) fn can_manage(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl TryFrom<&str> for GroupRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(EngineError::InvalidName(format!(
                "invalid group role: {other}"
            ))),
        }
    }
}

impl Engine {
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: i32,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("user {user_id}")))
    }

    /// Fails with `NotFound` naming the first id without a user row.
    pub(super) async fn require_users(
        &self,
        db: &DatabaseTransaction,
        user_ids: &[i32],
    ) -> ResultEngine<()> {
        let found: BTreeSet<i32> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect();
        match user_ids.iter().find(|id| !found.contains(id)) {
            Some(missing) => Err(EngineError::NotFound(format!("user {missing}"))),
            None => Ok(()),
        }
    }

    pub(super) async fn usernames(
        &self,
        db: &DatabaseTransaction,
        user_ids: impl IntoIterator<Item = i32>,
    ) -> ResultEngine<HashMap<i32, String>> {
        let ids: BTreeSet<i32> = user_ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|u| (u.id, u.username)).collect())
    }

    pub(super) async fn require_group(
        &self,
        db: &DatabaseTransaction,
        group_id: i32,
    ) -> ResultEngine<groups::Model> {
        groups::Entity::find_by_id(group_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("group {group_id}")))
    }

    pub(super) async fn require_thread(
        &self,
        db: &DatabaseTransaction,
        thread_id: i32,
    ) -> ResultEngine<threads::Model> {
        threads::Entity::find_by_id(thread_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("thread {thread_id}")))
    }

    pub(super) async fn group_role(
        &self,
        db: &DatabaseTransaction,
        group_id: i32,
        user_id: i32,
    ) -> ResultEngine<Option<GroupRole>> {
        let row = group_memberships::Entity::find_by_id((group_id, user_id))
            .one(db)
            .await?;
        row.as_ref()
            .map(|m| GroupRole::try_from(m.role.as_str()))
            .transpose()
    }

    pub(super) async fn require_group_member(
        &self,
        db: &DatabaseTransaction,
        group_id: i32,
        user_id: i32,
    ) -> ResultEngine<GroupRole> {
        self.group_role(db, group_id, user_id)
            .await?
            .ok_or_else(|| EngineError::Forbidden(format!("user {user_id} is not in group {group_id}")))
    }

    pub(super) async fn require_group_admin(
        &self,
        db: &DatabaseTransaction,
        group_id: i32,
        user_id: i32,
    ) -> ResultEngine<()> {
        let role = self.require_group_member(db, group_id, user_id).await?;
        if !role.can_manage() {
            return Err(EngineError::Forbidden(format!(
                "user {user_id} cannot manage group {group_id}"
            )));
        }
        Ok(())
    }

    /// Group threads follow group membership; a private thread is visible to
    /// its creator and to anybody appearing in its ledger.
    pub(super) async fn require_thread_read(
        &self,
        db: &DatabaseTransaction,
        thread: &threads::Model,
        user_id: i32,
    ) -> ResultEngine<()> {
        if let Some(group_id) = thread.group_id {
            self.require_group_member(db, group_id, user_id).await?;
            return Ok(());
        }
        if thread.created_by == user_id {
            return Ok(());
        }

        let involved = splits::Entity::find()
            .join(JoinType::InnerJoin, splits::Relation::Expenses.def())
            .filter(expenses::Column::ThreadId.eq(thread.id))
            .filter(
                Condition::any()
                    .add(splits::Column::UserId.eq(user_id))
                    .add(expenses::Column::PaidBy.eq(user_id)),
            )
            .one(db)
            .await?
            .is_some();
        if !involved {
            return Err(EngineError::Forbidden(format!(
                "user {user_id} cannot read thread {}",
                thread.id
            )));
        }
        Ok(())
    }

    /// Thread creator or, for group threads, a group admin.
    pub(super) async fn require_thread_owner(
        &self,
        db: &DatabaseTransaction,
        thread: &threads::Model,
        user_id: i32,
    ) -> ResultEngine<()> {
        if thread.created_by == user_id {
            return Ok(());
        }
        match thread.group_id {
            Some(group_id) => self.require_group_admin(db, group_id, user_id).await,
            None => Err(EngineError::Forbidden(format!(
                "user {user_id} cannot manage thread {}",
                thread.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_strings() {
        assert_eq!(GroupRole::try_from("admin").unwrap(), GroupRole::Admin);
        assert_eq!(GroupRole::try_from(GroupRole::Member.as_str()).unwrap(), GroupRole::Member);
    }

    #[test]
    fn only_admin_can_manage() {
        assert!(GroupRole::Admin.can_manage());
        assert!(!GroupRole::Member.can_manage());
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(matches!(
            GroupRole::try_from("owner"),
            Err(EngineError::InvalidName(_))
        ));
    }
}
