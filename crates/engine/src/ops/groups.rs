use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, JoinType, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    EngineError, Group, GroupMembers, Member, ResultEngine, group_memberships, groups,
};

use super::{Engine, GroupRole, normalize_required_name, with_tx};

impl Engine {
    /// Creates a group. The creator becomes its admin, every other listed
    /// user a plain member.
    pub async fn new_group(
        &self,
        name: &str,
        creator_id: i32,
        member_ids: &[i32],
    ) -> ResultEngine<i32> {
        let name = normalize_required_name(name, "group name")?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, creator_id).await?;
            self.require_users(&db_tx, member_ids).await?;

            if groups::Entity::find()
                .filter(groups::Column::Name.eq(name.clone()))
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(name));
            }

            let group = groups::ActiveModel {
                name: ActiveValue::Set(name.clone()),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            self.insert_membership(&db_tx, group.id, creator_id, GroupRole::Admin)
                .await?;
            let others: BTreeSet<i32> = member_ids
                .iter()
                .copied()
                .filter(|id| *id != creator_id)
                .collect();
            for member_id in others {
                self.insert_membership(&db_tx, group.id, member_id, GroupRole::Member)
                    .await?;
            }

            tracing::info!(group_id = group.id, %name, "group created");
            Ok(group.id)
        })
    }

    /// Adds users to a group (admin-only). Users already in the group are
    /// skipped. Returns how many memberships were created.
    pub async fn add_group_members(
        &self,
        group_id: i32,
        member_ids: &[i32],
        user_id: i32,
    ) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.require_group_admin(&db_tx, group_id, user_id).await?;
            self.require_users(&db_tx, member_ids).await?;

            let mut added = 0;
            let wanted: BTreeSet<i32> = member_ids.iter().copied().collect();
            for member_id in wanted {
                if self.group_role(&db_tx, group_id, member_id).await?.is_some() {
                    continue;
                }
                self.insert_membership(&db_tx, group_id, member_id, GroupRole::Member)
                    .await?;
                added += 1;
            }

            tracing::info!(group_id, added, "group members added");
            Ok(added)
        })
    }

    /// Groups the user belongs to, by id.
    pub async fn user_groups(&self, user_id: i32) -> ResultEngine<Vec<Group>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let rows = self.member_groups(&db_tx, user_id).await?;
            Ok(rows.into_iter().map(Group::from).collect::<Vec<_>>())
        })
    }

    /// Group name and members (members only).
    pub async fn group_members(&self, group_id: i32, user_id: i32) -> ResultEngine<GroupMembers> {
        with_tx!(self, |db_tx| {
            let group = self.require_group(&db_tx, group_id).await?;
            self.require_group_member(&db_tx, group_id, user_id).await?;

            let memberships = group_memberships::Entity::find()
                .filter(group_memberships::Column::GroupId.eq(group_id))
                .order_by_asc(group_memberships::Column::UserId)
                .all(&db_tx)
                .await?;
            let names = self
                .usernames(&db_tx, memberships.iter().map(|m| m.user_id))
                .await?;

            let mut members = Vec::with_capacity(memberships.len());
            for membership in memberships {
                members.push(Member {
                    user_id: membership.user_id,
                    username: names.get(&membership.user_id).cloned().unwrap_or_default(),
                    role: GroupRole::try_from(membership.role.as_str())?,
                });
            }

            Ok(GroupMembers {
                group_id: group.id,
                group_name: group.name,
                members,
            })
        })
    }

    pub(super) async fn member_groups(
        &self,
        db: &DatabaseTransaction,
        user_id: i32,
    ) -> ResultEngine<Vec<groups::Model>> {
        groups::Entity::find()
            .join(JoinType::InnerJoin, groups::Relation::Memberships.def())
            .filter(group_memberships::Column::UserId.eq(user_id))
            .order_by_asc(groups::Column::Id)
            .all(db)
            .await
            .map_err(Into::into)
    }

    async fn insert_membership(
        &self,
        db: &DatabaseTransaction,
        group_id: i32,
        user_id: i32,
        role: GroupRole,
    ) -> ResultEngine<()> {
        group_memberships::Entity::insert(group_memberships::ActiveModel {
            group_id: ActiveValue::Set(group_id),
            user_id: ActiveValue::Set(user_id),
            role: ActiveValue::Set(role.as_str().to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        })
        .exec_without_returning(db)
        .await?;
        Ok(())
    }
}
