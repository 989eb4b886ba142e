use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{ResultEngine, Thread, threads};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Opens a thread, inside `group_id` when given (the creator must be a
    /// member) or as a private thread otherwise.
    pub async fn new_thread(
        &self,
        name: &str,
        group_id: Option<i32>,
        user_id: i32,
    ) -> ResultEngine<i32> {
        let name = normalize_required_name(name, "thread name")?;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            if let Some(group_id) = group_id {
                self.require_group(&db_tx, group_id).await?;
                self.require_group_member(&db_tx, group_id, user_id).await?;
            }

            let thread = threads::ActiveModel {
                name: ActiveValue::Set(name),
                group_id: ActiveValue::Set(group_id),
                created_by: ActiveValue::Set(user_id),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(thread_id = thread.id, ?group_id, "thread created");
            Ok(thread.id)
        })
    }

    pub async fn thread(&self, thread_id: i32, user_id: i32) -> ResultEngine<Thread> {
        with_tx!(self, |db_tx| {
            let thread = self.require_thread(&db_tx, thread_id).await?;
            self.require_thread_read(&db_tx, &thread, user_id).await?;
            Ok(Thread::from(thread))
        })
    }

    /// Threads of a group, by id (members only).
    pub async fn group_threads(&self, group_id: i32, user_id: i32) -> ResultEngine<Vec<Thread>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.require_group_member(&db_tx, group_id, user_id).await?;

            let rows = threads::Entity::find()
                .filter(threads::Column::GroupId.eq(group_id))
                .order_by_asc(threads::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(rows.into_iter().map(Thread::from).collect::<Vec<_>>())
        })
    }
}
