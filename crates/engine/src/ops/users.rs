use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, ResultEngine, User, users};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Registers a user.
    ///
    /// `password_hash` is stored as given: hashing and verifying credentials
    /// belong to the caller.
    pub async fn new_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> ResultEngine<i32> {
        let username = normalize_required_name(username, "username")?;
        let email = normalize_required_name(email, "email")?;

        with_tx!(self, |db_tx| {
            if users::Entity::find()
                .filter(users::Column::Username.eq(username.clone()))
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }
            if users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(email));
            }

            let user = users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                email: ActiveValue::Set(email),
                password_hash: ActiveValue::Set(password_hash.to_string()),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(user_id = user.id, %username, "user created");
            Ok(user.id)
        })
    }

    /// Every registered user, by id.
    pub async fn list_users(&self) -> ResultEngine<Vec<User>> {
        let rows = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn user(&self, user_id: i32) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::NotFound(format!("user {user_id}")))
    }

    pub async fn user_by_username(&self, username: &str) -> ResultEngine<User> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::NotFound(format!("user {username}")))
    }
}
