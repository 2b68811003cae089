#[cfg(test)]
use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
#[cfg(test)]
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::user::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Inserts a new account. Returns `None` if the email is already registered.
    async fn create(&self, full_name: &str, email: &str, password_hash: &str) -> Result<Option<User>>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, full_name: &str, email: &str, password_hash: &str) -> Result<Option<User>> {
        // The unique index decides races between concurrent registrations.
        Ok(sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, full_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(full_name)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

#[cfg(test)]
#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, full_name: &str, email: &str, password_hash: &str) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: chrono::Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(Some(user))
    }
}
