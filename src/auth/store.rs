use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::models::User;
use crate::error::{AppError, Result};

/// Persistence boundary for user accounts.
///
/// `scan_page` orders by `(name ASC, id ASC)` and starts at the cursor user's
/// position (inclusive) when a cursor is given; the caller fetches one row
/// more than the page size and turns the extra row into the next cursor.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn insert(&self, user: User) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<User>>;
    async fn exists(&self, id: Uuid) -> Result<bool>;
    /// Full-row update keyed by `user.id`. `None` when the user is gone.
    async fn update(&self, user: &User) -> Result<Option<User>>;
    /// Rows removed (0 when the id is unknown).
    async fn delete(&self, id: Uuid) -> Result<u64>;
    async fn count(&self) -> Result<i64>;
    async fn scan_page(&self, cursor: Option<Uuid>, fetch: i64) -> Result<Vec<User>>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: User) -> Result<User> {
        let inserted = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, password_hash, is_admin, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn update(&self, user: &User) -> Result<Option<User>> {
        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET name = $1, password_hash = $2, is_admin = $3 WHERE id = $4 RETURNING *",
        )
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn scan_page(&self, cursor: Option<Uuid>, fetch: i64) -> Result<Vec<User>> {
        let users = match cursor {
            Some(cursor_id) => {
                let anchor = self
                    .find_by_id(cursor_id)
                    .await?
                    .ok_or_else(|| AppError::Validation("unknown cursor".to_string()))?;
                sqlx::query_as::<_, User>(
                    "SELECT * FROM users WHERE (name, id) >= ($1, $2) ORDER BY name ASC, id ASC LIMIT $3",
                )
                .bind(&anchor.name)
                .bind(anchor.id)
                .bind(fetch)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name ASC, id ASC LIMIT $1")
                    .bind(fetch)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(users)
    }
}

/// In-memory store backing the integration-test harness.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().unwrap().values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        users
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: User) -> Result<User> {
        self.users.write().unwrap().insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.name == name)
            .cloned())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.users.read().unwrap().contains_key(&id))
    }

    async fn update(&self, user: &User) -> Result<Option<User>> {
        let mut users = self.users.write().unwrap();
        match users.get_mut(&user.id) {
            Some(existing) => {
                existing.name = user.name.clone();
                existing.password_hash = user.password_hash.clone();
                existing.is_admin = user.is_admin;
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        Ok(self.users.write().unwrap().remove(&id).map_or(0, |_| 1))
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.users.read().unwrap().len() as i64)
    }

    async fn scan_page(&self, cursor: Option<Uuid>, fetch: i64) -> Result<Vec<User>> {
        let users = self.sorted();
        let start = match cursor {
            Some(cursor_id) => users
                .iter()
                .position(|u| u.id == cursor_id)
                .ok_or_else(|| AppError::Validation("unknown cursor".to_string()))?,
            None => 0,
        };
        Ok(users.into_iter().skip(start).take(fetch as usize).collect())
    }
}
