// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::is_unique_violation, error::AppError},
    models::auth::{NewAccount, Role, User},
};

const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, role, phone, address,
    max_tenants, created_by, created_at, updated_at
"#;

// All access to the 'users' table
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(maybe_user)
    }

    /// Locks the user row until the surrounding transaction ends.
    /// Used to serialize quota-checked tenant creation per owner.
    pub async fn lock_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    // Duplicate usernames become a 409 instead of a 500.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        account: &NewAccount,
        password_hash: &str,
        role: Role,
        created_by: Option<Uuid>,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, role, phone, address, max_tenants, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&account.username)
            .bind(&account.email)
            .bind(password_hash)
            .bind(role)
            .bind(&account.phone)
            .bind(&account.address)
            .bind(account.max_tenants)
            .bind(created_by)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "users_username_key") {
                    AppError::UsernameAlreadyExists(account.username.clone())
                } else {
                    e.into()
                }
            })
    }

    /// Accounts of `role` created by `creator`, newest first.
    pub async fn list_created_by(&self, creator: Uuid, role: Role) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE created_by = $1 AND role = $2 ORDER BY created_at DESC"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(creator)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn count_created_by(&self, creator: Uuid, role: Role) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE created_by = $1 AND role = $2")
                .bind(creator)
                .bind(role)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
