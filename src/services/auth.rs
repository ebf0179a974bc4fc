// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::{Acquire, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AdminSeed,
    db::UserRepository,
    models::auth::{Capability, Claims, NewAccount, Role, User},
    services::access::require_capability,
};

/// Whether `actor` may delete `target`: only the creator, and only one
/// step down the delegation chain.
pub fn can_delete(actor: &User, target: &User) -> bool {
    actor.role.delegates_to() == Some(target.role) && target.created_by == Some(actor.id)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl: chrono::Duration,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, ttl_hours: i64, pool: PgPool) -> Self {
        Self {
            user_repo,
            jwt_secret,
            token_ttl: chrono::Duration::hours(ttl_hours),
            pool,
        }
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // bcrypt is CPU-bound; keep it off the async workers
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;

        if !is_password_valid {
            tracing::warn!(%username, "failed login");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, role = ?user.role, "user logged in");
        self.create_token(user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(&self.pool, token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub(crate) fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    async fn hash_password(password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;
        Ok(hashed)
    }

    // --- Delegated accounts ---

    /// An Owner creates a client (tenant owner) with its tenant quota.
    pub async fn create_tenant_owner<'e, E>(
        &self,
        executor: E,
        actor: &User,
        account: NewAccount,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        require_capability(actor, Capability::ManageTenantOwners)?;
        self.create_delegated(executor, actor, account, Role::TenantOwner).await
    }

    /// A tenant owner creates a crew worker under its account.
    pub async fn create_crew<'e, E>(
        &self,
        executor: E,
        actor: &User,
        account: NewAccount,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        require_capability(actor, Capability::ManageCrew)?;
        self.create_delegated(executor, actor, account, Role::CrewWorker).await
    }

    async fn create_delegated<'e, E>(
        &self,
        executor: E,
        actor: &User,
        account: NewAccount,
        role: Role,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let password_hash = Self::hash_password(&account.password).await?;

        let mut tx = executor.begin().await?;
        let user = self
            .user_repo
            .create_user(&mut *tx, &account, &password_hash, role, Some(actor.id))
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, created_by = %actor.id, ?role, "account created");
        Ok(user)
    }

    /// Accounts of `role` the actor created: clients for an Owner, crew
    /// for a tenant owner. Asking for any other role is denied.
    pub async fn list_created_users(&self, actor: &User, role: Role) -> Result<Vec<User>, AppError> {
        if actor.role.delegates_to() != Some(role) {
            return Err(AppError::AccessDenied);
        }
        self.user_repo.list_created_by(actor.id, role).await
    }

    pub async fn delete_user<'e, E>(
        &self,
        executor: E,
        actor: &User,
        user_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let target = self
            .user_repo
            .find_by_id(&mut *tx, user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if !can_delete(actor, &target) {
            tracing::warn!(actor_id = %actor.id, target_id = %user_id, "user deletion denied");
            return Err(AppError::AccessDenied);
        }

        self.user_repo.delete(&mut *tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(actor_id = %actor.id, target_id = %user_id, "account deleted");
        Ok(())
    }

    /// Creates the platform owner account from config if it is missing.
    pub async fn ensure_owner_account<'e, E>(
        &self,
        executor: E,
        seed: &AdminSeed,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if self.user_repo.find_by_username(&seed.username).await?.is_some() {
            return Ok(None);
        }

        let password_hash = Self::hash_password(&seed.password).await?;
        let account = NewAccount {
            username: seed.username.clone(),
            password: seed.password.clone(),
            email: None,
            phone: String::new(),
            address: String::new(),
            max_tenants: 1,
        };

        let mut tx = executor.begin().await?;
        let owner = self
            .user_repo
            .create_user(&mut *tx, &account, &password_hash, Role::Owner, None)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %owner.id, username = %owner.username, "owner account seeded");
        Ok(Some(owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, created_by: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "someone".into(),
            email: None,
            password_hash: String::new(),
            role,
            phone: String::new(),
            address: String::new(),
            max_tenants: 1,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn creator_deletes_one_step_down() {
        let owner = user(Role::Owner, None);
        let client = user(Role::TenantOwner, Some(owner.id));
        let crew = user(Role::CrewWorker, Some(client.id));

        assert!(can_delete(&owner, &client));
        assert!(can_delete(&client, &crew));
    }

    #[test]
    fn nobody_else_deletes() {
        let owner = user(Role::Owner, None);
        let client = user(Role::TenantOwner, Some(owner.id));
        let other_client = user(Role::TenantOwner, Some(owner.id));
        let crew = user(Role::CrewWorker, Some(client.id));

        // not the creator
        assert!(!can_delete(&other_client, &crew));
        // skips a level
        assert!(!can_delete(&owner, &crew));
        // upwards
        assert!(!can_delete(&crew, &client));
        assert!(!can_delete(&client, &owner));
    }
}
