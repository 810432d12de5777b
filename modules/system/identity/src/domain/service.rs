use std::sync::Arc;

use async_trait::async_trait;
use crm_security::{
    CredentialVerifier, LookupError, RoleLookup, RoleRecord, UserLookup, UserRecord,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, Set,
};
use time::OffsetDateTime;
use tokio::sync::OnceCell;
use tracing::{debug, error, instrument};

use crate::domain::error::IdentityError;
use crate::domain::password::{DEFAULT_COST, hash_password, verify_password};
use crate::infra::storage::entity::{role, user};

#[derive(Debug, Clone)]
pub struct NewRole {
    pub company_id: i32,
    pub name: String,
    pub display_name: String,
    pub is_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub company_id: i32,
    pub role_id: i32,
    pub name: String,
    pub password: String,
    pub is_enabled: bool,
}

/// Users and roles over sea-orm.
///
/// Lookups run on the pooled connection, outside any request transaction.
/// Mutations take the connection to write through, so callers decide whether
/// they are part of a request transaction.
#[derive(Clone)]
pub struct IdentityService {
    db: DatabaseConnection,
    bcrypt_cost: u32,
    /// Checked against when the user name is unknown, so every login attempt
    /// pays for one bcrypt verification.
    decoy_hash: Arc<OnceCell<String>>,
}

impl IdentityService {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            bcrypt_cost: DEFAULT_COST,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Cost factor for newly hashed passwords. Existing hashes keep theirs.
    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self.decoy_hash = Arc::new(OnceCell::new());
        self
    }

    async fn hash(&self, password: String) -> Result<String, IdentityError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| IdentityError::Db(DbErr::Custom(format!("hashing task failed: {e}"))))?
            .map_err(IdentityError::from)
    }

    async fn decoy_hash(&self) -> Result<&str, LookupError> {
        self.decoy_hash
            .get_or_try_init(|| self.hash("decoy-password".to_owned()))
            .await
            .map(String::as_str)
            .map_err(|e| LookupError::Storage(e.to_string()))
    }

    /// # Errors
    /// `Db` on storage failure, including a duplicate `(company_id, name)`.
    #[instrument(skip(self, conn, new), fields(company_id = new.company_id, name = %new.name))]
    pub async fn create_role(
        &self,
        conn: &impl ConnectionTrait,
        new: NewRole,
    ) -> Result<RoleRecord, IdentityError> {
        let model = role::ActiveModel {
            company_id: Set(new.company_id),
            name: Set(new.name),
            display_name: Set(new.display_name),
            is_enabled: Set(new.is_enabled),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        debug!(role_id = model.id, "role created");
        Ok(model.into())
    }

    /// Hash the password and store the user.
    ///
    /// # Errors
    /// `Hash` if hashing fails, `Db` on storage failure.
    #[instrument(skip(self, conn, new), fields(company_id = new.company_id, name = %new.name))]
    pub async fn create_user(
        &self,
        conn: &impl ConnectionTrait,
        new: NewUser,
    ) -> Result<UserRecord, IdentityError> {
        let password_hash = self.hash(new.password).await?;

        let model = user::ActiveModel {
            company_id: Set(new.company_id),
            role_id: Set(new.role_id),
            name: Set(new.name),
            password_hash: Set(password_hash),
            is_enabled: Set(new.is_enabled),
            created_at: Set(OffsetDateTime::now_utc()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        debug!(user_id = model.id, "user created");
        Ok(model.into())
    }

    /// # Errors
    /// `NotFound` for an unknown user, `Db` on storage failure.
    pub async fn assign_role(
        &self,
        conn: &impl ConnectionTrait,
        user_id: i32,
        role_id: i32,
    ) -> Result<UserRecord, IdentityError> {
        let found = user::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .ok_or(IdentityError::NotFound {
                entity: "user",
                id: user_id,
            })?;
        let mut active = found.into_active_model();
        active.role_id = Set(role_id);
        Ok(active.update(conn).await?.into())
    }

    /// # Errors
    /// `NotFound` for an unknown role, `Db` on storage failure.
    pub async fn set_role_enabled(
        &self,
        conn: &impl ConnectionTrait,
        role_id: i32,
        enabled: bool,
    ) -> Result<RoleRecord, IdentityError> {
        let found = role::Entity::find_by_id(role_id)
            .one(conn)
            .await?
            .ok_or(IdentityError::NotFound {
                entity: "role",
                id: role_id,
            })?;
        let mut active = found.into_active_model();
        active.is_enabled = Set(enabled);
        Ok(active.update(conn).await?.into())
    }
}

fn storage(err: DbErr) -> LookupError {
    LookupError::Storage(err.to_string())
}

#[async_trait]
impl RoleLookup for IdentityService {
    async fn get_role(&self, role_id: i32) -> Result<RoleRecord, LookupError> {
        role::Entity::find_by_id(role_id)
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(RoleRecord::from)
            .ok_or_else(|| LookupError::not_found("role", role_id))
    }
}

#[async_trait]
impl UserLookup for IdentityService {
    async fn get_user(&self, user_id: i32) -> Result<UserRecord, LookupError> {
        user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(UserRecord::from)
            .ok_or_else(|| LookupError::not_found("user", user_id))
    }
}

#[async_trait]
impl CredentialVerifier for IdentityService {
    #[instrument(skip(self, password))]
    async fn verify_credentials(
        &self,
        company_id: i32,
        user_name: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, LookupError> {
        let found = user::Entity::find()
            .filter(user::Column::CompanyId.eq(company_id))
            .filter(user::Column::Name.eq(user_name))
            .one(&self.db)
            .await
            .map_err(storage)?;

        let hash = match &found {
            Some(found) => found.password_hash.clone(),
            None => self.decoy_hash().await?.to_owned(),
        };
        let plain = password.to_owned();
        let user_id = found.as_ref().map(|f| f.id);
        let matches = tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
            .await
            .map_err(|e| LookupError::Storage(format!("password check task failed: {e}")))?
            .map_err(|e| {
                error!(?user_id, error = %e, "stored password hash is unusable");
                LookupError::Storage("stored password hash is unusable".to_owned())
            })?;

        let Some(found) = found else {
            debug!(reason = "unknown_user", "login refused");
            return Ok(None);
        };
        if !found.is_enabled {
            debug!(reason = "user_disabled", user_id = found.id, "login refused");
            return Ok(None);
        }
        if !matches {
            debug!(reason = "bad_password", user_id = found.id, "login refused");
            return Ok(None);
        }
        Ok(Some(found.into()))
    }
}
