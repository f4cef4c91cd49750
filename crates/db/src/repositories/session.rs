//! Session repository for refresh-token bookkeeping.

use chrono::{DateTime, Utc};
use hrms_shared::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait, sea_query::Expr,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::sessions;
use crate::error::map_db_err;

/// Session repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hashes a refresh token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Creates a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
        user_agent: Option<&str>,
    ) -> AppResult<sessions::Model> {
        insert_session(&self.db, user_id, refresh_token, expires_at, user_agent).await
    }

    /// Finds an unrevoked, unexpired session by refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active_by_token(
        &self,
        refresh_token: &str,
    ) -> AppResult<Option<sessions::Model>> {
        sessions::Entity::find()
            .filter(sessions::Column::RefreshTokenHash.eq(Self::hash_token(refresh_token)))
            .filter(sessions::Column::RevokedAt.is_null())
            .filter(sessions::Column::ExpiresAt.gt(Utc::now()))
            .one(&self.db)
            .await
            .map_err(map_db_err)
    }

    /// Revokes `session_id` and stores a session for `new_token`, atomically.
    ///
    /// # Errors
    ///
    /// Returns `unauthorized` when the session was revoked concurrently, or a
    /// database error.
    pub async fn rotate(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        new_token: &str,
        expires_at: DateTime<Utc>,
        user_agent: Option<&str>,
    ) -> AppResult<sessions::Model> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let revoked = revoke_session(&txn, session_id).await?;
        if revoked == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Err(AppError::unauthorized("invalid or expired token"));
        }

        let session = insert_session(&txn, user_id, new_token, expires_at, user_agent).await?;
        txn.commit().await.map_err(map_db_err)?;
        Ok(session)
    }

    /// Revokes the session holding `refresh_token`.
    ///
    /// Returns whether a session was revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_by_token(&self, refresh_token: &str) -> AppResult<bool> {
        let Some(session) = self.find_active_by_token(refresh_token).await? else {
            return Ok(false);
        };
        Ok(revoke_session(&self.db, session.id).await? > 0)
    }
}

async fn insert_session<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    refresh_token: &str,
    expires_at: DateTime<Utc>,
    user_agent: Option<&str>,
) -> AppResult<sessions::Model> {
    let now = Utc::now().into();

    sessions::ActiveModel {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id),
        refresh_token_hash: Set(SessionRepository::hash_token(refresh_token)),
        user_agent: Set(user_agent.map(String::from)),
        expires_at: Set(expires_at.into()),
        revoked_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(map_db_err)
}

async fn revoke_session<C: ConnectionTrait>(conn: &C, session_id: Uuid) -> AppResult<u64> {
    let now = Utc::now();

    let result = sessions::Entity::update_many()
        .col_expr(sessions::Column::RevokedAt, Expr::value(now))
        .col_expr(sessions::Column::UpdatedAt, Expr::value(now))
        .filter(sessions::Column::Id.eq(session_id))
        .filter(sessions::Column::RevokedAt.is_null())
        .exec(conn)
        .await
        .map_err(map_db_err)?;

    Ok(result.rows_affected)
}
