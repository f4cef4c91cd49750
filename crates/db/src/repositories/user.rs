//! User repository for database operations.

use hrms_shared::{AppResult, Role};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::UserRole, users};
use crate::error::map_db_err;

/// User repository for identity lookups.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a non-deleted user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(map_db_err)
    }

    /// Finds a non-deleted user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(map_db_err)
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns `conflict` if the username is taken, or a database error.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        full_name: &str,
        role: Role,
    ) -> AppResult<users::Model> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            full_name: Set(full_name.to_string()),
            role: Set(UserRole::from(role)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        user.insert(&self.db).await.map_err(map_db_err)
    }
}
