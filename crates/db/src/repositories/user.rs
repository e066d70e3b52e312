//! User repository.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use tala_shared::AppError;

use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Login email (unique).
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Argon2id PHC hash of the password.
    pub password_hash: String,
    /// Role in the back office.
    pub role: UserRole,
}

/// User repository implementation.
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

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if the email is taken, `Database` on
    /// other failures.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, AppError> {
        let now = Utc::now();
        let model = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(input.email.to_lowercase()),
            full_name: Set(input.full_name),
            password_hash: Set(input.password_hash),
            role: Set(input.role),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        model.insert(&self.db).await.map_err(|e| {
            let msg = e.to_string();
            if msg.contains("duplicate") || msg.contains("unique") {
                AppError::Conflict("email already registered".to_string())
            } else {
                AppError::Database(msg)
            }
        })
    }

    /// Find a user by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, AppError> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, AppError> {
        users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Role string used inside JWT claims.
#[must_use]
pub fn role_as_str(role: &UserRole) -> &'static str {
    match role {
        UserRole::Employee => "employee",
        UserRole::Supervisor => "supervisor",
        UserRole::Manager => "manager",
        UserRole::Admin => "admin",
    }
}
