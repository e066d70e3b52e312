//! Session repository for refresh token rotation.
//!
//! Refresh tokens are stored as SHA-256 hashes, never in the clear.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use tala_shared::AppError;

use crate::entities::sessions;

/// Session repository implementation.
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

    /// Record a session for a freshly issued refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        user_agent: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<sessions::Model, AppError> {
        let model = sessions::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            refresh_token_hash: Set(hash_token(refresh_token)),
            user_agent: Set(user_agent),
            expires_at: Set(expires_at.into()),
            revoked_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        model
            .insert(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the live session backing a refresh token, if any.
    ///
    /// Expired and revoked sessions do not match.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn find_live(
        &self,
        refresh_token: &str,
    ) -> Result<Option<sessions::Model>, AppError> {
        sessions::Entity::find()
            .filter(sessions::Column::RefreshTokenHash.eq(hash_token(refresh_token)))
            .filter(sessions::Column::RevokedAt.is_null())
            .filter(sessions::Column::ExpiresAt.gt(Utc::now()))
            .one(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Revoke a session (refresh token rotation or logout).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the update fails.
    pub async fn revoke(&self, session_id: Uuid) -> Result<(), AppError> {
        sessions::Entity::update_many()
            .set(sessions::ActiveModel {
                revoked_at: Set(Some(Utc::now().into())),
                ..Default::default()
            })
            .filter(sessions::Column::Id.eq(session_id))
            .exec(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

/// SHA-256 hex digest of a token.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_and_hex() {
        let a = hash_token("some-refresh-token");
        let b = hash_token("some-refresh-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_tokens_different_hashes() {
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }
}
