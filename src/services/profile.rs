//! User profile lookup — the presence engine's only database dependency.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Resolve a user id to a display name.
///
/// Injected as a trait object (like any other collaborator) so the location
/// and chat services can be exercised without a live database.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` means the user does not exist; infrastructure failures are
    /// the error case.
    async fn display_name(&self, user_id: Uuid) -> Result<Option<String>, ProfileError>;
}

/// Production lookup against the `profiles` table.
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn display_name(&self, user_id: Uuid) -> Result<Option<String>, ProfileError> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }
}
