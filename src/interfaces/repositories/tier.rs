use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::tier::{AccountTier, ThumbnailSize},
    errors::AppError,
    repositories::sqlx_repo::SqlxTierRepo,
};

#[async_trait]
pub trait TierRepository: Send + Sync {
    async fn get_tier(&self, id: &Uuid) -> Result<Option<AccountTier>, AppError>;
    async fn sizes_for_tier(&self, tier_id: &Uuid) -> Result<Vec<ThumbnailSize>, AppError>;
    /// Whether `height` is a registered thumbnail size for the tier of the
    /// given user. Used by the resolution pipeline, which knows the image
    /// owner but not the owner's tier.
    async fn size_exists_for_user(&self, user_id: &Uuid, height: i32) -> Result<bool, AppError>;
}

impl SqlxTierRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxTierRepo { pool }
    }
}

#[async_trait]
impl TierRepository for SqlxTierRepo {
    async fn get_tier(&self, id: &Uuid) -> Result<Option<AccountTier>, AppError> {
        sqlx::query_as::<_, AccountTier>(
            "SELECT id, name, description, can_generate_expiring_links \
             FROM account_tiers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn sizes_for_tier(&self, tier_id: &Uuid) -> Result<Vec<ThumbnailSize>, AppError> {
        sqlx::query_as::<_, ThumbnailSize>(
            "SELECT id, account_tier_id, height \
             FROM thumbnail_sizes WHERE account_tier_id = $1 ORDER BY height",
        )
        .bind(tier_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn size_exists_for_user(&self, user_id: &Uuid, height: i32) -> Result<bool, AppError> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS( \
                SELECT 1 FROM thumbnail_sizes ts \
                JOIN users u ON u.account_tier_id = ts.account_tier_id \
                WHERE u.id = $1 AND ts.height = $2)",
        )
        .bind(user_id)
        .bind(height)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(exists.unwrap_or(false))
    }
}
