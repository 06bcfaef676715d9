use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::image::{ImageInsert, ImageRecord},
    errors::AppError,
    repositories::sqlx_repo::SqlxImageRepo,
};

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn insert_image(&self, image: &ImageInsert) -> Result<Uuid, AppError>;
    async fn find_by_stored_filename(&self, filename: &str) -> Result<Option<ImageRecord>, AppError>;
    async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<ImageRecord>, AppError>;
}

impl SqlxImageRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxImageRepo { pool }
    }
}

#[async_trait]
impl ImageRepository for SqlxImageRepo {
    async fn insert_image(&self, image: &ImageInsert) -> Result<Uuid, AppError> {
        sqlx::query_scalar(
            r#"INSERT INTO images (
                owner_id,
                stored_filename,
                created_at,
                expires_at
            )
            VALUES ($1, $2, $3, $4) RETURNING id
            "#,
        )
        .bind(image.owner_id)
        .bind(&image.stored_filename)
        .bind(image.created_at)
        .bind(image.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn find_by_stored_filename(&self, filename: &str) -> Result<Option<ImageRecord>, AppError> {
        sqlx::query_as::<_, ImageRecord>(
            "SELECT id, owner_id, stored_filename, created_at, expires_at \
             FROM images WHERE stored_filename = $1",
        )
        .bind(filename)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<ImageRecord>, AppError> {
        sqlx::query_as::<_, ImageRecord>(
            "SELECT id, owner_id, stored_filename, created_at, expires_at \
             FROM images WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)
    }
}
