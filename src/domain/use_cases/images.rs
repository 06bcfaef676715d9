use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::entities::image::{ImageInsert, ImageLinks, ImageRecord};
use crate::entities::tier::ThumbnailSize;
use crate::entities::user::User;
use crate::errors::AppError;
use crate::formats::ImageKind;
use crate::media::{self, RenderedImage};
use crate::repositories::image::ImageRepository;
use crate::repositories::tier::TierRepository;
use crate::storage::ImageStore;

/// Public base path image links are rooted at.
pub const PUBLIC_IMAGE_PATH: &str = "/api/v1/images";

/// Upload and resolution pipelines plus link enumeration, generic over the
/// persistence and storage backends.
pub struct ImageService<R, T, S>
where
    R: ImageRepository,
    T: TierRepository,
    S: ImageStore,
{
    pub image_repo: R,
    pub tier_repo: T,
    pub store: S,
    expiry_bounds: (i64, i64),
}

impl<R, T, S> ImageService<R, T, S>
where
    R: ImageRepository,
    T: TierRepository,
    S: ImageStore,
{
    pub fn new(image_repo: R, tier_repo: T, store: S, expiry_bounds: (i64, i64)) -> Self {
        ImageService {
            image_repo,
            tier_repo,
            store,
            expiry_bounds,
        }
    }

    /// Upload pipeline. All validation happens before the file write, and
    /// the file write happens before the insert, so a failure leaves no
    /// partial state behind.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        declared_content_type: Option<&str>,
        exp_after: Option<i64>,
        owner: &User,
    ) -> Result<ImageRecord, AppError> {
        if bytes.is_empty() {
            return Err(AppError::field("img", "The submitted file is empty"));
        }

        let kind = declared_content_type
            .and_then(ImageKind::from_content_type)
            .ok_or_else(|| AppError::field("img", "Unsupported image format, expected jpeg or png"))?;

        if !kind.matches_bytes(&bytes) {
            return Err(AppError::field(
                "img",
                "File content does not match the declared content type",
            ));
        }

        if let Some(secs) = exp_after {
            let (min, max) = self.expiry_bounds;
            if secs < min || secs > max {
                return Err(AppError::field(
                    "exp_after",
                    format!("Expiry must be between {} and {} seconds", min, max),
                ));
            }

            let tier = self
                .tier_repo
                .get_tier(&owner.account_tier_id)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError(format!("Missing account tier for user {}", owner.id))
                })?;

            if !tier.can_generate_expiring_links {
                return Err(AppError::PermissionDenied(
                    "You don't have permissions to create expiring links".to_string(),
                ));
            }
        }

        // Opaque server-generated name; the client-supplied filename is
        // never used.
        let stored_filename = format!("{}.{}", Uuid::new_v4().simple(), kind.extension());

        self.store.save(&stored_filename, &bytes).await?;

        let now = Utc::now();
        let insert = ImageInsert {
            owner_id: owner.id,
            stored_filename,
            created_at: now,
            expires_at: exp_after.map(|secs| now + Duration::seconds(secs)),
        };

        let id = self.image_repo.insert_image(&insert).await?;

        tracing::info!(owner = %owner.username, filename = %insert.stored_filename, "Image uploaded");
        Ok(ImageRecord {
            id,
            owner_id: insert.owner_id,
            stored_filename: insert.stored_filename,
            created_at: insert.created_at,
            expires_at: insert.expires_at,
        })
    }

    /// Resolution pipeline: lookup, size authorization against the owner's
    /// tier, expiry gate, then decode/resize. Unknown sizes and expired
    /// links are reported exactly like missing images.
    pub async fn resolve(
        &self,
        filename: &str,
        size: Option<&str>,
        requester: Option<Uuid>,
    ) -> Result<RenderedImage, AppError> {
        let height = parse_requested_height(size)?;

        let record = self
            .image_repo
            .find_by_stored_filename(filename)
            .await?
            .ok_or_else(not_found)?;

        if height != 0
            && !self
                .tier_repo
                .size_exists_for_user(&record.owner_id, height as i32)
                .await?
        {
            return Err(not_found());
        }

        if !record.is_reachable_by(requester, Utc::now()) {
            return Err(not_found());
        }

        let bytes = self.store.load(filename).await?;
        media::render(&bytes, height)
    }

    /// Link map for a single freshly uploaded image, against the owner's
    /// tier sizes.
    pub async fn links_for_image(
        &self,
        image: &ImageRecord,
        tier_id: &Uuid,
    ) -> Result<ImageLinks, AppError> {
        let sizes = self.tier_repo.sizes_for_tier(tier_id).await?;
        Ok(ImageLinks {
            id: image.id,
            links: link_map(&image.stored_filename, &sizes),
        })
    }

    /// Link enumeration: every image of the user crossed with every
    /// thumbnail size of the user's own tier.
    pub async fn links_for(&self, user: &User) -> Result<Vec<ImageLinks>, AppError> {
        let sizes = self.tier_repo.sizes_for_tier(&user.account_tier_id).await?;
        let images = self.image_repo.list_by_owner(&user.id).await?;

        Ok(images
            .iter()
            .map(|image| ImageLinks {
                id: image.id,
                links: link_map(&image.stored_filename, &sizes),
            })
            .collect())
    }
}

/// `size` omitted means the original; present but blank or non-numeric is a
/// caller error rather than a lookup miss.
pub fn parse_requested_height(size: Option<&str>) -> Result<u32, AppError> {
    match size {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| AppError::field("size", "Size must be a non-negative integer")),
    }
}

pub fn link_map(filename: &str, sizes: &[ThumbnailSize]) -> BTreeMap<String, String> {
    sizes
        .iter()
        .map(|size| {
            if size.height == 0 {
                (
                    "original".to_string(),
                    format!("{}/{}", PUBLIC_IMAGE_PATH, filename),
                )
            } else {
                (
                    format!("th_{}_px", size.height),
                    format!("{}/{}?size={}", PUBLIC_IMAGE_PATH, filename, size.height),
                )
            }
        })
        .collect()
}

fn not_found() -> AppError {
    // Expired links and tier-foreign sizes are indistinguishable from a
    // missing image on purpose.
    AppError::NotFound("Image doesn't exist".to_string())
}
