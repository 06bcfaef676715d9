use std::io::Cursor;
use std::path::PathBuf;

use chrono::{Duration, Utc};
use image::{DynamicImage, ImageFormat, RgbImage};
use mockall::mock;
use uuid::Uuid;

use imgocean::entities::image::{ImageInsert, ImageRecord};
use imgocean::entities::tier::{AccountTier, ThumbnailSize};
use imgocean::entities::user::User;
use imgocean::errors::AppError;
use imgocean::formats::ImageKind;
use imgocean::storage::{FsImageStore, ImageStore};
use imgocean::use_cases::images::ImageService;

mock! {
    pub ImageRepo {}

    #[async_trait::async_trait]
    impl imgocean::repositories::image::ImageRepository for ImageRepo {
        async fn insert_image(&self, image: &ImageInsert) -> Result<Uuid, AppError>;
        async fn find_by_stored_filename(&self, filename: &str) -> Result<Option<ImageRecord>, AppError>;
        async fn list_by_owner(&self, owner_id: &Uuid) -> Result<Vec<ImageRecord>, AppError>;
    }
}

mock! {
    pub TierRepo {}

    #[async_trait::async_trait]
    impl imgocean::repositories::tier::TierRepository for TierRepo {
        async fn get_tier(&self, id: &Uuid) -> Result<Option<AccountTier>, AppError>;
        async fn sizes_for_tier(&self, tier_id: &Uuid) -> Result<Vec<ThumbnailSize>, AppError>;
        async fn size_exists_for_user(&self, user_id: &Uuid, height: i32) -> Result<bool, AppError>;
    }
}

const EXPIRY_BOUNDS: (i64, i64) = (300, 30000);

fn temp_storage_root() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("imgocean-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn test_user() -> User {
    User {
        id: Uuid::new_v4(),
        username: "michael".to_string(),
        password_hash: String::new(),
        account_tier_id: Uuid::new_v4(),
        is_active: true,
        is_admin: false,
        created_at: Utc::now(),
    }
}

fn tier(can_generate_expiring_links: bool) -> AccountTier {
    AccountTier {
        id: Uuid::new_v4(),
        name: "Basic".to_string(),
        description: String::new(),
        can_generate_expiring_links,
    }
}

fn thumbnail_size(height: i32) -> ThumbnailSize {
    ThumbnailSize {
        id: Uuid::new_v4(),
        account_tier_id: Uuid::new_v4(),
        height,
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn record_for(owner: &User, filename: &str, expires_at: Option<chrono::DateTime<Utc>>) -> ImageRecord {
    ImageRecord {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        stored_filename: filename.to_string(),
        created_at: Utc::now(),
        expires_at,
    }
}

fn service(
    image_repo: MockImageRepo,
    tier_repo: MockTierRepo,
    root: impl Into<PathBuf>,
) -> ImageService<MockImageRepo, MockTierRepo, FsImageStore> {
    ImageService::new(image_repo, tier_repo, FsImageStore::new(root.into()), EXPIRY_BOUNDS)
}

// === Upload pipeline ===

#[tokio::test]
async fn upload_without_expiry_persists_record_and_bytes() {
    let root = temp_storage_root();
    let user = test_user();
    let bytes = png_bytes(10, 10);

    let mut image_repo = MockImageRepo::new();
    image_repo
        .expect_insert_image()
        .withf(|insert: &ImageInsert| insert.expires_at.is_none())
        .returning(|_| Ok(Uuid::new_v4()));

    let svc = service(image_repo, MockTierRepo::new(), root.clone());
    let record = svc
        .upload(bytes.clone(), Some("image/png"), None, &user)
        .await
        .unwrap();

    assert!(record.stored_filename.ends_with(".png"));
    assert_eq!(record.owner_id, user.id);
    assert!(record.expires_at.is_none());

    // Bytes landed under the server-generated name.
    let stored = FsImageStore::new(root).load(&record.stored_filename).await.unwrap();
    assert_eq!(stored, bytes);
}

#[tokio::test]
async fn upload_rejects_empty_file() {
    let svc = service(MockImageRepo::new(), MockTierRepo::new(), temp_storage_root());

    let result = svc.upload(Vec::new(), Some("image/png"), None, &test_user()).await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn upload_rejects_gif_and_unknown_content_types() {
    let svc = service(MockImageRepo::new(), MockTierRepo::new(), temp_storage_root());
    let user = test_user();
    let bytes = png_bytes(10, 10);

    for content_type in [Some("image/gif"), Some("application/pdf"), None] {
        let result = svc.upload(bytes.clone(), content_type, None, &user).await;
        assert!(
            matches!(result, Err(AppError::ValidationError(_))),
            "content type {:?} should be rejected",
            content_type
        );
    }
}

#[tokio::test]
async fn upload_rejects_payload_that_mismatches_declared_type() {
    let svc = service(MockImageRepo::new(), MockTierRepo::new(), temp_storage_root());

    // PNG bytes declared as JPEG
    let result = svc
        .upload(png_bytes(10, 10), Some("image/jpeg"), None, &test_user())
        .await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn upload_expiry_out_of_range_is_rejected() {
    let svc = service(MockImageRepo::new(), MockTierRepo::new(), temp_storage_root());
    let user = test_user();

    for secs in [0, 299, 30001] {
        let result = svc
            .upload(png_bytes(10, 10), Some("image/png"), Some(secs), &user)
            .await;
        assert!(
            matches!(result, Err(AppError::ValidationError(_))),
            "expiry {} should be out of range",
            secs
        );
    }
}

#[tokio::test]
async fn upload_expiry_without_entitlement_is_permission_denied() {
    let user = test_user();

    let mut tier_repo = MockTierRepo::new();
    tier_repo
        .expect_get_tier()
        .returning(|_| Ok(Some(tier(false))));

    let svc = service(MockImageRepo::new(), tier_repo, temp_storage_root());
    let result = svc
        .upload(png_bytes(10, 10), Some("image/png"), Some(300), &user)
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn upload_expiry_with_entitlement_sets_expires_at() {
    let user = test_user();

    let mut tier_repo = MockTierRepo::new();
    tier_repo
        .expect_get_tier()
        .returning(|_| Ok(Some(tier(true))));

    let mut image_repo = MockImageRepo::new();
    image_repo
        .expect_insert_image()
        .returning(|_| Ok(Uuid::new_v4()));

    let svc = service(image_repo, tier_repo, temp_storage_root());
    let before = Utc::now();
    let record = svc
        .upload(png_bytes(10, 10), Some("image/png"), Some(300), &user)
        .await
        .unwrap();

    let expires_at = record.expires_at.expect("expiry should be set");
    assert!(expires_at >= before + Duration::seconds(300));
    assert!(expires_at <= Utc::now() + Duration::seconds(300));
}

#[tokio::test]
async fn upload_write_failure_is_surfaced_and_nothing_is_inserted() {
    // No insert_image expectation: a repo call would fail the test.
    let svc = service(
        MockImageRepo::new(),
        MockTierRepo::new(),
        "/nonexistent-root/imgocean",
    );

    let result = svc
        .upload(png_bytes(10, 10), Some("image/png"), None, &test_user())
        .await;
    assert!(matches!(result, Err(AppError::StorageWriteFailed(_))));
}

// === Resolution pipeline ===

#[tokio::test]
async fn resolve_unknown_filename_is_not_found() {
    let mut image_repo = MockImageRepo::new();
    image_repo
        .expect_find_by_stored_filename()
        .returning(|_| Ok(None));

    let svc = service(image_repo, MockTierRepo::new(), temp_storage_root());
    let result = svc.resolve("missing.png", None, None).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn resolve_blank_or_non_numeric_size_is_a_validation_error() {
    let svc = service(MockImageRepo::new(), MockTierRepo::new(), temp_storage_root());

    for size in ["", "  ", "abc", "-1"] {
        let result = svc.resolve("a.png", Some(size), None).await;
        assert!(
            matches!(result, Err(AppError::ValidationError(_))),
            "size {:?} should be a validation error",
            size
        );
    }
}

#[tokio::test]
async fn resolve_size_outside_owner_tier_is_not_found() {
    let user = test_user();
    let record = record_for(&user, "a.png", None);

    let mut image_repo = MockImageRepo::new();
    image_repo
        .expect_find_by_stored_filename()
        .returning(move |_| Ok(Some(record.clone())));

    let mut tier_repo = MockTierRepo::new();
    tier_repo
        .expect_size_exists_for_user()
        .returning(|_, _| Ok(false));

    let svc = service(image_repo, tier_repo, temp_storage_root());
    let result = svc.resolve("a.png", Some("400"), None).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn expired_link_is_not_found_anonymously_but_served_to_owner() {
    let root = temp_storage_root();
    let user = test_user();
    let expired = record_for(&user, "a.png", Some(Utc::now() - Duration::seconds(5)));

    let store = FsImageStore::new(root.clone());
    store.save("a.png", &png_bytes(10, 10)).await.unwrap();

    let mut image_repo = MockImageRepo::new();
    let rec = expired.clone();
    image_repo
        .expect_find_by_stored_filename()
        .returning(move |_| Ok(Some(rec.clone())));

    let svc = service(image_repo, MockTierRepo::new(), root);

    let anonymous = svc.resolve("a.png", None, None).await;
    assert!(matches!(anonymous, Err(AppError::NotFound(_))));

    let stranger = svc.resolve("a.png", None, Some(Uuid::new_v4())).await;
    assert!(matches!(stranger, Err(AppError::NotFound(_))));

    let owner = svc.resolve("a.png", None, Some(user.id)).await;
    assert!(owner.is_ok());
}

#[tokio::test]
async fn resolve_at_height_zero_returns_original_dimensions() {
    let root = temp_storage_root();
    let user = test_user();
    let record = record_for(&user, "a.png", None);

    FsImageStore::new(root.clone())
        .save("a.png", &png_bytes(40, 30))
        .await
        .unwrap();

    let mut image_repo = MockImageRepo::new();
    image_repo
        .expect_find_by_stored_filename()
        .returning(move |_| Ok(Some(record.clone())));

    let svc = service(image_repo, MockTierRepo::new(), root);
    let rendered = svc.resolve("a.png", None, None).await.unwrap();

    assert_eq!(rendered.kind, ImageKind::Png);
    let img = image::load_from_memory(&rendered.bytes).unwrap();
    assert_eq!((img.width(), img.height()), (40, 30));
}

#[tokio::test]
async fn resolve_resizes_to_requested_height_with_floored_width() {
    let root = temp_storage_root();
    let user = test_user();
    let record = record_for(&user, "a.png", None);

    FsImageStore::new(root.clone())
        .save("a.png", &png_bytes(100, 60))
        .await
        .unwrap();

    let mut image_repo = MockImageRepo::new();
    image_repo
        .expect_find_by_stored_filename()
        .returning(move |_| Ok(Some(record.clone())));

    let mut tier_repo = MockTierRepo::new();
    tier_repo
        .expect_size_exists_for_user()
        .withf(move |id, height| *id == user.id && *height == 20)
        .returning(|_, _| Ok(true));

    let svc = service(image_repo, tier_repo, root);
    let rendered = svc.resolve("a.png", Some("20"), None).await.unwrap();

    let img = image::load_from_memory(&rendered.bytes).unwrap();
    assert_eq!(img.height(), 20);
    // 100/60 * 20 = 33.33.. -> 33
    assert_eq!(img.width(), 33);
}

#[tokio::test]
async fn upload_then_resolve_round_trips_pixel_dimensions() {
    let root = temp_storage_root();
    let user = test_user();
    let original = png_bytes(37, 23);

    let mut image_repo = MockImageRepo::new();
    image_repo
        .expect_insert_image()
        .returning(|_| Ok(Uuid::new_v4()));

    let svc = service(image_repo, MockTierRepo::new(), root.clone());
    let record = svc
        .upload(original, Some("image/png"), None, &user)
        .await
        .unwrap();

    let mut image_repo = MockImageRepo::new();
    let rec = record.clone();
    image_repo
        .expect_find_by_stored_filename()
        .returning(move |_| Ok(Some(rec.clone())));

    let svc = service(image_repo, MockTierRepo::new(), root);
    let rendered = svc.resolve(&record.stored_filename, None, None).await.unwrap();

    let img = image::load_from_memory(&rendered.bytes).unwrap();
    assert_eq!((img.width(), img.height()), (37, 23));
}

// === Link enumeration ===

#[tokio::test]
async fn links_follow_the_naming_convention() {
    let user = test_user();
    let record = record_for(&user, "abc.png", None);

    let mut image_repo = MockImageRepo::new();
    let rec = record.clone();
    image_repo
        .expect_list_by_owner()
        .returning(move |_| Ok(vec![rec.clone()]));

    let mut tier_repo = MockTierRepo::new();
    tier_repo
        .expect_sizes_for_tier()
        .returning(|_| Ok(vec![thumbnail_size(0), thumbnail_size(200)]));

    let svc = service(image_repo, tier_repo, temp_storage_root());
    let links = svc.links_for(&user).await.unwrap();

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].id, record.id);
    assert_eq!(links[0].links["original"], "/api/v1/images/abc.png");
    assert_eq!(links[0].links["th_200_px"], "/api/v1/images/abc.png?size=200");
}
