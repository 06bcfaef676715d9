use serde::Serialize;
use uuid::Uuid;

/// A named plan controlling which thumbnail heights a user's images are
/// exposed at and whether expiring links may be created. Seeded once by
/// migration and read-only afterwards.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AccountTier {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub can_generate_expiring_links: bool,
}

/// A registered target height (pixels) for a given tier. Height 0 denotes
/// the unresized original.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ThumbnailSize {
    pub id: Uuid,
    pub account_tier_id: Uuid,
    pub height: i32,
}
