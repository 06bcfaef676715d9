use std::collections::BTreeMap;

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted image. `stored_filename` is the server-generated opaque name
/// the bytes live under; it never derives from the client-supplied filename.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub stored_filename: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ImageRecord {
    /// An image with no expiry is always reachable; an expired one only by
    /// its owner.
    pub fn is_reachable_by(&self, requester: Option<Uuid>, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) if expires_at >= now => true,
            Some(_) => requester == Some(self.owner_id),
        }
    }
}

#[derive(Debug)]
pub struct ImageInsert {
    pub owner_id: Uuid,
    pub stored_filename: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Multipart body of `POST /images`: the file part plus an optional expiry
/// offset in seconds.
#[derive(Debug, MultipartForm)]
pub struct ImageUploadForm {
    #[multipart(rename = "img", limit = "10MB")]
    pub img: TempFile,

    #[multipart(rename = "exp_after")]
    pub exp_after: Option<Text<i64>>,
}

/// Query string of `GET /images/{filename}`. The raw string is kept so a
/// present-but-blank or non-numeric `size` can be told apart from an
/// omitted one.
#[derive(Debug, Deserialize)]
pub struct SizeQuery {
    pub size: Option<String>,
}

/// One uploaded image with a link per thumbnail size of the owner's tier,
/// keyed `original` for height 0 and `th_{height}_px` otherwise.
#[derive(Debug, Serialize)]
pub struct ImageLinks {
    pub id: Uuid,
    pub links: BTreeMap<String, String>,
}
