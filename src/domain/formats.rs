use image::ImageFormat;

/// The fixed allow-list of stored image formats. Uploads declaring anything
/// else (gif included) are rejected, and files on disk that decode to
/// anything else are refused at serve time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Maps a declared content type (as sent in the multipart part header)
    /// to a kind. Parameters after `;` are ignored.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/jpeg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            _ => None,
        }
    }

    /// File extension used for the server-generated stored filename.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
        }
    }

    /// MIME type for the response `Content-Type` header.
    pub fn mime(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            ImageFormat::Png => Some(ImageKind::Png),
            _ => None,
        }
    }

    /// Checks the magic bytes of an upload against its declared content
    /// type, so a renamed GIF cannot sneak through as `image/png`.
    pub fn matches_bytes(&self, bytes: &[u8]) -> bool {
        match infer::get(bytes) {
            Some(kind) => kind.mime_type() == self.mime(),
            None => false,
        }
    }
}
