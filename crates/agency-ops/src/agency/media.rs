//! Image hosting for agent portraits and product galleries.
//!
//! Clients send either an existing `http(s)` URL, a `data:image/...;base64,` URL,
//! or a bare base64 payload. URLs pass through untouched; payloads are decoded,
//! checked to be images, and stored under a generated key.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

use base64::Engine as _;
use mime::Mime;
use tracing::warn;
use uuid::Uuid;

pub trait MediaStore: Debug + Send + Sync {
    /// Host `payload` and return its public URL. URLs are returned as-is.
    fn upload(&self, payload: &str) -> Result<String, MediaError>;

    fn fetch(&self, key: &str) -> Result<Option<StoredMedia>, MediaError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("image payload is empty")]
    Empty,
    #[error("data URL must look like data:<type>;base64,<payload>")]
    MalformedDataUrl,
    #[error("invalid media type '{0}'")]
    InvalidType(String),
    #[error("payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("unable to recognise image format")]
    UnknownFormat,
    #[error("unsupported media type '{0}', expected image/*")]
    UnsupportedType(Mime),
    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("media store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredMedia {
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

/// Process-local media store. Objects live as long as the store does.
#[derive(Debug)]
pub struct InMemoryMediaStore {
    base_url: String,
    max_bytes: usize,
    objects: Mutex<HashMap<String, StoredMedia>>,
}

impl InMemoryMediaStore {
    pub fn new(base_url: impl Into<String>, max_bytes: usize) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            max_bytes,
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn decode(&self, payload: &str) -> Result<StoredMedia, MediaError> {
        let (declared, encoded) = match payload.strip_prefix("data:") {
            Some(rest) => {
                let (meta, data) = rest.split_once(',').ok_or(MediaError::MalformedDataUrl)?;
                let declared = meta
                    .strip_suffix(";base64")
                    .ok_or(MediaError::MalformedDataUrl)?;
                let mime = declared
                    .parse::<Mime>()
                    .map_err(|_| MediaError::InvalidType(declared.to_string()))?;
                (Some(mime), data)
            }
            None => (None, payload),
        };

        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        if bytes.len() > self.max_bytes {
            return Err(MediaError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let content_type = match declared {
            Some(mime) => mime,
            None => sniff_image(&bytes).ok_or(MediaError::UnknownFormat)?,
        };
        if content_type.type_() != mime::IMAGE {
            return Err(MediaError::UnsupportedType(content_type));
        }

        Ok(StoredMedia {
            content_type,
            bytes,
        })
    }
}

impl MediaStore for InMemoryMediaStore {
    fn upload(&self, payload: &str) -> Result<String, MediaError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(MediaError::Empty);
        }
        if payload.starts_with("http://") || payload.starts_with("https://") {
            return Ok(payload.to_string());
        }

        let media = self.decode(payload)?;
        let extension = mime_guess::get_mime_extensions(&media.content_type)
            .and_then(|extensions| extensions.first())
            .copied()
            .unwrap_or("img");
        let key = format!("{}.{extension}", Uuid::new_v4().simple());

        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), media);

        Ok(format!("{}/{key}", self.base_url))
    }

    fn fetch(&self, key: &str) -> Result<Option<StoredMedia>, MediaError> {
        Ok(self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }
}

fn sniff_image(bytes: &[u8]) -> Option<Mime> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(mime::IMAGE_PNG)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(mime::IMAGE_JPEG)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(mime::IMAGE_GIF)
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp".parse().ok()
    } else {
        None
    }
}

/// Upload one optional image; a failed upload is logged and yields `None`.
pub fn upload_image(store: &dyn MediaStore, payload: Option<&str>) -> Option<String> {
    let payload = payload?;
    match store.upload(payload) {
        Ok(url) => Some(url),
        Err(err) => {
            warn!(error = %err, "image upload failed; storing null");
            None
        }
    }
}

/// Upload a gallery, keeping one entry per input in order.
pub fn upload_images(store: &dyn MediaStore, payloads: &[String]) -> Vec<Option<String>> {
    payloads
        .iter()
        .map(|payload| upload_image(store, Some(payload)))
        .collect()
}
