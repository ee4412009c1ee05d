//! Image attachment value types.
//!
//! Image references are stored as resolved public URLs. The helpers here
//! build collision-resistant storage keys for new uploads and map a stored
//! reference back to its storage key when the blob has to be removed.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;

const DEFAULT_EXTENSION: &str = "bin";

/// A binary image supplied by the user for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    /// Original file name, used only for its extension.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lower-cased extension of the file name, `bin` when there is none.
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
    }

    /// MIME type guessed from the extension.
    pub fn content_type(&self) -> String {
        mime_guess::from_ext(&self.extension())
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    /// Builds a storage key of the form `{prefix}-{unix_millis}-{nonce}.{ext}`.
    ///
    /// The millisecond timestamp keeps keys roughly chronological; the
    /// random suffix keeps two uploads in the same millisecond apart.
    pub fn storage_key(&self, prefix: &str, now: DateTime<Utc>) -> String {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "{}-{}-{}.{}",
            prefix,
            now.timestamp_millis(),
            &nonce[..8],
            self.extension()
        )
    }
}

/// Image supplied when creating an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An already resolved public reference, stored as is.
    Reference(String),
    /// A file that must be uploaded before the row is inserted.
    Upload(ImageFile),
}

/// What an edit does to the entity's image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageChange {
    #[default]
    Keep,
    /// Clear the reference and delete the stored blob.
    Remove,
    /// Upload a new file, point the row at it and delete the old blob.
    Replace(ImageFile),
}

impl ImageChange {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Maps a stored image reference back to its storage key.
///
/// `public_prefix` is the bucket's public URL prefix (ending in `/`).
/// Bare keys are returned unchanged. URLs outside the bucket yield `None`
/// since there is nothing this client can delete for them.
pub fn storage_key_from_reference(public_prefix: &str, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    if let Some(rest) = reference.strip_prefix(public_prefix) {
        let key = rest.split(['?', '#']).next().unwrap_or_default();
        return (!key.is_empty()).then(|| key.to_string());
    }

    if reference.contains("://") {
        None
    } else {
        Some(reference.to_string())
    }
}
