//! File filtering and SHA-1 decoding for leaf items
//!
//! Items carry files the archive generates about them (a thumbnail, torrent
//! descriptors, metadata dumps). Those are skipped so only original content is
//! hashed.

use thiserror::Error;

/// A raw 20-byte SHA-1 digest
pub type ContentHash = [u8; 20];

/// Thumbnail the archive adds to every item
pub const THUMBNAIL_NAME: &str = "__ia_thumb.jpg";

/// Suffixes appended to the item name for archive-generated files
const DERIVED_SUFFIXES: [&str; 5] = [
    "_archive.torrent",
    "_files.xml",
    "_meta.sqlite",
    "_meta.xml",
    "_reviews.xml",
];

/// Why a hash string could not be turned into a digest
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("hash '{0}' would not be 20 bytes")]
    Length(String),

    #[error("{source} in '{hash}'")]
    Hex {
        hash: String,
        source: hex::FromHexError,
    },
}

/// Returns true for files the archive generated rather than the uploader
///
/// # Arguments
///
/// * `item` - The item name
/// * `file_name` - Name of a file belonging to that item
pub fn is_generated_artifact(item: &str, file_name: &str) -> bool {
    if file_name == THUMBNAIL_NAME {
        return true;
    }

    file_name
        .strip_prefix(item)
        .map(|suffix| DERIVED_SUFFIXES.contains(&suffix))
        .unwrap_or(false)
}

/// Decodes a hex-encoded SHA-1 into its raw bytes
///
/// The length is checked before decoding so a short or long hash is reported
/// as such rather than as a hex error.
pub fn decode_sha1(hash: &str) -> Result<ContentHash, DigestError> {
    if hash.len() != 40 {
        return Err(DigestError::Length(hash.to_string()));
    }

    let mut digest = [0u8; 20];
    hex::decode_to_slice(hash, &mut digest).map_err(|source| DigestError::Hex {
        hash: hash.to_string(),
        source,
    })?;

    Ok(digest)
}
