//! Remote collaborators: the network side of a list.
//!
//! [`RestClient`] talks to the dashboard API. [`InMemoryRemote`] keeps
//! records in process, for tests and for embedding the list machinery
//! without a server.

pub mod error;
pub mod memory;
pub mod rest;

use std::future::Future;
use std::path::Path;

use serde_json::Value;

use crate::entity::{Entity, MediaCollection, MediaPost};
use crate::error::{AdminError, Result};

pub use error::ApiError;
pub use memory::{InMemoryRemote, InjectedFailure};
pub use rest::{Profile, RestClient};

/// Operations a list controller delegates to the backend.
///
/// Failures are already classified: `list` fails with
/// [`AdminError::Fetch`], mutations with [`AdminError::Mutation`],
/// plus [`AdminError::Auth`] and [`AdminError::NotFound`] for either.
pub trait RemoteCollaborator<E: Entity>: Send + Sync {
    /// Fetch the whole collection
    fn list(&self) -> impl Future<Output = Result<Vec<E>>> + Send;

    /// Create a record from a request body, returning it with its assigned id
    fn create(&self, payload: &Value) -> impl Future<Output = Result<E>> + Send;

    fn update(&self, id: &E::Id, patch: &Value) -> impl Future<Output = Result<E>> + Send;

    fn delete(&self, id: &E::Id) -> impl Future<Output = Result<()>> + Send;

    /// Flip the record's status flag server side
    fn toggle_status(&self, id: &E::Id) -> impl Future<Output = Result<E>> + Send;
}

/// A file to add to the media library.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub collection: MediaCollection,
    pub title: Option<String>,
}

impl MediaUpload {
    /// Read a file from disk. The collection is inferred from the extension
    /// when not given.
    pub async fn from_path(
        path: &Path,
        collection: Option<MediaCollection>,
        title: Option<String>,
    ) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AdminError::InvalidInput(format!("not a file: {}", path.display())))?
            .to_string();

        let collection = match collection {
            Some(c) => c,
            None => MediaCollection::from_path(&file_name).ok_or_else(|| {
                AdminError::InvalidInput(format!(
                    "cannot tell whether '{file_name}' is a poster or a video; pass --collection"
                ))
            })?,
        };

        let bytes = tokio::fs::read(path).await?;

        Ok(Self {
            file_name,
            bytes,
            collection,
            title: title.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Title sent with the upload, defaulting to the file stem.
    pub fn effective_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            Path::new(&self.file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&self.file_name)
                .to_string()
        })
    }
}

/// Backends that accept media uploads.
pub trait MediaRemote: RemoteCollaborator<MediaPost> {
    /// Upload a file. The server derives thumbnail and duration afterwards,
    /// so the returned record (when the response carries one) is incomplete.
    fn upload(&self, upload: MediaUpload) -> impl Future<Output = Result<Option<MediaPost>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_from_path_infers_collection() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("launch-poster.png");
        std::fs::write(&path, b"png").unwrap();

        let upload = MediaUpload::from_path(&path, None, None).await.unwrap();
        assert_eq!(upload.collection, MediaCollection::Poster);
        assert_eq!(upload.bytes, b"png");
        assert_eq!(upload.effective_title(), "launch-poster");
    }

    #[tokio::test]
    async fn test_upload_unknown_extension_needs_collection() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"x").unwrap();

        let err = MediaUpload::from_path(&path, None, None).await.unwrap_err();
        assert!(err.to_string().contains("--collection"));

        let upload = MediaUpload::from_path(&path, Some(MediaCollection::Video), Some("Clip".into()))
            .await
            .unwrap();
        assert_eq!(upload.effective_title(), "Clip");
    }
}
