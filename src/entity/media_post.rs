use std::borrow::Cow;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Capabilities, Entity, EntityKind, Facet, decode_collection};
use crate::error::Result;
use crate::table::Column;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv", "avi", "m4v"];

/// Media library collection a post belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCollection {
    Poster,
    Video,
}

crate::enum_display_fromstr!(MediaCollection, "collection", {
    Poster => "poster",
    Video => "video",
});

impl MediaCollection {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_lowercase();
        if mime.starts_with("image/") {
            Some(MediaCollection::Poster)
        } else if mime.starts_with("video/") {
            Some(MediaCollection::Video)
        } else {
            None
        }
    }

    /// Guess the collection from a file name or URL.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path.split('?').next().unwrap_or(path))
            .extension()?
            .to_str()?
            .to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaCollection::Poster)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaCollection::Video)
        } else {
            None
        }
    }
}

/// Guess a MIME type from a file name, for multipart uploads.
pub(crate) fn mime_for_path(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollectionTab {
    #[default]
    All,
    Poster,
    Video,
}

crate::enum_display_fromstr!(CollectionTab, "collection tab", {
    All => "all",
    Poster => "poster",
    Video => "video",
});

impl Facet<MediaPost> for CollectionTab {
    fn admits(&self, record: &MediaPost) -> bool {
        match self {
            CollectionTab::All => true,
            CollectionTab::Poster => record.media_collection() == Some(MediaCollection::Poster),
            CollectionTab::Video => record.media_collection() == Some(MediaCollection::Video),
        }
    }
}

/// An uploaded poster image or video. Thumbnail and duration are filled in
/// by the server after upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPost {
    pub id: u64,
    #[serde(default, alias = "title", alias = "file_name")]
    pub name: Option<String>,
    #[serde(default, alias = "original_url")]
    pub url: String,
    #[serde(default, rename = "type", alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default, alias = "collection_name")]
    pub collection: Option<MediaCollection>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl MediaPost {
    /// Stored collection, else inferred from the MIME type or URL.
    pub fn media_collection(&self) -> Option<MediaCollection> {
        self.collection
            .or_else(|| self.mime_type.as_deref().and_then(MediaCollection::from_mime))
            .or_else(|| MediaCollection::from_path(&self.url))
    }
}

impl Entity for MediaPost {
    type Id = u64;
    type Facet = CollectionTab;

    const KIND: EntityKind = EntityKind::MediaPosts;
    const CAPABILITIES: Capabilities = Capabilities {
        delete: true,
        upload: true,
        ..Capabilities::NONE
    };

    fn id(&self) -> &u64 {
        &self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        self.name.as_deref().map(Cow::from).into_iter().collect()
    }

    fn columns() -> Vec<Column<Self>> {
        vec![
            Column::new("ID", |m: &MediaPost| m.id.to_string()).right(),
            Column::new("Name", |m: &MediaPost| {
                m.name.clone().unwrap_or_else(|| "-".to_string())
            }),
            Column::new("Type", |m: &MediaPost| {
                m.mime_type.clone().unwrap_or_else(|| "-".to_string())
            }),
            Column::new("Collection", |m: &MediaPost| {
                m.media_collection()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string())
            }),
            Column::new("Duration", |m: &MediaPost| {
                m.duration
                    .map(|d| format!("{d:.0}s"))
                    .unwrap_or_else(|| "-".to_string())
            })
            .right(),
            Column::new("URL", |m: &MediaPost| m.url.clone()),
        ]
    }

    /// The media endpoint groups posts by collection:
    /// `{"poster": [...], "video": [...]}`.
    fn decode_list(body: Value) -> Result<Vec<Self>> {
        let grouped = body
            .as_object()
            .is_some_and(|map| map.contains_key("poster") || map.contains_key("video"));
        if !grouped {
            return decode_collection(body);
        }

        let mut posts = Vec::new();
        for collection in [MediaCollection::Poster, MediaCollection::Video] {
            let Some(items) = body.get(collection.to_string()) else {
                continue;
            };
            if items.is_null() {
                continue;
            }
            let group: Vec<MediaPost> = serde_json::from_value(items.clone())?;
            posts.extend(group.into_iter().map(|mut post| {
                post.collection.get_or_insert(collection);
                post
            }));
        }
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_grouped_collections() {
        let posts = MediaPost::decode_list(json!({
            "poster": [{"id": 1, "name": "Launch", "url": "https://cdn/x/launch.png", "type": "image/png"}],
            "video": [{"id": 2, "name": "Promo", "url": "https://cdn/x/promo.mp4", "duration": 12.0}]
        }))
        .unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].collection, Some(MediaCollection::Poster));
        assert_eq!(posts[1].collection, Some(MediaCollection::Video));
    }

    #[test]
    fn test_decode_missing_group() {
        let posts = MediaPost::decode_list(json!({"poster": [{"id": 1, "url": "a.png"}]})).unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[test]
    fn test_collection_inference() {
        assert_eq!(MediaCollection::from_mime("image/jpeg"), Some(MediaCollection::Poster));
        assert_eq!(MediaCollection::from_path("clip.MOV"), Some(MediaCollection::Video));
        assert_eq!(
            MediaCollection::from_path("https://cdn/a.webp?v=2"),
            Some(MediaCollection::Poster)
        );
        assert_eq!(MediaCollection::from_path("notes.txt"), None);
    }

    #[test]
    fn test_tab_uses_inferred_collection() {
        let post: MediaPost =
            serde_json::from_value(json!({"id": 3, "url": "https://cdn/promo.mp4"})).unwrap();
        assert!(CollectionTab::Video.admits(&post));
        assert!(!CollectionTab::Poster.admits(&post));
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path("poster.JPG"), "image/jpeg");
        assert_eq!(mime_for_path("archive.zip"), "application/octet-stream");
    }
}
