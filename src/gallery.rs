use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Photo,
    Video,
}

impl EntryKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(EntryKind::Photo),
            "video" => Some(EntryKind::Video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub title: String,
    pub description: String,
    pub tags: String,
    pub file_url: String,
    pub timestamp: String,
}

/// Append-only record store for published artifacts, persisted as one JSON
/// array. Appends are read-modify-write under a single writer lock so
/// concurrent publishes cannot lose entries.
pub struct GalleryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl GalleryStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Entries of the given kind, newest first. An unreadable or corrupt
    /// store degrades to an empty listing rather than failing the page.
    pub async fn list(&self, kind: EntryKind) -> Vec<GalleryEntry> {
        let mut entries: Vec<GalleryEntry> = match self.read_all().await {
            Ok(all) => all,
            Err(e) => {
                log::warn!("gallery store unreadable, listing empty: {}", e);
                Vec::new()
            }
        };
        entries.retain(|e| e.kind == kind);
        entries.reverse();
        entries
    }

    /// Appends one entry. Unlike `list`, a corrupt store is an error here:
    /// overwriting it would silently discard every published artifact.
    pub async fn append(&self, entry: GalleryEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.push(entry);
        let content = serde_json::to_vec_pretty(&entries)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write gallery store {:?}", self.path))?;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<GalleryEntry>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read gallery store {:?}", self.path))?;
        let entries = serde_json::from_slice(&content)
            .with_context(|| format!("Gallery store {:?} is not a JSON array", self.path))?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, kind: EntryKind) -> GalleryEntry {
        GalleryEntry {
            id: id.to_string(),
            kind,
            title: format!("title-{}", id),
            description: "a description".to_string(),
            tags: "cat,mat".to_string(),
            file_url: format!("/static/images/{}.png", id),
            timestamp: "2026-08-05 12:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_then_list_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::open(dir.path().join("gallery.json"));

        let published = entry("a1b2c3d4", EntryKind::Photo);
        store.append(published.clone()).await.unwrap();

        let listed = store.list(EntryKind::Photo).await;
        assert_eq!(listed, vec![published]);
    }

    #[tokio::test]
    async fn test_list_filters_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::open(dir.path().join("gallery.json"));

        store.append(entry("p1", EntryKind::Photo)).await.unwrap();
        store.append(entry("v1", EntryKind::Video)).await.unwrap();
        store.append(entry("p2", EntryKind::Photo)).await.unwrap();

        let photos = store.list(EntryKind::Photo).await;
        assert!(photos.iter().all(|e| e.kind == EntryKind::Photo));
        assert_eq!(photos.len(), 2);

        let videos = store.list(EntryKind::Video).await;
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, "v1");
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = GalleryStore::open(dir.path().join("gallery.json"));

        store.append(entry("old", EntryKind::Video)).await.unwrap();
        store.append(entry("mid", EntryKind::Video)).await.unwrap();
        store.append(entry("new", EntryKind::Video)).await.unwrap();

        let ids: Vec<_> = store
            .list(EntryKind::Video)
            .await
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_corrupt_store_lists_empty_but_refuses_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = GalleryStore::open(&path);

        assert!(store.list(EntryKind::Photo).await.is_empty());
        assert!(store.append(entry("x", EntryKind::Photo)).await.is_err());
        // The corrupt file must survive the failed append.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(GalleryStore::open(dir.path().join("gallery.json")));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(entry(&format!("e{}", i), EntryKind::Photo)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list(EntryKind::Photo).await.len(), 8);
    }

    #[test]
    fn test_entry_kind_parse() {
        assert_eq!(EntryKind::parse("photo"), Some(EntryKind::Photo));
        assert_eq!(EntryKind::parse("video"), Some(EntryKind::Video));
        assert_eq!(EntryKind::parse("gif"), None);
    }
}
