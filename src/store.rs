use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::expiry::now_timestamp;
use crate::model::Snippet;
use crate::slug;

/// Flat-file snippet collection.
///
/// The whole collection is read on every lookup and rewritten on every write.
/// Writers are serialized through `write_lock`; readers never block because
/// `save` replaces the file with a rename.
pub struct Store {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Store {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored records in file order, exactly as they were written.
    async fn load_records(&self) -> Result<Vec<JsonValue>, StoreError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let value: JsonValue = serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        match value {
            JsonValue::Array(records) => Ok(records),
            _ => {
                tracing::warn!(path = ?self.path, "backing file is not a JSON list, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn save_records(&self, records: &[JsonValue]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let body = serde_json::to_vec_pretty(records).map_err(StoreError::Encode)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, &body).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Readable snippets in insertion order. Records without a usable id stay in
    /// the file but are left out here.
    pub async fn load(&self) -> Result<Vec<Snippet>, StoreError> {
        let records = self.load_records().await?;
        Ok(records
            .iter()
            .enumerate()
            .filter_map(|(pos, record)| {
                let snippet = Snippet::from_record(record);
                if snippet.is_none() {
                    tracing::warn!(path = ?self.path, pos, "skipping record without a usable id");
                }
                snippet
            })
            .collect())
    }

    /// Replaces the whole collection with `snippets`.
    pub async fn save(&self, snippets: &[Snippet]) -> Result<(), StoreError> {
        let records = snippets
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Encode)?;
        self.save_records(&records).await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Snippet>, StoreError> {
        let snippets = self.load().await?;
        Ok(snippets.into_iter().find(|s| s.id == id))
    }

    pub async fn ids(&self) -> Result<HashSet<String>, StoreError> {
        let snippets = self.load().await?;
        Ok(snippets.into_iter().map(|s| s.id).collect())
    }

    pub async fn append(&self, snippet: Snippet) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.append_locked(&snippet).await
    }

    /// Assigns a fresh slug, stamps the current time and persists the snippet.
    pub async fn create(&self, text: String) -> Result<Snippet, StoreError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.ids().await?;

        let snippet = Snippet::new(slug::generate(&existing), text, now_timestamp());
        self.append_locked(&snippet).await?;
        Ok(snippet)
    }

    // Existing records are written back untouched; only the new one is encoded.
    async fn append_locked(&self, snippet: &Snippet) -> Result<(), StoreError> {
        let mut records = self.load_records().await?;
        records.push(serde_json::to_value(snippet).map_err(StoreError::Encode)?);
        self.save_records(&records).await
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> Store {
        Store::new(dir.path().join("data").join("snips.json"))
    }

    #[tokio::test]
    async fn missing_and_empty_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().await.unwrap().is_empty());

        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "").unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_list_json_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snips.json");
        std::fs::write(&path, r#"{"id": "abc"}"#).unwrap();
        assert!(Store::new(path).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snips.json");
        std::fs::write(&path, "not json at all").unwrap();
        let err = Store::new(path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn create_leaves_legacy_records_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snips.json");
        let legacy = "[\n  {\n    \"id\": 1,\n    \"text\": \"legacy\",\n    \"author\": \"bob\"\n  }";
        std::fs::write(&path, format!("{legacy}\n]")).unwrap();

        let store = Store::new(&path);
        store.create("new".into()).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with(&format!("{legacy},\n  {{\n")), "{raw}");
        assert_eq!(store.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn records_without_usable_id_are_skipped_but_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snips.json");
        std::fs::write(&path, r#"[{"text": "orphan"}, {"id": "abcdef", "text": 5}, 3]"#).unwrap();

        let store = Store::new(&path);
        let snippets = store.load().await.unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].text, "5");

        store.create("fresh".into()).await.unwrap();
        let records: Vec<JsonValue> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0], serde_json::json!({"text": "orphan"}));
        assert_eq!(records[2], serde_json::json!(3));
    }

    #[tokio::test]
    async fn save_then_load_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let snippets = vec![
            Snippet::new("zzzzzz".into(), "first".into(), "2025-01-01T00:00:00Z".into()),
            Snippet::new("aaaaaa".into(), "ünïcode ✓".into(), "2025-01-02T00:00:00Z".into()),
            Snippet {
                id: "3".into(),
                text: "legacy".into(),
                created_at: None,
            },
        ];
        store.save(&snippets).await.unwrap();
        assert_eq!(store.load().await.unwrap(), snippets);
    }

    #[tokio::test]
    async fn file_is_pretty_and_unescaped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .append(Snippet::new("abcdef".into(), "ünï".into(), "2025-01-01T00:00:00Z".into()))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"id\": \"abcdef\""));
        assert!(raw.contains("ünï"));
        assert!(!store.tmp_path().exists());
    }

    #[tokio::test]
    async fn find_returns_first_match() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let created = store.create("hello".into()).await.unwrap();

        assert_eq!(store.find(&created.id).await.unwrap(), Some(created));
        assert_eq!(store.find("nope42").await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_creates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir));

        let mut tasks = Vec::new();
        for i in 0..25 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move { store.create(format!("snip {i}")).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let snippets = store.load().await.unwrap();
        assert_eq!(snippets.len(), 25);
        assert_eq!(store.ids().await.unwrap().len(), 25);
    }
}
