use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// A tiny document store in one pretty-printed JSON file, laid out as
/// `{collection: {doc_id: {fields...}}}`.
///
/// Every write re-reads the file first so separate handles on the same path
/// do not clobber each other's documents.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    path: PathBuf,
}

impl DocumentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, collection: &str, doc_id: &str) -> Option<Map<String, Value>> {
        read_json_object(&self.path)?
            .get(collection)
            .and_then(Value::as_object)
            .and_then(|docs| docs.get(doc_id))
            .and_then(Value::as_object)
            .cloned()
    }

    /// Replaces the document's fields (set semantics, not merge).
    pub fn set(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Map<String, Value>,
    ) -> anyhow::Result<()> {
        let mut on_disk = read_json_object(&self.path).unwrap_or_default();
        let docs = on_disk
            .entry(collection.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !docs.is_object() {
            *docs = Value::Object(Map::new());
        }
        if let Some(docs) = docs.as_object_mut() {
            docs.insert(doc_id.to_string(), Value::Object(fields));
        }
        write_json_object(&self.path, &on_disk)
    }
}

fn read_json_object(path: &Path) -> Option<Map<String, Value>> {
    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    parsed.as_object().cloned()
}

fn write_json_object(path: &Path, payload: &Map<String, Value>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(
        path,
        serde_json::to_string_pretty(&Value::Object(payload.clone()))?,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::DocumentFile;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn set_then_get() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = DocumentFile::new(temp.path().join("store.json"));
        store.set("users", "u1", obj(json!({"email": "a@example.com"})))?;
        assert_eq!(
            store.get("users", "u1"),
            Some(obj(json!({"email": "a@example.com"})))
        );
        assert_eq!(store.get("users", "u2"), None);
        assert_eq!(store.get("teams", "u1"), None);
        Ok(())
    }

    #[test]
    fn set_replaces_existing_document() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let store = DocumentFile::new(temp.path().join("store.json"));
        store.set("users", "u1", obj(json!({"email": "old@example.com", "x": 1})))?;
        store.set("users", "u1", obj(json!({"email": "new@example.com"})))?;
        assert_eq!(
            store.get("users", "u1"),
            Some(obj(json!({"email": "new@example.com"})))
        );
        Ok(())
    }

    #[test]
    fn separate_handles_merge_documents() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("store.json");
        let a = DocumentFile::new(&path);
        let b = DocumentFile::new(&path);

        a.set("users", "u1", obj(json!({"n": 1})))?;
        b.set("users", "u2", obj(json!({"n": 2})))?;

        let reloaded = DocumentFile::new(path);
        assert_eq!(reloaded.get("users", "u1"), Some(obj(json!({"n": 1}))));
        assert_eq!(reloaded.get("users", "u2"), Some(obj(json!({"n": 2}))));
        Ok(())
    }
}
