//! JSON-file material store.
//!
//! All materials live in memory behind a `RwLock`; when a path is configured, every write
//! rewrites the whole database to a temporary file and renames it over the previous copy.
//! Other processes (the admin CLI) may rewrite the same file, so every operation first checks
//! the file's fingerprint and reloads when it no longer matches the last read or write.

use super::{Material, MaterialStore, NewMaterial, StoreError, current_timestamp_rfc3339};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::RwLock;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    next_id: u64,
    materials: BTreeMap<u64, Material>,
    /// File state this copy was last read from or written to.
    #[serde(skip)]
    synced: Option<Fingerprint>,
}

impl Database {
    fn allocate_id(&mut self) -> u64 {
        let floor = self.materials.keys().next_back().copied().unwrap_or(0);
        let id = self.next_id.max(floor) + 1;
        self.next_id = id;
        id
    }
}

/// Modification time and size of the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

async fn fingerprint(path: &Path) -> Option<Fingerprint> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    Some(Fingerprint {
        modified: metadata.modified().ok(),
        len: metadata.len(),
    })
}

/// Read the database at `path`; `None` when the file does not exist yet.
async fn read_database(path: &Path) -> Result<Option<Database>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: path.display().to_string(),
                source,
            }),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Material store persisted as a single JSON document.
pub struct JsonMaterialStore {
    path: Option<PathBuf>,
    db: RwLock<Database>,
}

impl JsonMaterialStore {
    /// Store that keeps materials in memory only.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            db: RwLock::new(Database::default()),
        }
    }

    /// Open (or start) the database at `path`, loading any existing materials.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut db = read_database(&path).await?.unwrap_or_default();
        db.synced = fingerprint(&path).await;
        tracing::info!(
            path = %path.display(),
            materials = db.materials.len(),
            "Material store opened"
        );
        Ok(Self {
            path: Some(path),
            db: RwLock::new(db),
        })
    }

    /// Location of the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Reload from disk when another writer replaced the file since the last sync.
    async fn refresh(&self, db: &mut Database) -> Result<(), StoreError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let current = fingerprint(path).await;
        if current.is_none() || current == db.synced {
            return Ok(());
        }
        let Some(mut fresh) = read_database(path).await? else {
            return Ok(());
        };
        fresh.next_id = fresh.next_id.max(db.next_id);
        fresh.synced = current;
        tracing::info!(
            path = %path.display(),
            materials = fresh.materials.len(),
            "Material database changed on disk; reloaded"
        );
        *db = fresh;
        Ok(())
    }

    async fn persist(&self, db: &mut Database) -> Result<(), StoreError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let io_error = |source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let bytes = serde_json::to_vec_pretty(&*db).map_err(|source| StoreError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await.map_err(io_error)?;
        tokio::fs::rename(&staging, path).await.map_err(io_error)?;
        db.synced = fingerprint(path).await;
        Ok(())
    }
}

#[async_trait]
impl MaterialStore for JsonMaterialStore {
    async fn create(&self, material: NewMaterial) -> Result<Material, StoreError> {
        let mut db = self.db.write().await;
        self.refresh(&mut db).await?;
        let id = db.allocate_id();
        let NewMaterial {
            filename,
            original_filename,
            content,
            summary,
            bullet_summary,
            raw_summary,
        } = material;
        let material = Material {
            id,
            title: super::title_from_filename(&original_filename),
            filename,
            original_filename,
            content,
            summary,
            bullet_summary,
            raw_summary,
            created_at: current_timestamp_rfc3339(),
        };
        db.materials.insert(id, material.clone());

        if let Err(error) = self.persist(&mut db).await {
            db.materials.remove(&id);
            return Err(error);
        }
        tracing::debug!(material_id = id, "Material created");
        Ok(material)
    }

    async fn get(&self, id: u64) -> Result<Option<Material>, StoreError> {
        let mut db = self.db.write().await;
        self.refresh(&mut db).await?;
        Ok(db.materials.get(&id).cloned())
    }

    async fn list_latest(&self) -> Result<Vec<Material>, StoreError> {
        let mut db = self.db.write().await;
        self.refresh(&mut db).await?;
        Ok(db.materials.values().rev().cloned().collect())
    }

    async fn update(&self, material: Material) -> Result<(), StoreError> {
        let mut db = self.db.write().await;
        self.refresh(&mut db).await?;
        let Some(slot) = db.materials.get_mut(&material.id) else {
            return Err(StoreError::NotFound(material.id));
        };
        let previous = std::mem::replace(slot, material);
        let id = previous.id;

        if let Err(error) = self.persist(&mut db).await {
            db.materials.insert(id, previous);
            return Err(error);
        }
        tracing::debug!(material_id = id, "Material updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_material(name: &str) -> NewMaterial {
        NewMaterial {
            filename: format!("{name}-stored.txt"),
            original_filename: format!("{name}.txt"),
            content: format!("{name} content"),
            summary: format!("{name} summary"),
            bullet_summary: vec!["point".into()],
            raw_summary: Some(format!("{name} summary\n\n- point")),
        }
    }

    #[tokio::test]
    async fn assigns_increasing_ids_and_lists_newest_first() {
        let store = JsonMaterialStore::in_memory();
        let first = store.create(new_material("first")).await.expect("first");
        let second = store.create(new_material("second")).await.expect("second");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.title.as_deref(), Some("first"));

        let ids: Vec<u64> = store
            .list_latest()
            .await
            .expect("list")
            .iter()
            .map(|material| material.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn reopening_restores_materials_and_id_sequence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("db").join("materials.json");

        {
            let store = JsonMaterialStore::open(&path).await.expect("open");
            store.create(new_material("kept")).await.expect("create");
        }

        let reopened = JsonMaterialStore::open(&path).await.expect("reopen");
        let kept = reopened.get(1).await.expect("get").expect("material");
        assert_eq!(kept.summary, "kept summary");
        assert_eq!(kept.bullet_summary, vec!["point".to_string()]);

        let next = reopened.create(new_material("next")).await.expect("create");
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn update_replaces_existing_and_rejects_unknown() {
        let store = JsonMaterialStore::in_memory();
        let mut material = store.create(new_material("doc")).await.expect("create");
        material.bullet_summary = vec!["revised".into()];
        store.update(material.clone()).await.expect("update");
        assert_eq!(store.get(material.id).await.expect("get"), Some(material));

        let mut ghost = store.get(1).await.expect("get").expect("material");
        ghost.id = 99;
        assert!(matches!(
            store.update(ghost).await,
            Err(StoreError::NotFound(99))
        ));
    }

    #[tokio::test]
    async fn writes_from_another_process_are_not_overwritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("materials.json");

        let server = JsonMaterialStore::open(&path).await.expect("open server");
        server.create(new_material("lecture")).await.expect("create");

        let admin = JsonMaterialStore::open(&path).await.expect("open admin");
        let mut renamed = admin.get(1).await.expect("get").expect("material");
        renamed.title = Some("Renamed lecture notes".into());
        admin.update(renamed).await.expect("admin update");

        let seen = server.get(1).await.expect("get").expect("material");
        assert_eq!(seen.title.as_deref(), Some("Renamed lecture notes"));
        let second = server.create(new_material("seminar")).await.expect("create");
        assert_eq!(second.id, 2);

        let reopened = JsonMaterialStore::open(&path).await.expect("reopen");
        let first = reopened.get(1).await.expect("get").expect("material");
        assert_eq!(first.title.as_deref(), Some("Renamed lecture notes"));
        assert!(reopened.get(2).await.expect("get").is_some());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("materials.json");
        tokio::fs::write(&path, b"{ not json").await.expect("write");

        assert!(matches!(
            JsonMaterialStore::open(&path).await,
            Err(StoreError::Corrupt { .. })
        ));
    }
}
