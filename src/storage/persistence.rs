use std::ffi::OsString;
use std::fmt::Display;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    AmbulanceRegistry, AmbulanceStore, ProvisionOutcome, SaveOutcome, StoreError, StoreResult,
    Version, Versioned,
};
use crate::model::{Ambulance, is_valid_ambulance_id};

/// Directory-backed store: one JSON document per ambulance.
///
/// Documents are replaced by writing and syncing a sibling `.tmp` file, then
/// renaming it over the original. Compare-and-write sections are serialized
/// through `write_gate`; readers never take it.
pub struct FileAmbulanceStore {
    root: PathBuf,
    write_gate: Mutex<()>,
}

impl FileAmbulanceStore {
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|err| {
            io_error(format_args!("create data directory '{}'", root.display()), err)
        })?;

        Ok(Self {
            root,
            write_gate: Mutex::new(()),
        })
    }

    fn document_path(&self, ambulance_id: &str) -> Option<PathBuf> {
        is_valid_ambulance_id(ambulance_id)
            .then(|| self.root.join(format!("{ambulance_id}.json")))
    }

    async fn read_document(&self, path: &Path) -> StoreResult<Option<Versioned<Ambulance>>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(format_args!("read '{}'", path.display()), err)),
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|err| {
            StoreError::Serialization(format!("failed to decode '{}': {err}", path.display()))
        })
    }

    async fn write_document(&self, path: &Path, document: &Versioned<Ambulance>) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(document)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        replace_document(path, &bytes).await
    }
}

#[async_trait]
impl AmbulanceStore for FileAmbulanceStore {
    async fn load(&self, ambulance_id: &str) -> StoreResult<Option<Versioned<Ambulance>>> {
        let Some(path) = self.document_path(ambulance_id) else {
            return Ok(None);
        };
        self.read_document(&path).await
    }

    async fn conditional_save(
        &self,
        ambulance: &Ambulance,
        expected_version: Version,
    ) -> StoreResult<SaveOutcome> {
        let Some(path) = self.document_path(&ambulance.id) else {
            return Ok(SaveOutcome::VersionConflict { current: None });
        };

        let _gate = self.write_gate.lock().await;
        let Some(stored) = self.read_document(&path).await? else {
            return Ok(SaveOutcome::VersionConflict { current: None });
        };

        if stored.version != expected_version {
            return Ok(SaveOutcome::VersionConflict {
                current: Some(stored.version),
            });
        }

        let document = Versioned {
            version: stored.version.next(),
            value: ambulance.clone(),
        };
        self.write_document(&path, &document).await?;
        debug!(
            ambulance_id = %ambulance.id,
            version = %document.version,
            "ambulance document replaced"
        );

        Ok(SaveOutcome::Saved {
            version: document.version,
        })
    }
}

#[async_trait]
impl AmbulanceRegistry for FileAmbulanceStore {
    async fn create(&self, ambulance: Ambulance) -> StoreResult<ProvisionOutcome> {
        let path = self
            .document_path(&ambulance.id)
            .ok_or_else(|| StoreError::InvalidKey(ambulance.id.clone()))?;

        let _gate = self.write_gate.lock().await;
        if self.read_document(&path).await?.is_some() {
            return Ok(ProvisionOutcome::AlreadyExists);
        }

        let document = Versioned {
            version: Version::INITIAL,
            value: ambulance,
        };
        self.write_document(&path, &document).await?;

        Ok(ProvisionOutcome::Created {
            version: document.version,
        })
    }

    async fn remove(&self, ambulance_id: &str) -> StoreResult<bool> {
        let Some(path) = self.document_path(ambulance_id) else {
            return Ok(false);
        };

        let _gate = self.write_gate.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_error(format_args!("remove '{}'", path.display()), err)),
        }
    }
}

fn io_error(action: impl Display, err: io::Error) -> StoreError {
    StoreError::Io(format!("failed to {action}: {err}"))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Readers see either the previous document or the new one, never a torn write.
async fn replace_document(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let staging = staging_path(path);
    let staged = async {
        let mut file = fs::File::create(&staging).await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    };
    if let Err(err) = staged.await {
        let _ = fs::remove_file(&staging).await;
        return Err(io_error(format_args!("stage '{}'", staging.display()), err));
    }

    fs::rename(&staging, path).await.map_err(|err| {
        io_error(
            format_args!("move '{}' over '{}'", staging.display(), path.display()),
            err,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WaitingListEntry;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn documents_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileAmbulanceStore::open(dir.path()).await.unwrap();
            store.create(Ambulance::new("a1", "A1")).await.unwrap();

            let loaded = store.load("a1").await.unwrap().unwrap();
            let mut changed = loaded.value.clone();
            changed
                .waiting_list
                .push(WaitingListEntry::new("e1", "P1", Utc::now(), 20));
            let outcome = store
                .conditional_save(&changed, loaded.version)
                .await
                .unwrap();
            assert_eq!(
                outcome,
                SaveOutcome::Saved {
                    version: Version::from(2)
                }
            );
        }

        let reopened = FileAmbulanceStore::open(dir.path()).await.unwrap();
        let loaded = reopened.load("a1").await.unwrap().unwrap();
        assert_eq!(loaded.version, Version::from(2));
        assert_eq!(loaded.value.waiting_list[0].patient_id, "P1");
        assert!(!dir.path().join("a1.json.tmp").exists());
    }

    #[tokio::test]
    async fn stale_version_is_rejected_and_file_untouched() {
        let dir = TempDir::new().unwrap();
        let store = FileAmbulanceStore::open(dir.path()).await.unwrap();
        store.create(Ambulance::new("a1", "A1")).await.unwrap();
        let before = std::fs::read(dir.path().join("a1.json")).unwrap();

        let mut renamed = Ambulance::new("a1", "Renamed");
        renamed.room_number = Some("101".into());
        let outcome = store
            .conditional_save(&renamed, Version::from(7))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SaveOutcome::VersionConflict {
                current: Some(Version::INITIAL)
            }
        );
        assert_eq!(std::fs::read(dir.path().join("a1.json")).unwrap(), before);
    }

    #[tokio::test]
    async fn unsafe_ids_are_never_found_or_created() {
        let dir = TempDir::new().unwrap();
        let store = FileAmbulanceStore::open(dir.path()).await.unwrap();

        assert_eq!(store.load("../outside").await.unwrap(), None);
        assert!(!store.remove("../outside").await.unwrap());
        let err = store
            .create(Ambulance::new("../outside", "X"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn failed_write_reports_the_staging_path() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("data");
        let store = FileAmbulanceStore::open(&root).await.unwrap();
        std::fs::remove_dir_all(&root).unwrap();

        let err = store.create(Ambulance::new("a1", "A1")).await.unwrap_err();

        let StoreError::Io(message) = &err else {
            panic!("expected an io error, got {err:?}");
        };
        assert!(message.starts_with("failed to stage '"), "{message}");
        assert!(message.contains("a1.json.tmp"), "{message}");
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn corrupt_document_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let store = FileAmbulanceStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{not json").unwrap();

        let err = store.load("broken").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
