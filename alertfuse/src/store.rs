// alertfuse/src/store.rs
//
// File-backed incident store.
//
// The whole run is one pretty-printed JSON array. Saves go to a sibling
// `.tmp` file first and are renamed into place, so readers see either the
// previous document or the complete new one.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::events::Incident;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("incident store I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("incident store {path} is not a valid incident document: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode incidents: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("incident {0} not found")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

pub struct IncidentStore {
    path: PathBuf,
}

impl IncidentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }

    pub async fn save(&self, incidents: &[Incident]) -> Result<()> {
        let body = serde_json::to_string_pretty(incidents)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| self.io_err(e))?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        if let Err(e) = self.replace_with(&tmp, body.as_bytes()).await {
            match tokio::fs::remove_file(&tmp).await {
                Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => {
                    warn!(tmp = %tmp.display(), error = %cleanup, "could not remove temp file");
                }
                _ => {}
            }
            return Err(self.io_err(e));
        }
        info!("Wrote {} incidents to {}", incidents.len(), self.path.display());
        Ok(())
    }

    async fn replace_with(&self, tmp: &Path, body: &[u8]) -> std::io::Result<()> {
        let mut f = tokio::fs::File::create(tmp).await?;
        f.write_all(body).await?;
        f.write_all(b"\n").await?;
        f.sync_all().await?;
        drop(f);
        tokio::fs::rename(tmp, &self.path).await
    }

    pub async fn load(&self) -> Result<Vec<Incident>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_err(e))?;
        serde_json::from_str(&content).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    pub async fn find(&self, incident_id: &str) -> Result<Incident> {
        self.load()
            .await?
            .into_iter()
            .find(|i| i.incident_id == incident_id)
            .ok_or_else(|| StoreError::NotFound(incident_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cluster::cluster_alerts;
    use crate::events::Alert;
    use chrono::{Duration, TimeZone, Utc};

    fn incidents() -> Vec<Incident> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let alerts = vec![
            Alert::new(base, "Port Scan").with_host("host-a").with_user("bob").with_technique("T1046"),
            Alert::new(base + Duration::minutes(1), "Command Exec")
                .with_host("host-a")
                .with_user("bob")
                .with_technique("T1059"),
        ];
        cluster_alerts(alerts, Duration::minutes(15), 5)
    }

    #[tokio::test]
    async fn save_then_find_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = IncidentStore::new(dir.path().join("nested/out/incidents.json"));
        let written = incidents();
        store.save(&written).await.unwrap();

        assert_eq!(store.load().await.unwrap(), written);
        let found = store.find("INC-0001").await.unwrap();
        assert_eq!(found.decision_replay, written[0].decision_replay);
        assert!(!dir.path().join("nested/out/incidents.json.tmp").exists());
    }

    #[tokio::test]
    async fn missing_incident_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = IncidentStore::new(dir.path().join("incidents.json"));
        assert!(matches!(store.load().await, Err(StoreError::Io { .. })));

        store.save(&incidents()).await.unwrap();
        assert!(matches!(store.find("INC-9999").await, Err(StoreError::NotFound(id)) if id == "INC-9999"));
    }

    #[tokio::test]
    async fn failed_replace_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("incidents.json");
        // a non-empty directory at the target makes the final rename fail
        std::fs::create_dir_all(target.join("occupied")).unwrap();

        let store = IncidentStore::new(&target);
        assert_eq!(store.path(), target.as_path());
        assert!(matches!(store.save(&incidents()).await, Err(StoreError::Io { .. })));
        assert!(!dir.path().join("incidents.json.tmp").exists());
        assert!(target.join("occupied").is_dir());
    }

    #[tokio::test]
    async fn corrupt_document_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidents.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        assert!(matches!(IncidentStore::new(path).load().await, Err(StoreError::Decode { .. })));
    }
}
