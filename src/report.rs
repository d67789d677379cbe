// 📄 Report Export
//
// { generatedAt, sentEntities, auditTrail } as pretty JSON, written to
// report-<epoch-ms>.json. No schema versioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::entities::{AuditEntry, Entity};
use crate::error::{Result, TriageError};
use crate::store::{Collection, TriageStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated_at: DateTime<Utc>,

    /// Submitted archive, most recent batch first
    pub sent_entities: Vec<Entity>,

    /// Audit log, most recent first
    pub audit_trail: Vec<AuditEntry>,
}

impl Report {
    pub fn from_store(store: &TriageStore, generated_at: DateTime<Utc>) -> Self {
        Report {
            generated_at,
            sent_entities: store
                .collection(Collection::Submitted)
                .iter()
                .cloned()
                .collect(),
            audit_trail: store.audit().to_vec(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("report-{}.json", self.generated_at.timestamp_millis())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write into `dir` (created if missing) and return the file path
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| TriageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(self.file_name());
        let json = self.to_json()?;
        fs::write(&path, json).map_err(|source| TriageError::Io {
            path: path.clone(),
            source,
        })?;

        info!(
            path = %path.display(),
            entities = self.sent_entities.len(),
            audit_entries = self.audit_trail.len(),
            "report exported"
        );
        Ok(path)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TriageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
