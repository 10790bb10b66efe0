use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::CoreError;
use crate::model::shadow::{Shadow, ShadowId};

const SHADOWS_DIR: &str = "shadows";
const INDEX_FILE: &str = "index.json";

/// Plain-file persistence for shadow records.
///
/// Layout: `<root>/shadows/<2-char fanout>/<shadow-id>.json`, plus the
/// shared `<root>/index.json` document owned by the store.
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open a backend at the given root, creating the layout if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(SHADOWS_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn shadow_path(&self, id: &ShadowId) -> PathBuf {
        self.root
            .join(SHADOWS_DIR)
            .join(id.fanout_prefix())
            .join(format!("{}.json", id.as_str()))
    }

    /// Persist one shadow record.
    pub fn write_shadow(&self, shadow: &Shadow) -> Result<(), CoreError> {
        let path = self.shadow_path(&shadow.shadow_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(shadow)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load one shadow record. Absent files are `None`; corrupt files are
    /// errors.
    pub fn read_shadow(&self, id: &ShadowId) -> Result<Option<Shadow>, CoreError> {
        let path = self.shadow_path(id);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::Io(e)),
        };
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Walk the fanout directory and load every readable shadow, skipping
    /// unreadable records with a warning. Used by index rebuild.
    pub fn scan_shadows(&self) -> Result<Vec<Shadow>, CoreError> {
        let mut shadows = Vec::new();
        for entry in WalkDir::new(self.root.join(SHADOWS_DIR)) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|ext| ext.to_str()) != Some("json")
            {
                continue;
            }
            match fs::read_to_string(entry.path())
                .map_err(CoreError::Io)
                .and_then(|data| Ok(serde_json::from_str::<Shadow>(&data)?))
            {
                Ok(shadow) => shadows.push(shadow),
                Err(e) => {
                    tracing::warn!("Skipping unreadable shadow {}: {e}", entry.path().display());
                }
            }
        }
        Ok(shadows)
    }
}
