//! File-backed store for confirmed column mappings.
//!
//! One JSON file per `(workspace, category)` pair, named
//! `{workspace}_{category}.json`. The workspace part is percent-encoded so
//! that distinct ids never share a file. Saving replaces the whole mapping.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use lead_model::{Category, ColumnMapping};

const FORMAT_VERSION: &str = "1.0";

/// Repository for storing and loading confirmed column mappings.
///
/// Mappings are stored as JSON files in a directory, one per
/// `(workspace, category)` pair.
#[derive(Debug, Clone)]
pub struct MappingRepository {
    /// Directory where mapping files are stored.
    base_dir: PathBuf,
}

/// Metadata about a stored mapping, as returned by
/// [`MappingRepository::list`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingMetadata {
    /// Workspace the mapping belongs to, as written in the file.
    pub workspace_id: String,
    /// Upload category the mapping applies to.
    pub category: Category,
    /// Path to the mapping file.
    pub file_path: PathBuf,
    /// Number of mapped columns.
    pub column_count: usize,
    /// When the mapping was saved, if recorded.
    pub saved_at: Option<String>,
}

/// A mapping as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMapping {
    /// Workspace id exactly as the caller passed it.
    pub workspace_id: String,
    /// Upload category the mapping applies to.
    pub category: Category,
    /// Column to field assignments in upload column order.
    pub mapping: ColumnMapping,
    /// RFC 3339 UTC timestamp.
    pub saved_at: Option<String>,
    /// File format version.
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

impl StoredMapping {
    /// Wraps `mapping` for storage, stamped with the current time.
    pub fn new(workspace_id: impl Into<String>, category: Category, mapping: ColumnMapping) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            category,
            mapping,
            saved_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            version: default_version(),
        }
    }
}

impl MappingRepository {
    /// Opens the repository, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).with_context(|| {
            format!(
                "Failed to create mapping repository: {}",
                base_dir.display()
            )
        })?;
        Ok(Self { base_dir })
    }

    /// Directory holding the mapping files.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Saves `mapping`, replacing whatever was stored for the pair.
    ///
    /// Returns the path of the written file.
    pub fn save(
        &self,
        workspace_id: &str,
        category: Category,
        mapping: &ColumnMapping,
    ) -> Result<PathBuf> {
        self.save_stored(&StoredMapping::new(workspace_id, category, mapping.clone()))
    }

    /// Writes an already built [`StoredMapping`] under its own workspace
    /// and category.
    pub fn save_stored(&self, stored: &StoredMapping) -> Result<PathBuf> {
        let path = self.mapping_path(&stored.workspace_id, stored.category);
        let json = serde_json::to_string_pretty(stored)
            .with_context(|| format!("Failed to serialize mapping for {}", path.display()))?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write mapping to {}", path.display()))?;
        debug!(path = %path.display(), columns = stored.mapping.len(), "mapping saved");
        Ok(path)
    }

    /// Loads the mapping stored for the pair.
    ///
    /// Returns `None` when nothing is stored for the pair.
    pub fn load(&self, workspace_id: &str, category: Category) -> Result<Option<ColumnMapping>> {
        Ok(self
            .load_stored(workspace_id, category)?
            .map(|stored| stored.mapping))
    }

    /// Loads the stored mapping with its metadata.
    ///
    /// A file whose recorded workspace or category differs from the request
    /// counts as absent.
    pub fn load_stored(
        &self,
        workspace_id: &str,
        category: Category,
    ) -> Result<Option<StoredMapping>> {
        let path = self.mapping_path(workspace_id, category);
        if !path.exists() {
            return Ok(None);
        }
        let stored = read_stored(&path)?;
        if stored.workspace_id != workspace_id || stored.category != category {
            debug!(
                path = %path.display(),
                stored_workspace = %stored.workspace_id,
                requested_workspace = workspace_id,
                "mapping file belongs to another workspace"
            );
            return Ok(None);
        }
        Ok(Some(stored))
    }

    /// Loads every category stored for a workspace.
    pub fn load_workspace(&self, workspace_id: &str) -> Result<BTreeMap<Category, ColumnMapping>> {
        let mut mappings = BTreeMap::new();
        for category in Category::ALL {
            if let Some(mapping) = self.load(workspace_id, category)? {
                mappings.insert(category, mapping);
            }
        }
        Ok(mappings)
    }

    /// Lists stored mappings sorted by workspace then category.
    ///
    /// Files that do not parse as mappings are skipped.
    pub fn list(&self) -> Result<Vec<MappingMetadata>> {
        let mut metadata = Vec::new();

        for entry in fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read repository: {}", self.base_dir.display()))?
        {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Ok(stored) = read_stored(&path) else {
                debug!(path = %path.display(), "skipping unreadable mapping file");
                continue;
            };
            metadata.push(MappingMetadata {
                workspace_id: stored.workspace_id,
                category: stored.category,
                file_path: path,
                column_count: stored.mapping.len(),
                saved_at: stored.saved_at,
            });
        }

        metadata.sort_by(|a, b| {
            a.workspace_id
                .cmp(&b.workspace_id)
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(metadata)
    }

    /// Deletes the mapping stored for the pair.
    ///
    /// Returns whether a file was removed.
    pub fn delete(&self, workspace_id: &str, category: Category) -> Result<bool> {
        let path = self.mapping_path(workspace_id, category);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete mapping: {}", path.display()))?;
        Ok(true)
    }

    /// Checks whether a mapping file exists for the pair.
    pub fn exists(&self, workspace_id: &str, category: Category) -> bool {
        self.mapping_path(workspace_id, category).exists()
    }

    fn mapping_path(&self, workspace_id: &str, category: Category) -> PathBuf {
        self.base_dir
            .join(format!("{}_{}.json", encode_id(workspace_id), category.as_str()))
    }
}

fn read_stored(path: &Path) -> Result<StoredMapping> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse mapping from {}", path.display()))
}

/// Percent-encodes an id for use in a filename.
///
/// ASCII letters, digits and `-` are kept; every other byte becomes `%XX`.
/// The encoding is injective, so two ids never map to the same file.
fn encode_id(id: &str) -> String {
    let mut encoded = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}
