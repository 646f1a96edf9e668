//! File-backed snapshot provider

use indexmap::IndexMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::types::{ObjectKind, PropertyBag};
use crate::snapshot::{
    index_by_name, FetchRequest, ObjectSnapshotProvider, SchemaSnapshot, ServerInfo,
    SnapshotDocument, SnapshotLoader,
};

/// Serves a snapshot document read from a `.json`, `.yaml` or `.yml` file
#[derive(Debug, Clone)]
pub struct FileSnapshotProvider {
    document: SnapshotDocument,
    /// Tables and partitions at every depth, by name
    relations: IndexMap<String, PropertyBag>,
}

impl FileSnapshotProvider {
    /// Read and parse a snapshot file, choosing the format from its extension
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let document: SnapshotDocument = match extension.as_str() {
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            other => {
                return Err(Error::fetch(
                    "snapshot",
                    path.display().to_string(),
                    format!("unsupported snapshot format '{}'", other),
                ))
            }
        };
        tracing::info!(
            path = %path.display(),
            schema = %document.schema,
            tables = document.tables.len(),
            "read snapshot file"
        );
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: SnapshotDocument) -> Self {
        let mut relations = IndexMap::new();
        for table in &document.tables {
            collect_relations(table, &mut relations);
        }
        Self {
            document,
            relations,
        }
    }

    pub fn document(&self) -> &SnapshotDocument {
        &self.document
    }

    /// Load the whole document through a [`SnapshotLoader`]
    pub fn load(&self) -> Result<SchemaSnapshot> {
        let schema = self.document.schema.as_str();
        SnapshotLoader::new(self).load("file", "file", schema)
    }
}

fn collect_relations(table: &PropertyBag, relations: &mut IndexMap<String, PropertyBag>) {
    if let Some(name) = table.name() {
        relations
            .entry(name.to_string())
            .or_insert_with(|| table.clone());
    }
    for partition in table.bags(ObjectKind::Partition.collection_key()) {
        collect_relations(&partition, relations);
    }
}

impl ObjectSnapshotProvider for FileSnapshotProvider {
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<IndexMap<String, PropertyBag>> {
        if request.schema_id != self.document.schema {
            return Err(Error::fetch(
                request.kind,
                request.path(),
                format!("snapshot holds schema '{}'", self.document.schema),
            ));
        }

        match (request.kind, request.parent) {
            (ObjectKind::Table, None) => index_by_name(ObjectKind::Table, self.document.tables.clone()),
            (ObjectKind::Table, Some(_)) => Err(Error::fetch(
                request.kind,
                request.path(),
                "tables are not nested under a parent",
            )),
            (kind, Some(parent)) => {
                let table = self.relations.get(parent).ok_or_else(|| {
                    Error::fetch(kind, request.path(), format!("parent '{}' not found", parent))
                })?;
                index_by_name(kind, table.bags(kind.collection_key()))
            }
            (kind, None) => Err(Error::fetch(
                kind,
                request.path(),
                "sub-objects can only be fetched for a parent table",
            )),
        }
    }

    fn server_info(&self) -> Option<ServerInfo> {
        self.document.server
    }
}
