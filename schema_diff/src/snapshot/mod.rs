//! Schema snapshots
//!
//! A snapshot is the complete object tree of one schema: every table with its
//! columns and constraints inline, and one collection per sub-object kind.
//! Snapshots are assembled by [`SnapshotLoader`] from an
//! [`ObjectSnapshotProvider`], one fetch per kind per parent.

pub mod provider;
pub mod server;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::types::{ObjectKind, Property, PropertyBag};

pub use provider::FileSnapshotProvider;
pub use server::{Capabilities, ServerInfo, ServerType};

/// Default bound on partition nesting followed while loading
const DEFAULT_LOAD_DEPTH: usize = 8;

/// What to fetch: one object kind within one schema, optionally under a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest<'a> {
    pub kind: ObjectKind,
    pub server_id: &'a str,
    pub database_id: &'a str,
    pub schema_id: &'a str,
    /// Owning table (or partition) name for sub-objects
    pub parent: Option<&'a str>,
}

impl<'a> FetchRequest<'a> {
    /// Dotted location of the request, used in errors
    pub fn path(&self) -> String {
        let mut path = format!("{}.{}.{}", self.server_id, self.database_id, self.schema_id);
        if let Some(parent) = self.parent {
            path.push('.');
            path.push_str(parent);
        }
        path.push('.');
        path.push_str(self.kind.collection_key());
        path
    }
}

/// Source of object properties, keyed by object name
pub trait ObjectSnapshotProvider {
    fn fetch(&self, request: &FetchRequest<'_>) -> Result<IndexMap<String, PropertyBag>>;

    /// Type and version of the server behind this provider, when known
    fn server_info(&self) -> Option<ServerInfo> {
        None
    }
}

/// Serialized form of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub server: Option<ServerInfo>,
    pub schema: String,
    #[serde(default)]
    pub tables: Vec<PropertyBag>,
}

/// The object tree of one schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaSnapshot {
    server: Option<ServerInfo>,
    schema: String,
    tables: Vec<PropertyBag>,
}

impl SchemaSnapshot {
    /// Create a snapshot; every table needs a unique name
    pub fn new(schema: impl Into<String>, tables: Vec<PropertyBag>) -> Result<Self> {
        let schema = schema.into();
        let mut seen = HashSet::new();
        for table in &tables {
            let name = table.require_name("table")?;
            if !seen.insert(name.to_string()) {
                return Err(Error::Precondition(format!(
                    "table '{}.{}' appears more than once in the snapshot",
                    schema, name
                )));
            }
        }
        Ok(Self {
            server: None,
            schema,
            tables,
        })
    }

    pub fn from_document(document: SnapshotDocument) -> Result<Self> {
        let snapshot = Self::new(document.schema, document.tables)?;
        Ok(match document.server {
            Some(server) => snapshot.with_server(server),
            None => snapshot,
        })
    }

    pub fn with_server(mut self, server: ServerInfo) -> Self {
        self.server = Some(server);
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn server(&self) -> Option<&ServerInfo> {
        self.server.as_ref()
    }

    pub fn tables(&self) -> &[PropertyBag] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&PropertyBag> {
        self.tables.iter().find(|table| table.name() == Some(name))
    }

    pub fn to_document(&self) -> SnapshotDocument {
        SnapshotDocument {
            server: self.server,
            schema: self.schema.clone(),
            tables: self.tables.clone(),
        }
    }
}

/// Assembles a [`SchemaSnapshot`] from per-kind fetches
pub struct SnapshotLoader<'a, P: ObjectSnapshotProvider + ?Sized> {
    provider: &'a P,
    max_depth: usize,
}

impl<'a, P: ObjectSnapshotProvider + ?Sized> SnapshotLoader<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            max_depth: DEFAULT_LOAD_DEPTH,
        }
    }

    /// Limit how deep nested partitions are followed
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Fetch the tables of `schema_id`, then every sub-object collection of each
    pub fn load(&self, server_id: &str, database_id: &str, schema_id: &str) -> Result<SchemaSnapshot> {
        let server = self.provider.server_info();
        let capabilities = Capabilities::between(server.as_ref(), server.as_ref());
        let request = FetchRequest {
            kind: ObjectKind::Table,
            server_id,
            database_id,
            schema_id,
            parent: None,
        };

        let mut tables = Vec::new();
        for (_, table) in self.provider.fetch(&request)? {
            tables.push(self.load_children(table, &request, capabilities, 0)?);
        }
        debug!(schema = schema_id, tables = tables.len(), "snapshot loaded");

        let snapshot = SchemaSnapshot::new(schema_id, tables)?;
        Ok(match server {
            Some(server) => snapshot.with_server(server),
            None => snapshot,
        })
    }

    fn load_children(
        &self,
        mut table: PropertyBag,
        request: &FetchRequest<'_>,
        capabilities: Capabilities,
        depth: usize,
    ) -> Result<PropertyBag> {
        let name = table.require_name("table")?.to_string();
        if depth > self.max_depth {
            return Err(Error::fetch(
                ObjectKind::Partition,
                request.path(),
                format!("partitions of '{}' nest deeper than {}", name, self.max_depth),
            ));
        }

        for kind in ObjectKind::SUBMODULES {
            table.remove(kind.collection_key());
            if !capabilities.supports(kind) {
                continue;
            }
            let child_request = FetchRequest {
                kind,
                parent: Some(&name),
                ..*request
            };
            let mut items = Vec::new();
            for (_, item) in self.provider.fetch(&child_request)? {
                let item = if kind == ObjectKind::Partition {
                    self.load_children(item, &child_request, capabilities, depth + 1)?
                } else {
                    item
                };
                items.push(Property::Bag(item));
            }
            if !items.is_empty() {
                table.insert(kind.collection_key(), Property::List(items));
            }
        }
        Ok(table)
    }
}

/// Key a list of bags by name, rejecting unnamed and duplicate entries
pub fn index_by_name(kind: ObjectKind, bags: Vec<PropertyBag>) -> Result<IndexMap<String, PropertyBag>> {
    let mut indexed = IndexMap::with_capacity(bags.len());
    for bag in bags {
        let name = bag.require_name(kind.as_str())?.to_string();
        if indexed.contains_key(&name) {
            return Err(Error::Precondition(format!(
                "{} '{}' appears more than once",
                kind, name
            )));
        }
        indexed.insert(name, bag);
    }
    Ok(indexed)
}
