//! Server identity and feature gating

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::schema::types::ObjectKind;

/// Oldest server version with declarative partitioning
pub const PARTITION_MIN_VERSION: u32 = 100_000;

/// Oldest EDB Advanced Server version with compound triggers
pub const COMPOUND_TRIGGER_MIN_VERSION: u32 = 120_000;

/// Flavour of the server a snapshot was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    #[serde(alias = "pg")]
    Postgres,
    /// EDB Postgres Advanced Server
    #[serde(alias = "ppas")]
    Edb,
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerType::Postgres => f.write_str("PostgreSQL"),
            ServerType::Edb => f.write_str("EDB Postgres Advanced Server"),
        }
    }
}

/// Type and numeric version (`server_version_num`) of a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub server_type: ServerType,
    pub version: u32,
}

/// Round a version number up to the next ten-thousand boundary.
///
/// Only versions below `10000` round to the hundreds. Server version numbers
/// from 9.x on have five digits, so `90624` and `90500` both round to
/// `100000` and every 9.x release counts as one major version.
fn major_bound(version: u32) -> u32 {
    if version < 10_000 {
        if version % 100 == 0 {
            version
        } else {
            version + 100 - version % 100
        }
    } else {
        version + 10_000 - version % 10_000
    }
}

impl ServerInfo {
    pub fn new(server_type: ServerType, version: u32) -> Self {
        Self {
            server_type,
            version,
        }
    }

    /// Both servers must be of the same type and major version
    pub fn check_compatibility(source: &ServerInfo, target: &ServerInfo) -> Result<()> {
        if source.server_type != target.server_type {
            return Err(Error::Incompatible(format!(
                "cannot compare {} with {}",
                source.server_type, target.server_type
            )));
        }
        if major_bound(source.version) != major_bound(target.version) {
            return Err(Error::Incompatible(format!(
                "source version {} and target version {} are not the same major version",
                source.version, target.version
            )));
        }
        Ok(())
    }

    /// Whether objects of `kind` exist on this server
    pub fn supports(&self, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::CompoundTrigger => {
                self.server_type == ServerType::Edb && self.version >= COMPOUND_TRIGGER_MIN_VERSION
            }
            ObjectKind::Partition => self.version >= PARTITION_MIN_VERSION,
            _ => true,
        }
    }
}

/// Sub-object kinds both sides of a comparison can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    compound_triggers: bool,
    partitions: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}

impl Capabilities {
    /// Everything enabled, used when server details are unknown
    pub fn all() -> Self {
        Self {
            compound_triggers: true,
            partitions: true,
        }
    }

    /// A kind is walked only when every known server supports it
    pub fn between(source: Option<&ServerInfo>, target: Option<&ServerInfo>) -> Self {
        let both = |kind: ObjectKind| {
            [source, target]
                .into_iter()
                .flatten()
                .all(|server| server.supports(kind))
        };
        Self {
            compound_triggers: both(ObjectKind::CompoundTrigger),
            partitions: both(ObjectKind::Partition),
        }
    }

    pub fn supports(&self, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::CompoundTrigger => self.compound_triggers,
            ObjectKind::Partition => self.partitions,
            _ => true,
        }
    }
}
