//! Template records, the storage interface and the lifecycle service.
//!
//! Storage is a collaborator: [`TemplateDesigner`] works against any
//! [`TemplateStore`], and [`InMemoryStore`] is provided for tests and
//! single-process use.

mod designer;
mod memory;

pub use designer::{TemplateDesigner, TemplateSchema};
pub use memory::InMemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::mapping::MappingRegistry;

/// Lifecycle state of a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    /// Mappings may be edited
    #[default]
    Draft,
    /// Materialized; mappings are frozen
    Published,
}

impl std::fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateStatus::Draft => write!(f, "draft"),
            TemplateStatus::Published => write!(f, "published"),
        }
    }
}

/// A stored template.
#[derive(Debug, Clone)]
pub struct TemplateRecord {
    /// Template id
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Lifecycle state
    pub status: TemplateStatus,
    /// Source document as uploaded
    pub source: Vec<u8>,
    /// Materialized template, set at publish time
    pub materialized: Option<Vec<u8>>,
    /// Mappings in application order
    pub mappings: MappingRegistry,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl TemplateRecord {
    /// Create a draft record with a fresh id.
    pub fn new(name: impl Into<String>, source: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: TemplateStatus::Draft,
            source,
            materialized: None,
            mappings: MappingRegistry::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the template is published.
    pub fn is_published(&self) -> bool {
        self.status == TemplateStatus::Published
    }

    /// Bump the modification time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Summary without document bytes.
    pub fn info(&self) -> TemplateInfo {
        TemplateInfo {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            mapping_count: self.mappings.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Serializable summary of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    /// Template id
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Lifecycle state
    pub status: TemplateStatus,
    /// Number of mappings
    pub mapping_count: usize,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Persistence of template records.
///
/// Implementations own durability; the lifecycle rules live in
/// [`TemplateDesigner`].
pub trait TemplateStore: Send + Sync {
    /// Store a new record.
    fn insert(&mut self, record: TemplateRecord) -> Result<()>;

    /// Fetch a record.
    fn get(&self, id: &Uuid) -> Result<Option<TemplateRecord>>;

    /// Overwrite an existing record.
    fn update(&mut self, record: TemplateRecord) -> Result<()>;

    /// Delete a record. Returns `false` when it did not exist.
    fn delete(&mut self, id: &Uuid) -> Result<bool>;

    /// Summaries of all records, oldest first.
    fn list(&self) -> Result<Vec<TemplateInfo>>;
}
