//! TOML-based GenerationRepository implementation

use crate::storage::DocumentDir;
use async_trait::async_trait;
use dgen_core::generation::{GenerationRecord, GenerationRepository};
use dgen_core::{DgenError, Result};
use std::path::Path;

/// Stores each generation record as `records/<id>.toml`.
pub struct TomlGenerationRepository {
    documents: DocumentDir<GenerationRecord>,
}

impl TomlGenerationRepository {
    pub fn new(records_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            documents: DocumentDir::open(records_dir, "generation_record")?,
        })
    }
}

#[async_trait]
impl GenerationRepository for TomlGenerationRepository {
    async fn find_by_id(&self, record_id: &str) -> Result<Option<GenerationRecord>> {
        self.documents.load(record_id)
    }

    async fn save(&self, record: &GenerationRecord) -> Result<()> {
        let file = self.documents.file(&record.id)?;
        if file.exists() {
            return Err(DgenError::data_access(format!(
                "generation record '{}' already exists",
                record.id
            )));
        }
        file.save(record)?;
        tracing::debug!("Saved generation record {} for project {}", record.id, record.project_id);
        Ok(())
    }

    async fn delete(&self, record_id: &str) -> Result<()> {
        self.documents.remove(record_id)
    }

    async fn list_by_project(&self, project_id: &str) -> Result<Vec<GenerationRecord>> {
        let mut records: Vec<_> = self
            .documents
            .load_all()?
            .into_iter()
            .filter(|r| r.project_id == project_id)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
