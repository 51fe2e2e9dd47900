//! In-memory template store.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{Error, Result};

use super::{TemplateInfo, TemplateRecord, TemplateStore};

/// A [`TemplateStore`] backed by a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: HashMap<Uuid, TemplateRecord>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored templates.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TemplateStore for InMemoryStore {
    fn insert(&mut self, record: TemplateRecord) -> Result<()> {
        self.records.insert(record.id, record);
        Ok(())
    }

    fn get(&self, id: &Uuid) -> Result<Option<TemplateRecord>> {
        Ok(self.records.get(id).cloned())
    }

    fn update(&mut self, record: TemplateRecord) -> Result<()> {
        match self.records.get_mut(&record.id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(Error::TemplateNotFound(record.id.to_string())),
        }
    }

    fn delete(&mut self, id: &Uuid) -> Result<bool> {
        Ok(self.records.remove(id).is_some())
    }

    fn list(&self) -> Result<Vec<TemplateInfo>> {
        let mut infos: Vec<TemplateInfo> = self.records.values().map(TemplateRecord::info).collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_delete() {
        let mut store = InMemoryStore::new();
        let record = TemplateRecord::new("a", Vec::new());
        let id = record.id;

        store.insert(record).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().unwrap().name, "a");

        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert!(store.get(&id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_record() {
        let mut store = InMemoryStore::new();
        let result = store.update(TemplateRecord::new("ghost", Vec::new()));
        assert!(matches!(result, Err(Error::TemplateNotFound(_))));
    }

    #[test]
    fn test_list_summaries() {
        let mut store = InMemoryStore::new();
        store.insert(TemplateRecord::new("first", Vec::new())).unwrap();
        store.insert(TemplateRecord::new("second", Vec::new())).unwrap();
        let names: Vec<_> = store.list().unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"first".to_string()));
    }
}
