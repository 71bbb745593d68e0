use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::Store;
use crate::prelude::*;

/// An in-memory store.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    database: String,
    collections: BTreeMap<String, BTreeMap<String, Map<String, Value>>>,
}

impl MemoryStore {
    pub(crate) fn new<S: Into<String>>(database: S) -> Self {
        Self {
            database: database.into(),
            collections: BTreeMap::new(),
        }
    }

    /// Adds documents to a collection; panics on failure.
    pub(crate) fn with(
        mut self,
        collection: &str,
        docs: Vec<Document>,
    ) -> Self {
        self.upsert(collection, &docs).unwrap();
        self
    }
}

impl Store for MemoryStore {
    fn database(&self) -> &str {
        &self.database
    }

    fn collection_names(&self) -> DateprepResult<Vec<String>> {
        Ok(self
            .collections
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn count(&self, collection: &str) -> DateprepResult<usize> {
        Ok(self.collections.get(collection).map_or(0, BTreeMap::len))
    }

    fn find(&self, collection: &str) -> DateprepResult<Vec<Document>> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| {
                        Document::from_parts(id.clone(), fields.clone())
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn upsert(
        &mut self,
        collection: &str,
        docs: &[Document],
    ) -> DateprepResult<usize> {
        let entries = self.collections.entry(collection.into()).or_default();
        for doc in docs {
            entries.insert(doc.id().into(), doc.fields().clone());
        }

        Ok(docs.len())
    }
}
