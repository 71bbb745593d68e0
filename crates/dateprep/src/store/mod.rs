use std::collections::BTreeSet;

use crate::prelude::*;

#[cfg(test)]
pub(crate) use memory::MemoryStore;
pub(crate) use sqlite::SqliteStore;

#[cfg(test)]
mod memory;
mod sqlite;

/// A handle onto a logical database of named document collections.
///
/// A collection exists as soon as it holds at least one document.
/// Documents are unique by identifier within a collection.
pub(crate) trait Store {
    /// The name of the logical database.
    fn database(&self) -> &str;

    /// Returns the names of all existing collections, sorted.
    fn collection_names(&self) -> DateprepResult<Vec<String>>;

    /// Returns the number of documents in a collection.
    fn count(&self, collection: &str) -> DateprepResult<usize>;

    /// Returns all documents of a collection, ordered by identifier.
    fn find(&self, collection: &str) -> DateprepResult<Vec<Document>>;

    /// Inserts or replaces the given documents, keyed by identifier.
    /// Either all documents are written or none.
    fn upsert(
        &mut self,
        collection: &str,
        docs: &[Document],
    ) -> DateprepResult<usize>;

    fn has_collection(&self, name: &str) -> DateprepResult<bool> {
        Ok(self.collection_names()?.iter().any(|c| c == name))
    }

    /// Fails with [DateprepError::MissingCollections] listing every
    /// required collection which doesn't exist.
    fn require<'a, I>(&self, required: I) -> DateprepResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let existing: BTreeSet<String> =
            self.collection_names()?.into_iter().collect();
        let missing: BTreeSet<&str> = required
            .into_iter()
            .filter(|name| !existing.contains(*name))
            .collect();

        if !missing.is_empty() {
            return Err(DateprepError::MissingCollections {
                database: self.database().into(),
                missing: missing.into_iter().map(String::from).collect(),
            });
        }

        Ok(())
    }
}
