use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, Utc};

use super::super::records::{ConfigRecord, FinancialConfigPatch};

/// Identifier types the document store knows how to mint.
pub trait RecordId: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static {
    fn generate() -> Self;
}

/// A record kept by a [`DocumentRepository`]. The store owns the identifier and
/// both timestamps; callers never set them directly.
pub trait Document: Clone + Send + Sync + 'static {
    type Id: RecordId;

    fn id(&self) -> &Self::Id;
    fn created_at(&self) -> DateTime<Utc>;
    fn stamp_created(&mut self, id: Self::Id, at: DateTime<Utc>);
    fn stamp_updated(&mut self, at: DateTime<Utc>);
}

/// Generic document storage with server-assigned ids and automatic timestamps.
pub trait DocumentRepository<D: Document>: Send + Sync {
    /// Persist a draft, assigning a fresh identifier and creation time.
    fn insert(&self, draft: D) -> Result<D, RepositoryError>;

    fn fetch(&self, id: &D::Id) -> Result<Option<D>, RepositoryError>;

    /// Records matching `filter`, in creation order.
    fn find(&self, filter: &dyn Fn(&D) -> bool) -> Result<Vec<D>, RepositoryError>;

    /// Read-modify-write under the store's own lock. `change` returns whether it
    /// altered the record; only altered records get a new `updated_at`.
    /// Returns `None` when the id is unknown.
    fn modify(
        &self,
        id: &D::Id,
        change: &mut dyn FnMut(&mut D) -> bool,
    ) -> Result<Option<D>, RepositoryError>;

    fn delete(&self, id: &D::Id) -> Result<Option<D>, RepositoryError>;

    fn all(&self) -> Result<Vec<D>, RepositoryError> {
        self.find(&|_| true)
    }

    fn count(&self, filter: &dyn Fn(&D) -> bool) -> Result<usize, RepositoryError> {
        self.find(filter).map(|records| records.len())
    }
}

/// Single-slot storage for the agency's fixed income and cost lines.
pub trait FinancialConfigStore: Send + Sync {
    /// Current record without creating one.
    fn load(&self) -> Result<Option<ConfigRecord>, RepositoryError>;

    /// Current record, materializing an all-zero one on first access.
    fn get_or_create(&self) -> Result<ConfigRecord, RepositoryError>;

    /// Apply `patch` to the record, creating it first if absent.
    fn upsert(&self, patch: &FinancialConfigPatch) -> Result<ConfigRecord, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
