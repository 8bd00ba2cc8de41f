use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::super::records::{ConfigRecord, FinancialConfig, FinancialConfigPatch};
use super::clock::Clock;
use super::repository::{
    Document, DocumentRepository, FinancialConfigStore, RecordId, RepositoryError,
};

/// Process-local document store. Records are kept in creation order.
pub struct InMemoryRepository<D: Document> {
    records: Mutex<Vec<D>>,
    clock: Arc<dyn Clock>,
}

impl<D: Document> InMemoryRepository<D> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            clock,
        }
    }

    fn guard(&self) -> MutexGuard<'_, Vec<D>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D: Document> fmt::Debug for InMemoryRepository<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("records", &self.guard().len())
            .finish_non_exhaustive()
    }
}

impl<D: Document> DocumentRepository<D> for InMemoryRepository<D> {
    fn insert(&self, mut draft: D) -> Result<D, RepositoryError> {
        let mut guard = self.guard();
        let id = D::Id::generate();
        if guard.iter().any(|record| record.id() == &id) {
            return Err(RepositoryError::Conflict);
        }
        draft.stamp_created(id, self.clock.now());
        guard.push(draft.clone());
        Ok(draft)
    }

    fn fetch(&self, id: &D::Id) -> Result<Option<D>, RepositoryError> {
        Ok(self
            .guard()
            .iter()
            .find(|record| record.id() == id)
            .cloned())
    }

    fn find(&self, filter: &dyn Fn(&D) -> bool) -> Result<Vec<D>, RepositoryError> {
        Ok(self
            .guard()
            .iter()
            .filter(|record| filter(record))
            .cloned()
            .collect())
    }

    fn modify(
        &self,
        id: &D::Id,
        change: &mut dyn FnMut(&mut D) -> bool,
    ) -> Result<Option<D>, RepositoryError> {
        let mut guard = self.guard();
        let Some(record) = guard.iter_mut().find(|record| record.id() == id) else {
            return Ok(None);
        };
        if change(record) {
            record.stamp_updated(self.clock.now());
        }
        Ok(Some(record.clone()))
    }

    fn delete(&self, id: &D::Id) -> Result<Option<D>, RepositoryError> {
        let mut guard = self.guard();
        let position = guard.iter().position(|record| record.id() == id);
        Ok(position.map(|index| guard.remove(index)))
    }
}

/// Process-local slot for the financial configuration singleton.
#[derive(Debug)]
pub struct InMemoryFinancialConfigStore {
    slot: Mutex<Option<ConfigRecord>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryFinancialConfigStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(None),
            clock,
        }
    }

    fn guard(&self) -> MutexGuard<'_, Option<ConfigRecord>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FinancialConfigStore for InMemoryFinancialConfigStore {
    fn load(&self) -> Result<Option<ConfigRecord>, RepositoryError> {
        Ok(self.guard().clone())
    }

    fn get_or_create(&self) -> Result<ConfigRecord, RepositoryError> {
        let mut guard = self.guard();
        let record = guard.get_or_insert_with(|| {
            ConfigRecord::created(FinancialConfig::default(), self.clock.now())
        });
        Ok(record.clone())
    }

    fn upsert(&self, patch: &FinancialConfigPatch) -> Result<ConfigRecord, RepositoryError> {
        let now = self.clock.now();
        let mut guard = self.guard();
        let record =
            guard.get_or_insert_with(|| ConfigRecord::created(FinancialConfig::default(), now));
        patch.apply(&mut record.lines);
        record.updated_at = now;
        Ok(record.clone())
    }
}
