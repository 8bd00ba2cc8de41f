mod clock;
mod memory;
mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::{InMemoryFinancialConfigStore, InMemoryRepository};
pub use repository::{
    Document, DocumentRepository, FinancialConfigStore, RecordId, RepositoryError,
};
