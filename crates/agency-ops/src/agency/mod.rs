//! Real-estate agency operations: agents, customers, inventory, and the
//! period-scoped financial reports derived from them.
//!
//! Customer updates that move a lead into "Closed" credit the agent and take a
//! unit out of stock before the customer is saved. Reports never read stored
//! totals; revenue and commissions are recomputed from the closed deals that
//! fall inside the requested window.

pub mod closing;
pub mod commission;
pub mod financials;
pub mod import;
mod locks;
pub mod media;
pub mod records;
pub mod router;
pub mod service;
pub mod store;
pub mod window;

#[cfg(test)]
mod tests;

pub use closing::{apply_status_transition, execute_effects, EffectOutcome, PendingEffect};
pub use commission::{calculate_commissions, CommissionLine, CommissionSummary};
pub use financials::{DashboardStats, IncomeStatement};
pub use import::{ImportError, InventoryImporter};
pub use media::{InMemoryMediaStore, MediaError, MediaStore, StoredMedia};
pub use records::{
    Agent, AgentId, AgentPatch, ConfigRecord, ConfigView, Customer, CustomerId, CustomerUpdate,
    FinancialConfig, FinancialConfigPatch, NewAgent, NewCustomer, NewProduct, Product, ProductId,
    ProductPatch, SalesTarget,
};
pub use router::agency_router;
pub use service::{AgencyService, AgencyServiceError, AgencyStores};
pub use window::DateWindow;
