use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info};

use super::closing::{apply_status_transition, execute_effects, EffectOutcome};
use super::commission::calculate_commissions;
use super::financials::{
    compose_statement, is_pre_system, tally_sales, DashboardStats, IncomeStatement,
    StatementInputs,
};
use super::locks::KeyedLocks;
use super::media::{upload_image, upload_images, MediaError, MediaStore, StoredMedia};
use super::records::{
    Agent, AgentId, AgentPatch, ConfigRecord, ConfigView, Customer, CustomerId, CustomerUpdate,
    FinancialConfigPatch, NewAgent, NewCustomer, NewProduct, Product, ProductId, ProductPatch,
    SalesTarget,
};
use super::store::{
    Clock, DocumentRepository, FinancialConfigStore, InMemoryFinancialConfigStore,
    InMemoryRepository, RepositoryError,
};
use super::window::DateWindow;

/// Storage collaborators the service is built from.
#[derive(Clone)]
pub struct AgencyStores {
    pub agents: Arc<dyn DocumentRepository<Agent>>,
    pub customers: Arc<dyn DocumentRepository<Customer>>,
    pub products: Arc<dyn DocumentRepository<Product>>,
    pub config: Arc<dyn FinancialConfigStore>,
    pub media: Arc<dyn MediaStore>,
}

impl AgencyStores {
    /// Process-local stores sharing one clock.
    pub fn in_memory(clock: Arc<dyn Clock>, media: Arc<dyn MediaStore>) -> Self {
        Self {
            agents: Arc::new(InMemoryRepository::new(Arc::clone(&clock))),
            customers: Arc::new(InMemoryRepository::new(Arc::clone(&clock))),
            products: Arc::new(InMemoryRepository::new(Arc::clone(&clock))),
            config: Arc::new(InMemoryFinancialConfigStore::new(clock)),
            media,
        }
    }
}

/// Agency operations facade: record management, deal closing, and reporting.
///
/// Calendar dates in reporting windows are read in the host's local time zone.
pub struct AgencyService {
    stores: AgencyStores,
    customer_locks: KeyedLocks<CustomerId>,
}

impl AgencyService {
    pub fn new(stores: AgencyStores) -> Self {
        Self {
            stores,
            customer_locks: KeyedLocks::default(),
        }
    }

    pub fn list_agents(&self, window: &DateWindow) -> Result<Vec<Agent>, AgencyServiceError> {
        let predicate = window.predicate_in(&Local);
        Ok(self
            .stores
            .agents
            .find(&|agent| predicate.matches(agent.created_at))?)
    }

    pub fn create_agent(&self, mut input: NewAgent) -> Result<Agent, AgencyServiceError> {
        require("name", &input.name)?;
        require("email", &input.email)?;
        input.image = upload_image(self.stores.media.as_ref(), input.image.as_deref());
        Ok(self.stores.agents.insert(Agent::draft(input))?)
    }

    pub fn agent(&self, id: &AgentId) -> Result<Agent, AgencyServiceError> {
        self.stores
            .agents
            .fetch(id)?
            .ok_or_else(|| not_found("agent", id))
    }

    pub fn update_agent(
        &self,
        id: &AgentId,
        patch: AgentPatch,
    ) -> Result<Agent, AgencyServiceError> {
        let image = patch
            .image
            .as_deref()
            .map(|payload| upload_image(self.stores.media.as_ref(), Some(payload)));

        self.stores
            .agents
            .modify(id, &mut |agent| {
                patch.apply_to(agent);
                if let Some(image) = &image {
                    agent.image = image.clone();
                }
                true
            })?
            .ok_or_else(|| not_found("agent", id))
    }

    pub fn delete_agent(&self, id: &AgentId) -> Result<Agent, AgencyServiceError> {
        self.stores
            .agents
            .delete(id)?
            .ok_or_else(|| not_found("agent", id))
    }

    /// Set the goal for one period, replacing any goal declared for the same dates.
    pub fn upsert_target(
        &self,
        id: &AgentId,
        target: SalesTarget,
    ) -> Result<Agent, AgencyServiceError> {
        if target.end_date < target.start_date {
            return Err(AgencyServiceError::InvalidRequest(
                "target endDate must not precede startDate".to_string(),
            ));
        }
        self.stores
            .agents
            .modify(id, &mut |agent| {
                agent.upsert_target(target.clone());
                true
            })?
            .ok_or_else(|| not_found("agent", id))
    }

    pub fn list_customers(&self, window: &DateWindow) -> Result<Vec<Customer>, AgencyServiceError> {
        let predicate = window.predicate_in(&Local);
        Ok(self
            .stores
            .customers
            .find(&|customer| predicate.matches(customer.created_at))?)
    }

    pub fn create_customer(&self, input: NewCustomer) -> Result<Customer, AgencyServiceError> {
        require("name", &input.name)?;
        Ok(self.stores.customers.insert(Customer::draft(input))?)
    }

    pub fn customer(&self, id: &CustomerId) -> Result<Customer, AgencyServiceError> {
        self.stores
            .customers
            .fetch(id)?
            .ok_or_else(|| not_found("customer", id))
    }

    /// Apply `update` to a customer. Moving into "Closed" first credits the
    /// agent and releases one unit of the referenced property; those effects
    /// are best-effort and never fail the update. Updates to the same customer
    /// are serialized so a close is credited once.
    pub fn update_customer(
        &self,
        id: &CustomerId,
        update: CustomerUpdate,
    ) -> Result<Customer, AgencyServiceError> {
        self.customer_locks.run(id, || -> Result<Customer, AgencyServiceError> {
            let previous = self.customer(id)?;
            let transition = apply_status_transition(&previous, &update);

            if transition.closes_deal {
                let outcomes = execute_effects(
                    &transition.effects,
                    self.stores.agents.as_ref(),
                    self.stores.products.as_ref(),
                );
                let applied = outcomes
                    .iter()
                    .filter(|(_, outcome)| *outcome == EffectOutcome::Applied)
                    .count();
                info!(
                    customer = %id,
                    previous_status = %previous.status,
                    effects = outcomes.len(),
                    applied,
                    "deal closed"
                );
            } else {
                debug!(customer = %id, "customer update without closing transition");
            }

            self.stores
                .customers
                .modify(id, &mut |customer| {
                    update.apply_to(customer);
                    true
                })?
                .ok_or_else(|| not_found("customer", id))
        })
    }

    pub fn delete_customer(&self, id: &CustomerId) -> Result<Customer, AgencyServiceError> {
        self.stores
            .customers
            .delete(id)?
            .ok_or_else(|| not_found("customer", id))
    }

    pub fn list_products(&self, window: &DateWindow) -> Result<Vec<Product>, AgencyServiceError> {
        let predicate = window.predicate_in(&Local);
        Ok(self
            .stores
            .products
            .find(&|product| predicate.matches(product.created_at))?)
    }

    pub fn create_product(&self, input: NewProduct) -> Result<Product, AgencyServiceError> {
        require("title", &input.title)?;
        let quantity = checked_quantity(input.quantity)?;
        let images = upload_images(self.stores.media.as_ref(), &input.images);
        Ok(self
            .stores
            .products
            .insert(Product::draft(&input, quantity, images))?)
    }

    pub fn product(&self, id: &ProductId) -> Result<Product, AgencyServiceError> {
        self.stores
            .products
            .fetch(id)?
            .ok_or_else(|| not_found("product", id))
    }

    pub fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, AgencyServiceError> {
        let quantity = patch.quantity.map(checked_quantity).transpose()?;
        let images = patch
            .images
            .as_deref()
            .map(|payloads| upload_images(self.stores.media.as_ref(), payloads));

        self.stores
            .products
            .modify(id, &mut |product| {
                patch.apply_to(product);
                if let Some(quantity) = quantity {
                    product.quantity = quantity;
                }
                if let Some(images) = &images {
                    product.images = images.clone();
                }
                product.normalize_status();
                true
            })?
            .ok_or_else(|| not_found("product", id))
    }

    pub fn delete_product(&self, id: &ProductId) -> Result<Product, AgencyServiceError> {
        self.stores
            .products
            .delete(id)?
            .ok_or_else(|| not_found("product", id))
    }

    /// The configuration singleton, created on first read. Windows ending
    /// before the first agent existed see an all-zero view instead.
    pub fn financial_config(
        &self,
        window: &DateWindow,
    ) -> Result<ConfigView, AgencyServiceError> {
        let record = self.stores.config.get_or_create()?;
        let agents = self.stores.agents.all()?;
        if is_pre_system(window, &agents, &Local) {
            return Ok(ConfigView::zeroed());
        }
        Ok(record.into())
    }

    pub fn update_financial_config(
        &self,
        patch: &FinancialConfigPatch,
    ) -> Result<ConfigRecord, AgencyServiceError> {
        let record = self.stores.config.upsert(patch)?;
        info!(
            operating_expenses = record.lines.operating_expenses(),
            base_salaries = record.lines.base_salaries,
            "financial configuration updated"
        );
        Ok(record)
    }

    /// Profit-and-loss statement re-derived from current records. Never writes.
    pub fn income_statement(
        &self,
        window: &DateWindow,
    ) -> Result<IncomeStatement, AgencyServiceError> {
        let config = self
            .stores
            .config
            .load()?
            .map(|record| record.lines)
            .unwrap_or_default();

        let all_agents = self.stores.agents.all()?;
        let pre_system = is_pre_system(window, &all_agents, &Local);

        let closed_deals = self.closed_deals(window)?;
        let sales = tally_sales(&closed_deals, |id| self.stores.products.fetch(id))?;

        let existence = window.existence_predicate_in(&Local);
        let agents: Vec<Agent> = all_agents
            .into_iter()
            .filter(|agent| existence.matches(agent.created_at))
            .collect();
        let commissions = calculate_commissions(&agents, &closed_deals);

        debug!(
            closed_deals = closed_deals.len(),
            agents = agents.len(),
            pre_system,
            "composing income statement"
        );

        Ok(compose_statement(StatementInputs {
            config,
            pre_system,
            sales,
            commissions,
        }))
    }

    /// Headline numbers for the dashboard. `total_sales` is the sales revenue
    /// of the window's closed deals.
    pub fn dashboard_stats(
        &self,
        window: &DateWindow,
    ) -> Result<DashboardStats, AgencyServiceError> {
        let closed_deals = self.closed_deals(window)?;
        let sales = tally_sales(&closed_deals, |id| self.stores.products.fetch(id))?;

        let existence = window.existence_predicate_in(&Local);
        let created = window.predicate_in(&Local);

        Ok(DashboardStats {
            total_sales: sales.revenue,
            active_listings: self.stores.products.count(&|product| {
                existence.matches(product.created_at) && product.is_listed()
            })?,
            total_customers: self
                .stores
                .customers
                .count(&|customer| created.matches(customer.created_at))?,
            total_agents: self
                .stores
                .agents
                .count(&|agent| existence.matches(agent.created_at))?,
        })
    }

    pub fn media_object(&self, key: &str) -> Result<StoredMedia, AgencyServiceError> {
        self.stores
            .media
            .fetch(key)?
            .ok_or_else(|| AgencyServiceError::NotFound {
                entity: "media",
                id: key.to_string(),
            })
    }

    fn closed_deals(&self, window: &DateWindow) -> Result<Vec<Customer>, RepositoryError> {
        let range = window.range_predicate_in(&Local);
        self.stores
            .customers
            .find(&|customer| customer.is_closed() && range.matches(customer.updated_at))
    }
}

fn require(field: &str, value: &str) -> Result<(), AgencyServiceError> {
    if value.trim().is_empty() {
        return Err(AgencyServiceError::InvalidRequest(format!(
            "{field} is required"
        )));
    }
    Ok(())
}

fn checked_quantity(quantity: i64) -> Result<u32, AgencyServiceError> {
    u32::try_from(quantity).map_err(|_| {
        AgencyServiceError::InvalidRequest(format!(
            "quantity must be between 0 and {}, got {quantity}",
            u32::MAX
        ))
    })
}

fn not_found(entity: &'static str, id: &impl std::fmt::Display) -> AgencyServiceError {
    AgencyServiceError::NotFound {
        entity,
        id: id.to_string(),
    }
}

/// Error raised by the agency service.
#[derive(Debug, thiserror::Error)]
pub enum AgencyServiceError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Media(#[from] MediaError),
}
