use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::agency::media::InMemoryMediaStore;
use crate::agency::records::{
    AgentId, CustomerUpdate, NewAgent, NewCustomer, NewProduct, ProductId, STATUS_CLOSED,
};
use crate::agency::service::{AgencyService, AgencyStores};
use crate::agency::store::{Clock, Document, DocumentRepository, ManualClock, RepositoryError};

/// Local wall-clock time, so window boundaries line up with the service's zone.
pub(super) fn at(y: i32, m: u32, d: u32, hour: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(y, m, d, hour, 0, 0)
        .earliest()
        .expect("valid local time")
        .with_timezone(&Utc)
}

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) struct Harness {
    pub(super) service: Arc<AgencyService>,
    pub(super) stores: AgencyStores,
    pub(super) clock: Arc<ManualClock>,
    pub(super) media: Arc<InMemoryMediaStore>,
}

pub(super) fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(at(2024, 1, 1, 9)));
    let media = Arc::new(InMemoryMediaStore::new("http://media.test/media", 4096));
    let stores = AgencyStores::in_memory(clock.clone() as Arc<dyn Clock>, media.clone());
    let service = Arc::new(AgencyService::new(stores.clone()));
    Harness {
        service,
        stores,
        clock,
        media,
    }
}

/// Service whose agent store is offline while the rest works.
pub(super) fn harness_with_offline_agents() -> Harness {
    let mut harness = harness();
    harness.stores.agents = Arc::new(UnavailableRepository);
    harness.service = Arc::new(AgencyService::new(harness.stores.clone()));
    harness
}

pub(super) fn new_agent(name: &str, rate: f64) -> NewAgent {
    NewAgent {
        name: name.to_string(),
        email: format!("{}@agency.test", name.to_ascii_lowercase()),
        commission_rate: Some(rate),
        ..NewAgent::default()
    }
}

pub(super) fn new_product(title: &str, price: f64, quantity: i64) -> NewProduct {
    NewProduct {
        title: title.to_string(),
        location: Some("Old Harbor".to_string()),
        price,
        quantity,
        vat_tax: Some(5_000.0),
        other_cost: Some(2_000.0),
        ..NewProduct::default()
    }
}

pub(super) fn new_customer(name: &str, agent: Option<&AgentId>) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        agent_id: agent.cloned(),
        ..NewCustomer::default()
    }
}

pub(super) fn closing(property: Option<&ProductId>) -> CustomerUpdate {
    CustomerUpdate {
        status: Some(STATUS_CLOSED.to_string()),
        property_id: property.cloned(),
        ..CustomerUpdate::default()
    }
}

pub(super) struct UnavailableRepository;

impl<D: Document> DocumentRepository<D> for UnavailableRepository {
    fn insert(&self, _draft: D) -> Result<D, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &D::Id) -> Result<Option<D>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find(&self, _filter: &dyn Fn(&D) -> bool) -> Result<Vec<D>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn modify(
        &self,
        _id: &D::Id,
        _change: &mut dyn FnMut(&mut D) -> bool,
    ) -> Result<Option<D>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &D::Id) -> Result<Option<D>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
