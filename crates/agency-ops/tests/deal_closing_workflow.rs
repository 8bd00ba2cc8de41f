//! End-to-end behavior of closing a deal through the public router and service
//! facade: agent credit, stock release, and tolerance of failing side effects.

mod common {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::response::Response;
    use chrono::{DateTime, Local, TimeZone, Utc};
    use serde_json::Value;

    use agency_ops::agency::store::{
        Clock, DocumentRepository, InMemoryRepository, ManualClock, RepositoryError,
    };
    use agency_ops::agency::{AgencyService, AgencyStores, InMemoryMediaStore, Product, ProductId};

    pub(super) fn at(y: i32, m: u32, d: u32, hour: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, hour, 0, 0)
            .earliest()
            .expect("valid local time")
            .with_timezone(&Utc)
    }

    pub(super) fn service_with(
        products: Option<Arc<dyn DocumentRepository<Product>>>,
    ) -> (Arc<AgencyService>, AgencyStores, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(at(2024, 3, 1, 9)));
        let media = Arc::new(InMemoryMediaStore::new("http://media.test/media", 4096));
        let mut stores = AgencyStores::in_memory(clock.clone() as Arc<dyn Clock>, media);
        if let Some(products) = products {
            stores.products = products;
        }
        (Arc::new(AgencyService::new(stores.clone())), stores, clock)
    }

    /// Product store whose writes fail while reads keep working.
    pub(super) struct ReadOnlyProducts {
        pub(super) inner: InMemoryRepository<Product>,
    }

    impl DocumentRepository<Product> for ReadOnlyProducts {
        fn insert(&self, draft: Product) -> Result<Product, RepositoryError> {
            self.inner.insert(draft)
        }

        fn fetch(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
            self.inner.fetch(id)
        }

        fn find(&self, filter: &dyn Fn(&Product) -> bool) -> Result<Vec<Product>, RepositoryError> {
            self.inner.find(filter)
        }

        fn modify(
            &self,
            _id: &ProductId,
            _change: &mut dyn FnMut(&mut Product) -> bool,
        ) -> Result<Option<Product>, RepositoryError> {
            Err(RepositoryError::Unavailable("inventory is read-only".to_string()))
        }

        fn delete(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
            self.inner.delete(id)
        }
    }

    pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    pub(super) fn get_request(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request builds")
    }

    pub(super) async fn read_json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }
}

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use agency_ops::agency::store::{Clock, DocumentRepository, InMemoryRepository, ManualClock};
use agency_ops::agency::{
    agency_router, CustomerUpdate, NewAgent, NewCustomer, NewProduct, Product,
};
use common::*;

#[tokio::test]
async fn closing_over_http_credits_the_agent_once_and_sells_the_last_unit() {
    let (service, _, clock) = service_with(None);
    let router = agency_router(service);

    let agent = read_json_body(
        router
            .clone()
            .oneshot(json_request(
                "POST",
                "/agents",
                json!({"name": "Avery", "email": "avery@agency.test", "commissionRate": 150}),
            ))
            .await
            .expect("agent route"),
    )
    .await;
    let product = read_json_body(
        router
            .clone()
            .oneshot(json_request(
                "POST",
                "/products",
                json!({"title": "Harbor Villa", "price": 500000, "quantity": 1}),
            ))
            .await
            .expect("product route"),
    )
    .await;
    let customer = read_json_body(
        router
            .clone()
            .oneshot(json_request(
                "POST",
                "/customers",
                json!({"name": "Lin", "agentId": agent["id"]}),
            ))
            .await
            .expect("customer route"),
    )
    .await;
    assert_eq!(customer["status"], "Lead");

    clock.set(at(2024, 3, 15, 14));
    let closing = json!({"status": "Closed", "propertyId": product["id"]});
    let customer_uri = format!("/customers/{}", customer["id"].as_str().expect("id"));
    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(json_request("PUT", &customer_uri, closing.clone()))
            .await
            .expect("update route");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let agent_uri = format!("/agents/{}", agent["id"].as_str().expect("id"));
    let agent = read_json_body(
        router
            .clone()
            .oneshot(get_request(&agent_uri))
            .await
            .expect("agent route"),
    )
    .await;
    assert_eq!(agent["salesCount"], 1);
    assert_eq!(agent["points"], 10);

    let product_uri = format!("/products/{}", product["id"].as_str().expect("id"));
    let product = read_json_body(
        router
            .oneshot(get_request(&product_uri))
            .await
            .expect("product route"),
    )
    .await;
    assert_eq!(product["quantity"], 0);
    assert_eq!(product["status"], "Sold");
}

#[test]
fn customer_is_saved_when_the_stock_update_fails() {
    let store_clock: Arc<dyn Clock> = Arc::new(ManualClock::new(at(2024, 3, 1, 9)));
    let products: Arc<dyn DocumentRepository<Product>> = Arc::new(ReadOnlyProducts {
        inner: InMemoryRepository::new(store_clock),
    });
    let (service, _, _) = service_with(Some(products));

    let agent = service
        .create_agent(NewAgent {
            name: "Blake".to_string(),
            email: "blake@agency.test".to_string(),
            ..NewAgent::default()
        })
        .expect("agent");
    let loft = service
        .create_product(NewProduct {
            title: "River Lofts 4B".to_string(),
            price: 240_000.0,
            quantity: 2,
            ..NewProduct::default()
        })
        .expect("product");
    let lead = service
        .create_customer(NewCustomer {
            name: "Morgan".to_string(),
            agent_id: Some(agent.id.clone()),
            ..NewCustomer::default()
        })
        .expect("customer");

    let saved = service
        .update_customer(
            &lead.id,
            CustomerUpdate {
                status: Some("Closed".to_string()),
                property_id: Some(loft.id.clone()),
                ..CustomerUpdate::default()
            },
        )
        .expect("update still succeeds");

    assert!(saved.is_closed());
    assert_eq!(saved.property_id.as_ref(), Some(&loft.id));
    assert_eq!(service.agent(&agent.id).expect("agent").points, 10);
    assert_eq!(service.product(&loft.id).expect("product").quantity, 2);
}

#[test]
fn closing_without_a_property_only_credits_the_agent() {
    let (service, _, _) = service_with(None);
    let agent = service
        .create_agent(NewAgent {
            name: "Casey".to_string(),
            email: "casey@agency.test".to_string(),
            ..NewAgent::default()
        })
        .expect("agent");
    let lead = service
        .create_customer(NewCustomer {
            name: "Rowan".to_string(),
            agent_id: Some(agent.id.clone()),
            ..NewCustomer::default()
        })
        .expect("customer");

    service
        .update_customer(
            &lead.id,
            CustomerUpdate {
                status: Some("Closed".to_string()),
                ..CustomerUpdate::default()
            },
        )
        .expect("update");

    let agent = service.agent(&agent.id).expect("agent");
    assert_eq!(agent.sales_count, 1);
    assert_eq!(agent.points, 10);
}
