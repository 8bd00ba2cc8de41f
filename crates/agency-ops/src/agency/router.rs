use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use serde::Serialize;
use serde_json::json;

use super::media::MediaError;
use super::records::{
    AgentId, AgentPatch, CustomerId, CustomerUpdate, FinancialConfigPatch, NewAgent, NewCustomer,
    NewProduct, ProductId, ProductPatch, SalesTarget,
};
use super::service::{AgencyService, AgencyServiceError};
use super::store::RepositoryError;
use super::window::DateWindow;

/// Router exposing record management, deal closing, and financial reporting.
pub fn agency_router(service: Arc<AgencyService>) -> Router {
    Router::new()
        .route("/agents", get(list_agents_handler).post(create_agent_handler))
        .route(
            "/agents/:id",
            get(agent_handler)
                .put(update_agent_handler)
                .delete(delete_agent_handler),
        )
        .route("/agents/:id/targets", put(upsert_target_handler))
        .route(
            "/customers",
            get(list_customers_handler).post(create_customer_handler),
        )
        .route(
            "/customers/:id",
            get(customer_handler)
                .put(update_customer_handler)
                .delete(delete_customer_handler),
        )
        .route(
            "/products",
            get(list_products_handler).post(create_product_handler),
        )
        .route(
            "/products/:id",
            get(product_handler)
                .put(update_product_handler)
                .delete(delete_product_handler),
        )
        .route(
            "/financials/config",
            get(financial_config_handler).put(update_financial_config_handler),
        )
        .route("/financials/report", get(financial_report_handler))
        .route("/stats", get(stats_handler))
        .route("/media/:key", get(media_handler))
        .with_state(service)
}

type SharedService = State<Arc<AgencyService>>;

fn respond<T: Serialize>(status: StatusCode, result: Result<T, AgencyServiceError>) -> Response {
    match result {
        Ok(body) => (status, axum::Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

impl AgencyServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AgencyServiceError::NotFound { .. }
            | AgencyServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            AgencyServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AgencyServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            AgencyServiceError::Repository(RepositoryError::Unavailable(_))
            | AgencyServiceError::Media(MediaError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AgencyServiceError::Media(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AgencyServiceError {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.to_string(),
        });
        (self.status_code(), axum::Json(payload)).into_response()
    }
}

pub(crate) async fn list_agents_handler(
    State(service): SharedService,
    Query(window): Query<DateWindow>,
) -> Response {
    respond(StatusCode::OK, service.list_agents(&window))
}

pub(crate) async fn create_agent_handler(
    State(service): SharedService,
    axum::Json(input): axum::Json<NewAgent>,
) -> Response {
    respond(StatusCode::CREATED, service.create_agent(input))
}

pub(crate) async fn agent_handler(
    State(service): SharedService,
    Path(id): Path<String>,
) -> Response {
    respond(StatusCode::OK, service.agent(&AgentId(id)))
}

pub(crate) async fn update_agent_handler(
    State(service): SharedService,
    Path(id): Path<String>,
    axum::Json(patch): axum::Json<AgentPatch>,
) -> Response {
    respond(StatusCode::OK, service.update_agent(&AgentId(id), patch))
}

pub(crate) async fn delete_agent_handler(
    State(service): SharedService,
    Path(id): Path<String>,
) -> Response {
    respond(StatusCode::OK, service.delete_agent(&AgentId(id)))
}

pub(crate) async fn upsert_target_handler(
    State(service): SharedService,
    Path(id): Path<String>,
    axum::Json(target): axum::Json<SalesTarget>,
) -> Response {
    respond(StatusCode::OK, service.upsert_target(&AgentId(id), target))
}

pub(crate) async fn list_customers_handler(
    State(service): SharedService,
    Query(window): Query<DateWindow>,
) -> Response {
    respond(StatusCode::OK, service.list_customers(&window))
}

pub(crate) async fn create_customer_handler(
    State(service): SharedService,
    axum::Json(input): axum::Json<NewCustomer>,
) -> Response {
    respond(StatusCode::CREATED, service.create_customer(input))
}

pub(crate) async fn customer_handler(
    State(service): SharedService,
    Path(id): Path<String>,
) -> Response {
    respond(StatusCode::OK, service.customer(&CustomerId(id)))
}

pub(crate) async fn update_customer_handler(
    State(service): SharedService,
    Path(id): Path<String>,
    axum::Json(update): axum::Json<CustomerUpdate>,
) -> Response {
    respond(
        StatusCode::OK,
        service.update_customer(&CustomerId(id), update),
    )
}

pub(crate) async fn delete_customer_handler(
    State(service): SharedService,
    Path(id): Path<String>,
) -> Response {
    respond(StatusCode::OK, service.delete_customer(&CustomerId(id)))
}

pub(crate) async fn list_products_handler(
    State(service): SharedService,
    Query(window): Query<DateWindow>,
) -> Response {
    respond(StatusCode::OK, service.list_products(&window))
}

pub(crate) async fn create_product_handler(
    State(service): SharedService,
    axum::Json(input): axum::Json<NewProduct>,
) -> Response {
    respond(StatusCode::CREATED, service.create_product(input))
}

pub(crate) async fn product_handler(
    State(service): SharedService,
    Path(id): Path<String>,
) -> Response {
    respond(StatusCode::OK, service.product(&ProductId(id)))
}

pub(crate) async fn update_product_handler(
    State(service): SharedService,
    Path(id): Path<String>,
    axum::Json(patch): axum::Json<ProductPatch>,
) -> Response {
    respond(StatusCode::OK, service.update_product(&ProductId(id), patch))
}

pub(crate) async fn delete_product_handler(
    State(service): SharedService,
    Path(id): Path<String>,
) -> Response {
    respond(StatusCode::OK, service.delete_product(&ProductId(id)))
}

pub(crate) async fn financial_config_handler(
    State(service): SharedService,
    Query(window): Query<DateWindow>,
) -> Response {
    respond(StatusCode::OK, service.financial_config(&window))
}

pub(crate) async fn update_financial_config_handler(
    State(service): SharedService,
    axum::Json(patch): axum::Json<FinancialConfigPatch>,
) -> Response {
    respond(StatusCode::OK, service.update_financial_config(&patch))
}

pub(crate) async fn financial_report_handler(
    State(service): SharedService,
    Query(window): Query<DateWindow>,
) -> Response {
    respond(StatusCode::OK, service.income_statement(&window))
}

pub(crate) async fn stats_handler(
    State(service): SharedService,
    Query(window): Query<DateWindow>,
) -> Response {
    respond(StatusCode::OK, service.dashboard_stats(&window))
}

pub(crate) async fn media_handler(
    State(service): SharedService,
    Path(key): Path<String>,
) -> Response {
    match service.media_object(&key) {
        Ok(media) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, media.content_type.to_string())],
            media.bytes,
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
