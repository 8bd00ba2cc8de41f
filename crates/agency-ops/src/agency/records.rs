use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::{Document, RecordId};

/// The only customer status with side effects.
pub const STATUS_CLOSED: &str = "Closed";
pub const STATUS_LEAD: &str = "Lead";
pub const PRODUCT_AVAILABLE: &str = "Available";
pub const PRODUCT_SOLD: &str = "Sold";

pub const DEFAULT_COMMISSION_RATE: f64 = 100.0;
/// Performance points credited to an agent per closed deal.
pub const POINTS_PER_DEAL: u32 = 10;

macro_rules! record_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl RecordId for $name {
            fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

record_id!(AgentId);
record_id!(CustomerId);
record_id!(ProductId);

macro_rules! document {
    ($record:ty, $id:ty) => {
        impl Document for $record {
            type Id = $id;

            fn id(&self) -> &$id {
                &self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn stamp_created(&mut self, id: $id, at: DateTime<Utc>) {
                self.id = id;
                self.created_at = at;
                self.updated_at = at;
            }

            fn stamp_updated(&mut self, at: DateTime<Utc>) {
                self.updated_at = at;
            }
        }
    };
}

document!(Agent, AgentId);
document!(Customer, CustomerId);
document!(Product, ProductId);

/// Sales goal for one declared period. Unique per (start, end) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesTarget {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub target: f64,
}

impl SalesTarget {
    fn same_period(&self, other: &SalesTarget) -> bool {
        self.start_date == other.start_date && self.end_date == other.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Commission per closed deal, as a percentage-style multiplier.
    pub commission_rate: f64,
    /// Lifetime closed deals. Reports recompute per window instead of reading this.
    pub sales_count: u32,
    /// Lifetime points. Reports recompute per window instead of reading this.
    pub points: u32,
    pub active: bool,
    #[serde(default)]
    pub targets: Vec<SalesTarget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    pub fn draft(input: NewAgent) -> Self {
        Self {
            id: AgentId::default(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            image: input.image,
            commission_rate: input.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE),
            sales_count: 0,
            points: 0,
            active: input.active.unwrap_or(true),
            targets: Vec::new(),
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    /// Credit one closed deal to the lifetime counters.
    pub fn record_closed_deal(&mut self) {
        self.points = self.points.saturating_add(POINTS_PER_DEAL);
        self.sales_count = self.sales_count.saturating_add(1);
    }

    /// Replace the target declared for the same period, otherwise append.
    pub fn upsert_target(&mut self, target: SalesTarget) {
        match self
            .targets
            .iter_mut()
            .find(|existing| existing.same_period(&target))
        {
            Some(existing) => existing.target = target.target,
            None => self.targets.push(target),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgent {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Base64 payload, data URL, or existing URL.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub commission_rate: Option<f64>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub commission_rate: Option<f64>,
    pub active: Option<bool>,
}

impl AgentPatch {
    pub fn apply_to(&self, agent: &mut Agent) {
        if let Some(name) = &self.name {
            agent.name = name.clone();
        }
        if let Some(email) = &self.email {
            agent.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            agent.phone = Some(phone.clone());
        }
        if let Some(image) = &self.image {
            agent.image = Some(image.clone());
        }
        if let Some(rate) = self.commission_rate {
            agent.commission_rate = rate;
        }
        if let Some(active) = self.active {
            agent.active = active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: String,
    #[serde(default)]
    pub agent_id: Option<AgentId>,
    #[serde(default)]
    pub property_id: Option<ProductId>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Doubles as the deal-closing date once the status is "Closed".
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn draft(input: NewCustomer) -> Self {
        Self {
            id: CustomerId::default(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            status: input.status.unwrap_or_else(|| STATUS_LEAD.to_string()),
            agent_id: input.agent_id,
            property_id: input.property_id,
            notes: input.notes,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == STATUS_CLOSED
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub agent_id: Option<AgentId>,
    #[serde(default)]
    pub property_id: Option<ProductId>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `PUT /customers/{id}`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub agent_id: Option<AgentId>,
    pub property_id: Option<ProductId>,
    pub notes: Option<String>,
}

impl CustomerUpdate {
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(email) = &self.email {
            customer.email = Some(email.clone());
        }
        if let Some(phone) = &self.phone {
            customer.phone = Some(phone.clone());
        }
        if let Some(status) = &self.status {
            customer.status = status.clone();
        }
        if let Some(agent_id) = &self.agent_id {
            customer.agent_id = Some(agent_id.clone());
        }
        if let Some(property_id) = &self.property_id {
            customer.property_id = Some(property_id.clone());
        }
        if let Some(notes) = &self.notes {
            customer.notes = Some(notes.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub price: f64,
    pub quantity: u32,
    pub status: String,
    pub vat_tax: f64,
    pub other_cost: f64,
    /// Hosted image URLs; `None` marks an upload that failed.
    #[serde(default)]
    pub images: Vec<Option<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn draft(input: &NewProduct, quantity: u32, images: Vec<Option<String>>) -> Self {
        let mut product = Self {
            id: ProductId::default(),
            title: input.title.clone(),
            description: input.description.clone(),
            location: input.location.clone(),
            price: input.price,
            quantity,
            status: input
                .status
                .clone()
                .unwrap_or_else(|| PRODUCT_AVAILABLE.to_string()),
            vat_tax: input.vat_tax.unwrap_or_default(),
            other_cost: input.other_cost.unwrap_or_default(),
            images,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        };
        product.normalize_status();
        product
    }

    /// Costs borne by the agency when this property changes hands.
    pub fn transaction_cost(&self) -> f64 {
        self.vat_tax + self.other_cost
    }

    /// Take one unit for a closed deal. Returns `false` when none are left.
    pub fn take_unit(&mut self) -> bool {
        if self.quantity == 0 {
            return false;
        }
        self.quantity -= 1;
        if self.quantity == 0 {
            self.status = PRODUCT_SOLD.to_string();
        }
        true
    }

    /// Zero stock forces "Sold"; restocking a "Sold" product makes it "Available".
    pub fn normalize_status(&mut self) {
        if self.quantity == 0 {
            self.status = PRODUCT_SOLD.to_string();
        } else if self.status == PRODUCT_SOLD {
            self.status = PRODUCT_AVAILABLE.to_string();
        }
    }

    /// Counts toward the dashboard's active listings.
    pub fn is_listed(&self) -> bool {
        self.status == PRODUCT_AVAILABLE || self.quantity > 0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub price: f64,
    /// Signed so negative input can be rejected with a clear message.
    pub quantity: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vat_tax: Option<f64>,
    #[serde(default)]
    pub other_cost: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub status: Option<String>,
    pub vat_tax: Option<f64>,
    pub other_cost: Option<f64>,
    pub images: Option<Vec<String>>,
}

impl ProductPatch {
    /// Copy the plain fields. Quantity and images need validation or upload
    /// first and are applied by the caller.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.title = title.clone();
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            product.location = Some(location.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(status) = &self.status {
            product.status = status.clone();
        }
        if let Some(vat_tax) = self.vat_tax {
            product.vat_tax = vat_tax;
        }
        if let Some(other_cost) = self.other_cost {
            product.other_cost = other_cost;
        }
    }
}

/// Fixed income and cost lines used by every report. All amounts default to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialConfig {
    pub interest_income: f64,
    pub other_income: f64,
    pub rent: f64,
    pub utilities: f64,
    pub supplies: f64,
    pub marketing: f64,
    pub insurance: f64,
    pub maintenance: f64,
    pub misc: f64,
    pub base_salaries: f64,
    pub depreciation: f64,
    pub taxes: f64,
}

impl FinancialConfig {
    pub fn operating_expenses(&self) -> f64 {
        self.rent
            + self.utilities
            + self.supplies
            + self.marketing
            + self.insurance
            + self.maintenance
            + self.misc
    }
}

/// Partial update of [`FinancialConfig`]; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialConfigPatch {
    pub interest_income: Option<f64>,
    pub other_income: Option<f64>,
    pub rent: Option<f64>,
    pub utilities: Option<f64>,
    pub supplies: Option<f64>,
    pub marketing: Option<f64>,
    pub insurance: Option<f64>,
    pub maintenance: Option<f64>,
    pub misc: Option<f64>,
    pub base_salaries: Option<f64>,
    pub depreciation: Option<f64>,
    pub taxes: Option<f64>,
}

impl FinancialConfigPatch {
    pub fn apply(&self, lines: &mut FinancialConfig) {
        let pairs = [
            (self.interest_income, &mut lines.interest_income),
            (self.other_income, &mut lines.other_income),
            (self.rent, &mut lines.rent),
            (self.utilities, &mut lines.utilities),
            (self.supplies, &mut lines.supplies),
            (self.marketing, &mut lines.marketing),
            (self.insurance, &mut lines.insurance),
            (self.maintenance, &mut lines.maintenance),
            (self.misc, &mut lines.misc),
            (self.base_salaries, &mut lines.base_salaries),
            (self.depreciation, &mut lines.depreciation),
            (self.taxes, &mut lines.taxes),
        ];
        for (value, slot) in pairs {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// The persisted configuration singleton.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRecord {
    #[serde(flatten)]
    pub lines: FinancialConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConfigRecord {
    pub fn created(lines: FinancialConfig, at: DateTime<Utc>) -> Self {
        Self {
            lines,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Response shape of `GET /financials/config`; timestamps are omitted for the
/// zeroed pre-system view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView {
    #[serde(flatten)]
    pub lines: FinancialConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ConfigView {
    pub fn zeroed() -> Self {
        Self {
            lines: FinancialConfig::default(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<ConfigRecord> for ConfigView {
    fn from(record: ConfigRecord) -> Self {
        Self {
            lines: record.lines,
            created_at: Some(record.created_at),
            updated_at: Some(record.updated_at),
        }
    }
}
