use chrono::{DateTime, Utc};
use serde::Serialize;

use super::super::commission::CommissionLine;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldProduct {
    pub title: String,
    pub price: f64,
    /// When the deal closed.
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub vat_tax: f64,
    pub other_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCost {
    pub title: String,
    pub cost: f64,
    pub breakdown: CostBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeDetails {
    pub sold_products: Vec<SoldProduct>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSection {
    pub sales_revenue: f64,
    pub service_revenue: f64,
    pub interest_income: f64,
    pub other_income: f64,
    pub total_income: f64,
    pub details: IncomeDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDetails {
    pub base_salaries: f64,
    pub commissions: Vec<CommissionLine>,
    pub total_commissions: f64,
    pub property_costs: Vec<PropertyCost>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSection {
    pub total_salaries: f64,
    pub operating_expenses: f64,
    pub depreciation: f64,
    pub taxes: f64,
    pub total_property_transaction_costs: f64,
    pub total_expenses: f64,
    pub details: ExpenseDetails,
}

/// Profit-and-loss statement for one reporting window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    pub income: IncomeSection,
    pub expenses: ExpenseSection,
    pub net_profit_loss: f64,
}

impl IncomeStatement {
    /// Every amount 0 and every detail list empty.
    pub fn zeroed() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_sales: f64,
    pub active_listings: usize,
    pub total_customers: usize,
    pub total_agents: usize,
}
