mod statement;
pub mod views;

pub use statement::{
    compose_statement, is_pre_system, tally_sales, SalesTally, StatementInputs, SERVICE_FEE_RATE,
};
pub use views::{DashboardStats, IncomeStatement};
