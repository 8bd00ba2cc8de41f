use chrono::TimeZone;

use super::super::commission::CommissionSummary;
use super::super::records::{Agent, Customer, FinancialConfig, Product, ProductId};
use super::super::window::DateWindow;
use super::views::{
    CostBreakdown, ExpenseDetails, ExpenseSection, IncomeDetails, IncomeSection, IncomeStatement,
    PropertyCost, SoldProduct,
};

/// Agency service fee charged on every sale. Not configurable.
pub const SERVICE_FEE_RATE: f64 = 0.03;

/// Revenue and transaction costs of the closed deals in a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesTally {
    pub revenue: f64,
    pub transaction_costs: f64,
    pub sold_products: Vec<SoldProduct>,
    pub property_costs: Vec<PropertyCost>,
}

/// Sum sale prices and transaction costs over `closed_deals`. Deals without a
/// property, or whose property `lookup` cannot resolve, are skipped.
pub fn tally_sales<F, E>(closed_deals: &[Customer], mut lookup: F) -> Result<SalesTally, E>
where
    F: FnMut(&ProductId) -> Result<Option<Product>, E>,
{
    let mut tally = SalesTally::default();

    for deal in closed_deals {
        let Some(property_id) = &deal.property_id else {
            continue;
        };
        let Some(product) = lookup(property_id)? else {
            continue;
        };

        tally.revenue += product.price;
        tally.sold_products.push(SoldProduct {
            title: product.title.clone(),
            price: product.price,
            date: deal.updated_at,
        });

        let cost = product.transaction_cost();
        tally.transaction_costs += cost;
        tally.property_costs.push(PropertyCost {
            title: product.title,
            cost,
            breakdown: CostBreakdown {
                vat_tax: product.vat_tax,
                other_cost: product.other_cost,
            },
        });
    }

    Ok(tally)
}

/// The window ends before the first agent was created.
pub fn is_pre_system<Tz: TimeZone>(window: &DateWindow, agents: &[Agent], tz: &Tz) -> bool {
    let Some(end) = window.end_bound_in(tz) else {
        return false;
    };
    agents
        .iter()
        .map(|agent| agent.created_at)
        .min()
        .is_some_and(|first_agent| end < first_agent)
}

#[derive(Debug, Clone)]
pub struct StatementInputs {
    pub config: FinancialConfig,
    pub pre_system: bool,
    pub sales: SalesTally,
    pub commissions: CommissionSummary,
}

pub fn compose_statement(inputs: StatementInputs) -> IncomeStatement {
    let StatementInputs {
        config,
        pre_system,
        sales,
        commissions,
    } = inputs;

    if pre_system && sales.revenue == 0.0 {
        return IncomeStatement::zeroed();
    }
    let config = if pre_system {
        FinancialConfig::default()
    } else {
        config
    };

    let service_revenue = sales.revenue * SERVICE_FEE_RATE;
    let total_income =
        sales.revenue + service_revenue + config.interest_income + config.other_income;

    let total_salaries = config.base_salaries + commissions.total;
    let operating_expenses = config.operating_expenses();
    let total_expenses = total_salaries
        + operating_expenses
        + config.depreciation
        + config.taxes
        + sales.transaction_costs;

    IncomeStatement {
        income: IncomeSection {
            sales_revenue: sales.revenue,
            service_revenue,
            interest_income: config.interest_income,
            other_income: config.other_income,
            total_income,
            details: IncomeDetails {
                sold_products: sales.sold_products,
            },
        },
        expenses: ExpenseSection {
            total_salaries,
            operating_expenses,
            depreciation: config.depreciation,
            taxes: config.taxes,
            total_property_transaction_costs: sales.transaction_costs,
            total_expenses,
            details: ExpenseDetails {
                base_salaries: config.base_salaries,
                commissions: commissions.lines,
                total_commissions: commissions.total,
                property_costs: sales.property_costs,
            },
        },
        net_profit_loss: total_income - total_expenses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agency::commission::calculate_commissions;
    use crate::agency::records::{AgentId, NewAgent, NewCustomer, NewProduct, STATUS_CLOSED};
    use chrono::{DateTime, NaiveDate, Utc};
    use std::convert::Infallible;

    fn created(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn agent(id: &str, rate: f64, created_at: DateTime<Utc>) -> Agent {
        let mut agent = Agent::draft(NewAgent {
            name: format!("Agent {id}"),
            email: format!("{id}@agency.test"),
            commission_rate: Some(rate),
            ..NewAgent::default()
        });
        agent.id = AgentId::from(id);
        agent.created_at = created_at;
        agent
    }

    fn villa() -> Product {
        let input = NewProduct {
            title: "Harbor Villa".to_string(),
            price: 500_000.0,
            quantity: 1,
            vat_tax: Some(5_000.0),
            other_cost: Some(2_000.0),
            ..NewProduct::default()
        };
        let mut product = Product::draft(&input, 1, Vec::new());
        product.id = ProductId::from("villa");
        product
    }

    fn closed_deal(agent_id: &str, property: Option<&str>) -> Customer {
        let mut deal = Customer::draft(NewCustomer {
            name: "Buyer".to_string(),
            status: Some(STATUS_CLOSED.to_string()),
            agent_id: Some(AgentId::from(agent_id)),
            property_id: property.map(ProductId::from),
            ..NewCustomer::default()
        });
        deal.updated_at = created(2024, 5, 10);
        deal
    }

    fn lookup(id: &ProductId) -> Result<Option<Product>, Infallible> {
        Ok((id.as_str() == "villa").then(villa))
    }

    #[test]
    fn reference_scenario_reconciles() {
        let agents = vec![agent("a", 100.0, created(2024, 1, 1))];
        let deals = vec![closed_deal("a", Some("villa"))];
        let config = FinancialConfig {
            rent: 1_000.0,
            base_salaries: 2_000.0,
            ..FinancialConfig::default()
        };

        let statement = compose_statement(StatementInputs {
            config,
            pre_system: false,
            sales: tally_sales(&deals, lookup).expect("infallible"),
            commissions: calculate_commissions(&agents, &deals),
        });

        assert_eq!(statement.income.sales_revenue, 500_000.0);
        assert_eq!(statement.income.service_revenue, 15_000.0);
        assert_eq!(statement.income.total_income, 515_000.0);
        assert_eq!(statement.expenses.total_property_transaction_costs, 7_000.0);
        assert_eq!(statement.expenses.details.total_commissions, 100.0);
        assert_eq!(statement.expenses.total_salaries, 2_100.0);
        assert_eq!(statement.expenses.operating_expenses, 1_000.0);
        assert_eq!(statement.expenses.total_expenses, 10_100.0);
        assert_eq!(statement.net_profit_loss, 504_900.0);
        assert_eq!(
            statement.net_profit_loss,
            statement.income.total_income - statement.expenses.total_expenses
        );
    }

    #[test]
    fn unresolvable_properties_are_skipped() {
        let deals = vec![
            closed_deal("a", Some("demolished")),
            closed_deal("a", None),
            closed_deal("a", Some("villa")),
        ];
        let tally = tally_sales(&deals, lookup).expect("infallible");

        assert_eq!(tally.revenue, 500_000.0);
        assert_eq!(tally.sold_products.len(), 1);
        assert_eq!(tally.property_costs[0].cost, 7_000.0);
        assert_eq!(tally.property_costs[0].breakdown.vat_tax, 5_000.0);
    }

    #[test]
    fn lookup_errors_propagate() {
        let deals = vec![closed_deal("a", Some("villa"))];
        let result = tally_sales(&deals, |_| Err::<Option<Product>, _>("store offline"));
        assert_eq!(result, Err("store offline"));
    }

    #[test]
    fn pre_system_without_sales_is_fully_zeroed() {
        let config = FinancialConfig {
            rent: 1_000.0,
            interest_income: 50.0,
            ..FinancialConfig::default()
        };
        let statement = compose_statement(StatementInputs {
            config,
            pre_system: true,
            sales: SalesTally::default(),
            commissions: calculate_commissions(&[agent("a", 100.0, created(2024, 1, 1))], &[]),
        });
        assert_eq!(statement, IncomeStatement::zeroed());
        assert!(statement.expenses.details.commissions.is_empty());
    }

    #[test]
    fn pre_system_with_sales_ignores_stored_config() {
        let deals = vec![closed_deal("a", Some("villa"))];
        let config = FinancialConfig {
            rent: 1_000.0,
            base_salaries: 2_000.0,
            ..FinancialConfig::default()
        };
        let statement = compose_statement(StatementInputs {
            config,
            pre_system: true,
            sales: tally_sales(&deals, lookup).expect("infallible"),
            commissions: CommissionSummary::default(),
        });

        assert_eq!(statement.expenses.operating_expenses, 0.0);
        assert_eq!(statement.expenses.total_salaries, 0.0);
        assert_eq!(statement.income.sales_revenue, 500_000.0);
        assert_eq!(statement.expenses.total_expenses, 7_000.0);
    }

    #[test]
    fn pre_system_compares_against_the_earliest_agent() {
        let agents = vec![
            agent("late", 100.0, created(2024, 6, 1)),
            agent("first", 100.0, created(2024, 2, 15)),
        ];
        let before = DateWindow::new(None, NaiveDate::from_ymd_opt(2024, 2, 14));
        let same_day = DateWindow::new(None, NaiveDate::from_ymd_opt(2024, 2, 15));

        assert!(is_pre_system(&before, &agents, &Utc));
        assert!(!is_pre_system(&same_day, &agents, &Utc));
        assert!(!is_pre_system(&DateWindow::unbounded(), &agents, &Utc));
        assert!(!is_pre_system(&before, &[], &Utc));
    }
}
