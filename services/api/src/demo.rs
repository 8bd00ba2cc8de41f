use crate::infra::in_memory_service;
use agency_ops::agency::records::STATUS_CLOSED;
use agency_ops::agency::store::{Clock, ManualClock};
use agency_ops::agency::window::start_of_day;
use agency_ops::agency::{
    AgencyService, AgencyServiceError, Customer, CustomerUpdate, DashboardStats, DateWindow,
    FinancialConfigPatch, IncomeStatement, InventoryImporter, NewAgent, NewCustomer, NewProduct,
    ProductId,
};
use agency_ops::config::MediaConfig;
use agency_ops::error::AppError;
use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// First day of the reporting window (YYYY-MM-DD). Defaults to the first of this month.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Last day of the reporting window (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end: Option<NaiveDate>,
    /// Optional inventory CSV used instead of the built-in listings.
    #[arg(long)]
    pub(crate) products_csv: Option<PathBuf>,
}

pub(crate) struct DemoOutcome {
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
    pub(crate) listings: usize,
    pub(crate) closed: usize,
    pub(crate) statement: IncomeStatement,
    pub(crate) stats: DashboardStats,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    println!("Agency operations demo");
    let outcome = seed_agency(args)?;
    render_outcome(&outcome);
    Ok(())
}

/// Seed an in-memory agency on a manual clock: agents a month before the
/// window, listings a week before, leads on the first day, and closings in the
/// middle of the window. Every lead but the last is closed.
pub(crate) fn seed_agency(args: DemoArgs) -> Result<DemoOutcome, AppError> {
    let DemoArgs {
        start,
        end,
        products_csv,
    } = args;

    let today = Local::now().date_naive();
    let end = end.unwrap_or(today);
    let start = start.unwrap_or_else(|| end.with_day(1).unwrap_or(end));
    if end < start {
        return Err(AgencyServiceError::InvalidRequest(format!(
            "demo window ends ({end}) before it starts ({start})"
        ))
        .into());
    }

    let listings = match products_csv {
        Some(path) => InventoryImporter::from_path(path)?,
        None => default_listings(),
    };

    let clock = Arc::new(ManualClock::new(business_hours(start - Duration::days(30), 9)));
    let shared_clock: Arc<dyn Clock> = clock.clone();
    let media = MediaConfig {
        public_base_url: "http://127.0.0.1:3000/media".to_string(),
        max_bytes: 1024 * 1024,
    };
    let service = in_memory_service(shared_clock, &media);

    let roster = [
        ("Avery Stone", Some(120.0)),
        ("Blake Rivera", Some(90.0)),
        ("Casey Lin", None),
    ];
    let agents = roster
        .into_iter()
        .map(|(name, rate)| {
            service.create_agent(NewAgent {
                name: name.to_string(),
                email: format!("{}@agency.test", name.to_ascii_lowercase().replace(' ', ".")),
                commission_rate: rate,
                ..NewAgent::default()
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    service.update_financial_config(&demo_config())?;

    clock.set(business_hours(start - Duration::days(7), 10));
    let products = listings
        .into_iter()
        .map(|listing| service.create_product(listing))
        .collect::<Result<Vec<_>, _>>()?;

    clock.set(business_hours(start, 11));
    let mut leads = Vec::with_capacity(products.len());
    for (index, product) in products.iter().enumerate() {
        let agent = &agents[index % agents.len()];
        let lead = service.create_customer(NewCustomer {
            name: format!("Lead {} ({})", index + 1, product.title),
            agent_id: Some(agent.id.clone()),
            ..NewCustomer::default()
        })?;
        leads.push((lead, product.id.clone()));
    }

    let midpoint = start + Duration::days((end - start).num_days() / 2);
    clock.set(business_hours(midpoint, 14));
    let closing = leads.len().saturating_sub(1);
    for (lead, property_id) in leads.iter().take(closing) {
        close_deal(&service, lead, property_id)?;
    }

    let window = DateWindow::new(Some(start), Some(end));
    Ok(DemoOutcome {
        start,
        end,
        listings: products.len(),
        closed: closing,
        statement: service.income_statement(&window)?,
        stats: service.dashboard_stats(&window)?,
    })
}

fn close_deal(
    service: &AgencyService,
    lead: &Customer,
    property_id: &ProductId,
) -> Result<(), AgencyServiceError> {
    service.update_customer(
        &lead.id,
        CustomerUpdate {
            status: Some(STATUS_CLOSED.to_string()),
            property_id: Some(property_id.clone()),
            ..CustomerUpdate::default()
        },
    )?;
    Ok(())
}

fn business_hours(date: NaiveDate, hour: i64) -> chrono::DateTime<chrono::Utc> {
    start_of_day(date, &Local) + Duration::hours(hour)
}

fn demo_config() -> FinancialConfigPatch {
    FinancialConfigPatch {
        rent: Some(2_500.0),
        utilities: Some(400.0),
        marketing: Some(800.0),
        insurance: Some(300.0),
        base_salaries: Some(9_000.0),
        ..FinancialConfigPatch::default()
    }
}

fn default_listings() -> Vec<NewProduct> {
    [
        ("Harbor Villa", "Marina District", 500_000.0, 1, 5_000.0, 2_000.0),
        ("River Lofts 4B", "Old Town", 240_000.0, 3, 2_400.0, 900.0),
        ("Cedar Ridge Lot 12", "Hillside", 85_000.0, 2, 850.0, 300.0),
    ]
    .into_iter()
    .map(|(title, location, price, quantity, vat_tax, other_cost)| NewProduct {
        title: title.to_string(),
        location: Some(location.to_string()),
        price,
        quantity,
        vat_tax: Some(vat_tax),
        other_cost: Some(other_cost),
        ..NewProduct::default()
    })
    .collect()
}

fn render_outcome(outcome: &DemoOutcome) {
    let DemoOutcome {
        start,
        end,
        listings,
        closed,
        statement,
        stats,
    } = outcome;
    let income = &statement.income;
    let expenses = &statement.expenses;

    println!("Reporting window {start} to {end}");
    println!("- {listings} listings seeded | {closed} deals closed");

    println!("\nIncome");
    println!("- Sales revenue: {:.2}", income.sales_revenue);
    println!("- Service revenue: {:.2}", income.service_revenue);
    println!(
        "- Interest and other income: {:.2}",
        income.interest_income + income.other_income
    );
    println!("- Total income: {:.2}", income.total_income);
    for sold in &income.details.sold_products {
        println!(
            "  - {} sold for {:.2} on {}",
            sold.title,
            sold.price,
            sold.date.date_naive()
        );
    }

    println!("\nExpenses");
    println!("- Salaries (base + commissions): {:.2}", expenses.total_salaries);
    for line in &expenses.details.commissions {
        println!(
            "  - {}: {} points -> {:.2}",
            line.agent_name, line.points, line.amount
        );
    }
    println!("- Operating expenses: {:.2}", expenses.operating_expenses);
    println!(
        "- Property transaction costs: {:.2}",
        expenses.total_property_transaction_costs
    );
    for cost in &expenses.details.property_costs {
        println!(
            "  - {}: {:.2} (VAT {:.2}, other {:.2})",
            cost.title, cost.cost, cost.breakdown.vat_tax, cost.breakdown.other_cost
        );
    }
    println!("- Total expenses: {:.2}", expenses.total_expenses);
    println!("\nNet profit/loss: {:.2}", statement.net_profit_loss);

    println!("\nDashboard");
    println!(
        "- Sales {:.2} | {} active listings | {} customers | {} agents",
        stats.total_sales, stats.active_listings, stats.total_customers, stats.total_agents
    );
}
