use serde::Serialize;

use super::records::{Agent, Customer, POINTS_PER_DEAL};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionLine {
    pub agent_name: String,
    pub amount: f64,
    pub points: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommissionSummary {
    pub lines: Vec<CommissionLine>,
    pub total: f64,
}

/// Commissions for `closed_deals`, one line per agent in `agents` order.
///
/// Points are recomputed from the deals in the window (10 per deal) rather than
/// read from the agent's lifetime counter, so the amount is
/// `deals × commission_rate`. Agents without deals still get a zero line.
pub fn calculate_commissions(agents: &[Agent], closed_deals: &[Customer]) -> CommissionSummary {
    let mut summary = CommissionSummary::default();

    for agent in agents {
        let deals = closed_deals
            .iter()
            .filter(|deal| deal.is_closed() && deal.agent_id.as_ref() == Some(&agent.id))
            .count();
        let points = u32::try_from(deals)
            .unwrap_or(u32::MAX)
            .saturating_mul(POINTS_PER_DEAL);
        let amount = f64::from(points) / f64::from(POINTS_PER_DEAL) * agent.commission_rate;

        summary.total += amount;
        summary.lines.push(CommissionLine {
            agent_name: agent.name.clone(),
            amount,
            points,
        });
    }

    summary
}
