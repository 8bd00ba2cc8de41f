//! Side effects of moving a customer into "Closed".
//!
//! [`apply_status_transition`] decides which effects a customer update implies
//! without touching storage; [`execute_effects`] then applies them best-effort
//! against the agent and product repositories. A missing agent or an empty
//! product is skipped, and a failing store call is logged without stopping the
//! remaining effects.

use tracing::{debug, warn};

use super::records::{
    Agent, AgentId, Customer, CustomerUpdate, Product, ProductId, STATUS_CLOSED,
};
use super::store::DocumentRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingEffect {
    /// +10 points and +1 sale on the agent's lifetime counters.
    CreditAgent(AgentId),
    /// One unit out of the referenced property's stock.
    ReleaseUnit(ProductId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTransition {
    /// The update moves the customer from a non-closed status into "Closed".
    pub closes_deal: bool,
    pub effects: Vec<PendingEffect>,
}

/// Effects implied by applying `update` to `previous`. Re-saving an already
/// closed customer, or leaving "Closed", implies nothing.
pub fn apply_status_transition(previous: &Customer, update: &CustomerUpdate) -> StatusTransition {
    let closes_deal = update.status.as_deref() == Some(STATUS_CLOSED) && !previous.is_closed();
    if !closes_deal {
        return StatusTransition::default();
    }

    let mut effects = Vec::with_capacity(2);
    if let Some(agent_id) = update.agent_id.as_ref().or(previous.agent_id.as_ref()) {
        effects.push(PendingEffect::CreditAgent(agent_id.clone()));
    }
    if let Some(product_id) = &update.property_id {
        effects.push(PendingEffect::ReleaseUnit(product_id.clone()));
    }

    StatusTransition {
        closes_deal,
        effects,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectOutcome {
    Applied,
    /// The referenced record does not exist or has no stock left.
    Skipped,
    Failed(String),
}

pub fn execute_effects(
    effects: &[PendingEffect],
    agents: &dyn DocumentRepository<Agent>,
    products: &dyn DocumentRepository<Product>,
) -> Vec<(PendingEffect, EffectOutcome)> {
    effects
        .iter()
        .map(|effect| {
            let outcome = match effect {
                PendingEffect::CreditAgent(agent_id) => credit_agent(agents, agent_id),
                PendingEffect::ReleaseUnit(product_id) => release_unit(products, product_id),
            };
            (effect.clone(), outcome)
        })
        .collect()
}

fn credit_agent(agents: &dyn DocumentRepository<Agent>, agent_id: &AgentId) -> EffectOutcome {
    let result = agents.modify(agent_id, &mut |agent| {
        agent.record_closed_deal();
        true
    });
    match result {
        Ok(Some(agent)) => {
            debug!(
                agent = %agent_id,
                points = agent.points,
                sales = agent.sales_count,
                "credited agent"
            );
            EffectOutcome::Applied
        }
        Ok(None) => {
            debug!(agent = %agent_id, "agent not found; skipping credit");
            EffectOutcome::Skipped
        }
        Err(err) => {
            warn!(agent = %agent_id, error = %err, "failed to credit agent");
            EffectOutcome::Failed(err.to_string())
        }
    }
}

fn release_unit(
    products: &dyn DocumentRepository<Product>,
    product_id: &ProductId,
) -> EffectOutcome {
    let mut taken = false;
    let result = products.modify(product_id, &mut |product| {
        taken = product.take_unit();
        taken
    });
    match result {
        Ok(Some(product)) if taken => {
            debug!(
                product = %product_id,
                remaining = product.quantity,
                status = %product.status,
                "released unit"
            );
            EffectOutcome::Applied
        }
        Ok(Some(_)) => {
            debug!(product = %product_id, "product already depleted; skipping");
            EffectOutcome::Skipped
        }
        Ok(None) => {
            debug!(product = %product_id, "product not found; skipping");
            EffectOutcome::Skipped
        }
        Err(err) => {
            warn!(product = %product_id, error = %err, "failed to release unit");
            EffectOutcome::Failed(err.to_string())
        }
    }
}
