//! Buy-lead pricing
//!
//! A location buys a bundle of leads for a total price; the per-lead price
//! is derived and stored alongside.

use crate::validation::Rules;
use async_trait::async_trait;
use console_cascade::{ChainSnapshot, RecordStore, ScopedSource};
use console_client::{Resource, RestClient};
use console_core::{ConsoleError, FieldViolation, Validate, Violations};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Stored pricing for one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyLeadSetting {
    /// Backend id
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    /// Bundle price
    pub total_rupees: Decimal,
    /// Leads in the bundle
    pub num_leads: i64,
    /// Derived per-lead price
    #[serde(default)]
    pub per_lead_rupees: Decimal,
}

/// Pricing form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyLeadDraft {
    /// Bundle price
    pub total_rupees: Decimal,
    /// Leads in the bundle
    pub num_leads: i64,
}

fn pricing_rules(total_rupees: Decimal, num_leads: i64) -> Vec<FieldViolation> {
    Rules::new()
        .positive_decimal("totalRupees", total_rupees)
        .min_i64("numLeads", num_leads, 1)
        .finish()
}

impl Validate for BuyLeadDraft {
    fn violations(&self) -> Vec<FieldViolation> {
        pricing_rules(self.total_rupees, self.num_leads)
    }
}

/// Per-lead price: `total / leads`, rounded to paise (midpoint away from zero)
///
/// # Errors
/// `ConsoleError::Validation` unless `total > 0` and `leads >= 1`
pub fn per_lead_rupees(total_rupees: Decimal, num_leads: i64) -> Result<Decimal, ConsoleError> {
    let violations = pricing_rules(total_rupees, num_leads);
    if !violations.is_empty() {
        return Err(ConsoleError::Validation(Violations::new(violations)));
    }
    Ok((total_rupees / Decimal::from(num_leads))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Buy-lead settings scoped by location
#[derive(Debug, Clone)]
pub struct BuyLeadSettings {
    client: RestClient,
}

impl BuyLeadSettings {
    /// Create over a client
    #[inline]
    #[must_use]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn body(scope: &ChainSnapshot, draft: &BuyLeadDraft) -> Result<Value, ConsoleError> {
        let per_lead = per_lead_rupees(draft.total_rupees, draft.num_leads)?;
        let mut body = json!({
            "totalRupees": draft.total_rupees,
            "numLeads": draft.num_leads,
            "perLeadRupees": per_lead,
        });
        for (param, id) in scope.query() {
            body[param] = Value::String(id);
        }
        Ok(body)
    }
}

#[async_trait]
impl ScopedSource for BuyLeadSettings {
    type Scope = ChainSnapshot;
    type View = Vec<BuyLeadSetting>;

    async fn fetch(&self, scope: &ChainSnapshot) -> Result<Vec<BuyLeadSetting>, ConsoleError> {
        self.client.list(Resource::BuyLeadSettings, scope.query()).await
    }
}

#[async_trait]
impl RecordStore for BuyLeadSettings {
    type Scope = ChainSnapshot;
    type Draft = BuyLeadDraft;

    async fn create(&self, scope: &ChainSnapshot, draft: &BuyLeadDraft) -> Result<(), ConsoleError> {
        let body = Self::body(scope, draft)?;
        self.client.create(Resource::BuyLeadSettings, &body).await.map(drop)
    }

    async fn update(
        &self,
        scope: &ChainSnapshot,
        id: &str,
        draft: &BuyLeadDraft,
    ) -> Result<(), ConsoleError> {
        let body = Self::body(scope, draft)?;
        self.client
            .update(Resource::BuyLeadSettings, id, &body)
            .await
            .map(drop)
    }

    async fn delete(&self, _: &ChainSnapshot, id: &str) -> Result<(), ConsoleError> {
        self.client.delete(Resource::BuyLeadSettings, id).await
    }
}
