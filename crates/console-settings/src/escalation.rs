//! Overdue task escalation tiers

use crate::validation::Rules;
use async_trait::async_trait;
use console_cascade::{RecordStore, ScopedSource};
use console_client::{Resource, RestClient};
use console_core::{ConsoleError, FieldViolation, Validate};
use serde::{Deserialize, Serialize};

/// Notify `notify_role` once a task is `after_days` overdue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationTier {
    /// Days overdue that trigger this tier
    pub after_days: i64,
    /// Role notified
    pub notify_role: String,
}

impl EscalationTier {
    /// Create tier
    #[inline]
    pub fn new(after_days: i64, notify_role: impl Into<String>) -> Self {
        Self {
            after_days,
            notify_role: notify_role.into(),
        }
    }
}

/// Escalation ladder for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationSetting {
    /// Backend id
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Task the ladder applies to
    pub task_name: String,
    /// Tiers, ascending by `after_days`
    #[serde(default)]
    pub tiers: Vec<EscalationTier>,
}

impl EscalationSetting {
    /// Highest tier reached after `days_overdue` days
    #[must_use]
    pub fn tier_for(&self, days_overdue: i64) -> Option<&EscalationTier> {
        self.tiers
            .iter()
            .filter(|t| t.after_days <= days_overdue)
            .max_by_key(|t| t.after_days)
    }
}

impl Validate for EscalationSetting {
    fn violations(&self) -> Vec<FieldViolation> {
        let days: Vec<i64> = self.tiers.iter().map(|t| t.after_days).collect();
        let mut rules = Rules::new()
            .require_text("taskName", &self.task_name, "Task name")
            .check("tiers", !self.tiers.is_empty(), "Add at least one tier")
            .ascending("tiers", &days);

        for (i, tier) in self.tiers.iter().enumerate() {
            let tier_rules = Rules::new()
                .min_i64("afterDays", tier.after_days, 1)
                .require_text("notifyRole", &tier.notify_role, "Role")
                .finish();
            rules = rules.nested(&format!("tiers[{i}]"), tier_rules);
        }
        rules.finish()
    }
}

/// Escalation settings collection
#[derive(Debug, Clone)]
pub struct EscalationSettings {
    client: RestClient,
}

impl EscalationSettings {
    /// Create over a client
    #[inline]
    #[must_use]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScopedSource for EscalationSettings {
    type Scope = ();
    type View = Vec<EscalationSetting>;

    async fn fetch(&self, _: &()) -> Result<Vec<EscalationSetting>, ConsoleError> {
        self.client
            .list(Resource::OverdueTaskSettings, Vec::new())
            .await
    }
}

#[async_trait]
impl RecordStore for EscalationSettings {
    type Scope = ();
    type Draft = EscalationSetting;

    async fn create(&self, _: &(), draft: &EscalationSetting) -> Result<(), ConsoleError> {
        self.client
            .create(Resource::OverdueTaskSettings, draft)
            .await
            .map(drop)
    }

    async fn update(&self, _: &(), id: &str, draft: &EscalationSetting) -> Result<(), ConsoleError> {
        self.client
            .update(Resource::OverdueTaskSettings, id, draft)
            .await
            .map(drop)
    }

    async fn delete(&self, _: &(), id: &str) -> Result<(), ConsoleError> {
        self.client.delete(Resource::OverdueTaskSettings, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ladder() -> EscalationSetting {
        EscalationSetting {
            id: String::new(),
            task_name: "Site survey".into(),
            tiers: vec![
                EscalationTier::new(1, "cluster-manager"),
                EscalationTier::new(3, "state-head"),
                EscalationTier::new(7, "director"),
            ],
        }
    }

    #[test]
    fn picks_highest_tier_reached() {
        let ladder = ladder();
        assert_eq!(ladder.tier_for(0), None);
        assert_eq!(ladder.tier_for(1).unwrap().notify_role, "cluster-manager");
        assert_eq!(ladder.tier_for(5).unwrap().notify_role, "state-head");
        assert_eq!(ladder.tier_for(30).unwrap().notify_role, "director");
    }

    #[test]
    fn valid_ladder_passes() {
        assert!(ladder().violations().is_empty());
    }

    #[test]
    fn tier_problems_are_reported_per_tier() {
        let mut ladder = ladder();
        ladder.tiers[1] = EscalationTier::new(0, " ");
        let fields: Vec<String> = ladder.violations().into_iter().map(|v| v.field).collect();
        assert_eq!(
            fields,
            vec!["tiers", "tiers[1].afterDays", "tiers[1].notifyRole"]
        );
    }

    #[test]
    fn empty_ladder_is_rejected() {
        let setting = EscalationSetting {
            id: String::new(),
            task_name: "Site survey".into(),
            tiers: Vec::new(),
        };
        assert_eq!(
            setting.validate().unwrap_err(),
            ConsoleError::invalid_field("tiers", "Add at least one tier")
        );
    }
}
