//! Approval overdue rules
//!
//! A rule marks an approval of a given type overdue after `overdueDays`.
//! Rules are listed per approval type; each carries a generated key.

use crate::validation::Rules;
use async_trait::async_trait;
use console_cascade::{RecordStore, ScopedSource};
use console_client::{Resource, RestClient};
use console_core::{ConsoleError, FieldViolation, Validate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Rule lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleStatus {
    /// Enforced
    #[default]
    Active,
    /// Kept but not enforced
    Inactive,
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RuleStatus::Active => "Active",
            RuleStatus::Inactive => "Inactive",
        })
    }
}

/// Approval type a rule list is filtered by (e.g. `quotation`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApprovalType(pub String);

impl ApprovalType {
    /// Create approval type
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for ApprovalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRule {
    /// Backend id
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    /// Generated key, `<slug>_<unix-millis>`
    #[serde(default)]
    pub key: String,
    /// Display name
    pub rule_name: String,
    /// Days until overdue
    pub overdue_days: i64,
    /// Status
    #[serde(default)]
    pub status: RuleStatus,
    /// Approval type
    #[serde(rename = "type")]
    pub rule_type: String,
}

/// Rule form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRuleDraft {
    /// Display name
    pub rule_name: String,
    /// Days until overdue
    pub overdue_days: i64,
    /// Status
    pub status: RuleStatus,
    /// Approval type
    pub rule_type: String,
    /// Key of the rule being edited; generated on create
    pub key: Option<String>,
}

impl ApprovalRuleDraft {
    /// Blank active rule of a type
    pub fn new(rule_name: impl Into<String>, overdue_days: i64, rule_type: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            overdue_days,
            status: RuleStatus::Active,
            rule_type: rule_type.into(),
            key: None,
        }
    }

    /// Form prefilled from a stored rule
    #[must_use]
    pub fn from_rule(rule: &ApprovalRule) -> Self {
        Self {
            rule_name: rule.rule_name.clone(),
            overdue_days: rule.overdue_days,
            status: rule.status,
            rule_type: rule.rule_type.clone(),
            key: (!rule.key.is_empty()).then(|| rule.key.clone()),
        }
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: RuleStatus) -> Self {
        self.status = status;
        self
    }
}

impl Validate for ApprovalRuleDraft {
    fn violations(&self) -> Vec<FieldViolation> {
        Rules::new()
            .require_text("ruleName", &self.rule_name, "Rule name")
            .min_i64("overdueDays", self.overdue_days, 1)
            .require_text("type", &self.rule_type, "Approval type")
            .finish()
    }
}

/// Key for a new rule: lowercase words of the name joined by `_`, then the
/// creation time in unix milliseconds
#[must_use]
pub fn rule_key(rule_name: &str, unix_millis: i64) -> String {
    let slug = rule_name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    format!("{slug}_{unix_millis}")
}

/// Approval rule collection
#[derive(Debug, Clone)]
pub struct ApprovalRules {
    client: RestClient,
}

impl ApprovalRules {
    /// Create over a client
    #[inline]
    #[must_use]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn body(draft: &ApprovalRuleDraft, key: String) -> serde_json::Value {
        json!({
            "key": key,
            "ruleName": draft.rule_name.trim(),
            "overdueDays": draft.overdue_days,
            "status": draft.status,
            "type": draft.rule_type,
        })
    }
}

#[async_trait]
impl ScopedSource for ApprovalRules {
    type Scope = ApprovalType;
    type View = Vec<ApprovalRule>;

    async fn fetch(&self, scope: &ApprovalType) -> Result<Vec<ApprovalRule>, ConsoleError> {
        let rules: Vec<ApprovalRule> = self
            .client
            .list(Resource::ApprovalOverdue, vec![("type".into(), scope.0.clone())])
            .await?;
        // some deployments ignore the filter
        Ok(rules.into_iter().filter(|r| r.rule_type == scope.0).collect())
    }
}

#[async_trait]
impl RecordStore for ApprovalRules {
    type Scope = ApprovalType;
    type Draft = ApprovalRuleDraft;

    async fn create(&self, _: &ApprovalType, draft: &ApprovalRuleDraft) -> Result<(), ConsoleError> {
        let key = rule_key(&draft.rule_name, chrono::Utc::now().timestamp_millis());
        tracing::debug!(%key, "creating approval rule");
        self.client
            .create(Resource::ApprovalOverdue, &Self::body(draft, key))
            .await
            .map(drop)
    }

    async fn update(
        &self,
        _: &ApprovalType,
        id: &str,
        draft: &ApprovalRuleDraft,
    ) -> Result<(), ConsoleError> {
        let key = draft
            .key
            .clone()
            .unwrap_or_else(|| rule_key(&draft.rule_name, chrono::Utc::now().timestamp_millis()));
        self.client
            .update(Resource::ApprovalOverdue, id, &Self::body(draft, key))
            .await
            .map(drop)
    }

    async fn delete(&self, _: &ApprovalType, id: &str) -> Result<(), ConsoleError> {
        self.client.delete(Resource::ApprovalOverdue, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn key_is_slug_and_timestamp() {
        assert_eq!(
            rule_key("Temporary Incharge Approval", 1_700_000_000_000),
            "temporary_incharge_approval_1700000000000"
        );
        assert_eq!(rule_key("  Site-visit  (late) ", 5), "site_visit_late_5");
    }

    #[test]
    fn draft_reports_all_violations() {
        let draft = ApprovalRuleDraft::new("", 0, "");
        let fields: Vec<String> = draft.violations().into_iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["ruleName", "overdueDays", "type"]);
    }

    #[test]
    fn rule_decodes_wire_shape() {
        let rule: ApprovalRule = serde_json::from_value(json!({
            "_id": "r1",
            "key": "temporary_incharge_approval_1",
            "ruleName": "Temporary Incharge Approval",
            "overdueDays": 2,
            "status": "Inactive",
            "type": "quotation"
        }))
        .unwrap();
        assert_eq!(rule.status, RuleStatus::Inactive);
        assert_eq!(ApprovalRuleDraft::from_rule(&rule).key.as_deref(), Some("temporary_incharge_approval_1"));
    }
}
