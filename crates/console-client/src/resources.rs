//! Backend resource paths

use console_core::{ConsoleError, LocationLevel, Result};
use std::fmt;

/// Quote subsystem collections under `/quote-settings`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteResource {
    /// General quote settings
    Settings,
    /// Survey bill of materials
    SurveyBom,
    /// Terrace types
    TerraceTypes,
    /// Structure types
    StructureTypes,
    /// Building types
    BuildingTypes,
    /// State-scoped distribution company rate tables
    Discoms,
}

impl QuoteResource {
    fn segment(self) -> &'static str {
        match self {
            QuoteResource::Settings => "settings",
            QuoteResource::SurveyBom => "survey-bom",
            QuoteResource::TerraceTypes => "terrace-types",
            QuoteResource::StructureTypes => "structure-types",
            QuoteResource::BuildingTypes => "building-types",
            QuoteResource::Discoms => "discoms",
        }
    }
}

/// Settings resources exposed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Approval overdue rules
    ApprovalOverdue,
    /// Overdue task escalation settings
    OverdueTaskSettings,
    /// Overdue status settings
    OverdueStatusSettings,
    /// Franchisee manager settings
    FranchiseeManagerSettings,
    /// Buy-lead pricing
    BuyLeadSettings,
    /// Checklist modules
    Checklist,
    /// Checklist categories
    ChecklistCategories,
    /// Checklist completion records
    ChecklistCompletion,
    /// Loan eligibility fields
    Loan,
    /// Quote subsystem
    Quote(QuoteResource),
    /// Department → module access
    DepartmentModules,
    /// Department master
    Departments,
    /// Role master
    Roles,
    /// Users
    Users,
    /// Location collections
    Location(LocationLevel),
}

impl Resource {
    /// Collection path
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Resource::ApprovalOverdue => "/approval-overdue".to_string(),
            Resource::OverdueTaskSettings => "/overdue-task-settings".to_string(),
            Resource::OverdueStatusSettings => "/overdue-status-settings".to_string(),
            Resource::FranchiseeManagerSettings => "/franchisee-manager-settings".to_string(),
            Resource::BuyLeadSettings => "/buy-lead-settings".to_string(),
            Resource::Checklist => "/checklist".to_string(),
            Resource::ChecklistCategories => "/checklist/categories".to_string(),
            Resource::ChecklistCompletion => "/checklist/completion".to_string(),
            Resource::Loan => "/loan".to_string(),
            Resource::Quote(q) => format!("/quote-settings/{}", q.segment()),
            Resource::DepartmentModules => "/department-modules".to_string(),
            Resource::Departments => "/masters/departments".to_string(),
            Resource::Roles => "/masters/roles".to_string(),
            Resource::Users => "/users".to_string(),
            Resource::Location(level) => level.endpoint().to_string(),
        }
    }

    /// Path of one record
    ///
    /// Ids are single path segments of unreserved characters
    /// (`A-Z a-z 0-9 - . _ ~`), excluding `.` and `..`.
    ///
    /// # Errors
    /// `ConsoleError::Validation` on `id` for anything else; nothing is sent
    pub fn record_path(&self, id: &str) -> Result<String> {
        let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~');
        if id.is_empty() || id == "." || id == ".." || !id.chars().all(unreserved) {
            return Err(ConsoleError::invalid_field(
                "id",
                format!("'{id}' is not a valid record id"),
            ));
        }
        Ok(format!("{}/{id}", self.path()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        assert_eq!(Resource::ApprovalOverdue.path(), "/approval-overdue");
        assert_eq!(
            Resource::Quote(QuoteResource::SurveyBom).path(),
            "/quote-settings/survey-bom"
        );
        assert_eq!(Resource::Location(LocationLevel::City).path(), "/cities");
        assert_eq!(Resource::Roles.to_string(), "/masters/roles");
    }

    #[test]
    fn record_paths() {
        assert_eq!(Resource::Loan.record_path("abc").unwrap(), "/loan/abc");
        assert_eq!(
            Resource::Checklist.record_path("65f1c0a9e4b0_x-1").unwrap(),
            "/checklist/65f1c0a9e4b0_x-1"
        );
    }

    #[test]
    fn ids_cannot_escape_their_collection() {
        for id in ["", ".", "..", "a/b", "../users", "x?force=1", "x#y", "a b", "%2e%2e"] {
            let err = Resource::Loan.record_path(id).unwrap_err();
            assert!(err.is_client_side(), "{id:?} accepted");
        }
    }
}
