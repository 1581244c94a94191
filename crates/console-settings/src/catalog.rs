//! Module catalog and department module access
//!
//! The sidebar module tree and optional task list are static and shared by
//! reference. Department assignments name catalog keys and are checked
//! against the tree before they are sent.

use crate::validation::Rules;
use async_trait::async_trait;
use console_cascade::{RecordStore, ScopedSource};
use console_client::{Resource, RestClient};
use console_core::{ConsoleError, FieldViolation, Validate};
use serde::{Deserialize, Serialize};

/// Node of the module tree
#[derive(Debug, PartialEq, Eq)]
pub struct ModuleEntry {
    /// Stable key stored in assignments
    pub key: &'static str,
    /// Sidebar label
    pub label: &'static str,
    /// Sub-modules
    pub children: &'static [ModuleEntry],
}

const fn leaf(key: &'static str, label: &'static str) -> ModuleEntry {
    ModuleEntry {
        key,
        label,
        children: &[],
    }
}

/// Sidebar modules a department can be granted
pub static SIDEBAR_MODULES: &[ModuleEntry] = &[
    leaf("dashboard", "Dashboard"),
    ModuleEntry {
        key: "leads",
        label: "Leads",
        children: &[
            leaf("leads.list", "All Leads"),
            leaf("leads.buy", "Buy Leads"),
            leaf("leads.assign", "Lead Assignment"),
        ],
    },
    ModuleEntry {
        key: "projects",
        label: "Projects",
        children: &[
            leaf("projects.survey", "Site Survey"),
            leaf("projects.quotation", "Quotation"),
            leaf("projects.installation", "Installation"),
            leaf("projects.checklist", "Checklists"),
        ],
    },
    ModuleEntry {
        key: "finance",
        label: "Finance",
        children: &[
            leaf("finance.loan", "Loan Applications"),
            leaf("finance.payments", "Payments"),
        ],
    },
    leaf("franchisee", "Franchisee"),
    ModuleEntry {
        key: "settings",
        label: "Settings",
        children: &[
            leaf("settings.approvals", "Approval Overdue"),
            leaf("settings.escalation", "Overdue Escalation"),
            leaf("settings.quote", "Quote Settings"),
            leaf("settings.departments", "Department Modules"),
        ],
    },
    leaf("reports", "Reports"),
];

/// Tasks a department may opt into
pub static OPTIONAL_TASKS: &[&str] = &[
    "approve-quotation",
    "approve-discount",
    "approve-loan",
    "assign-installer",
    "close-ticket",
];

/// Find a module anywhere in the tree
#[must_use]
pub fn find(key: &str) -> Option<&'static ModuleEntry> {
    fn walk(entries: &'static [ModuleEntry], key: &str) -> Option<&'static ModuleEntry> {
        entries
            .iter()
            .find_map(|e| if e.key == key { Some(e) } else { walk(e.children, key) })
    }
    walk(SIDEBAR_MODULES, key)
}

/// Every module, depth-first in sidebar order
#[must_use]
pub fn flatten() -> Vec<&'static ModuleEntry> {
    fn walk(entries: &'static [ModuleEntry], out: &mut Vec<&'static ModuleEntry>) {
        for entry in entries {
            out.push(entry);
            walk(entry.children, out);
        }
    }
    let mut out = Vec::new();
    walk(SIDEBAR_MODULES, &mut out);
    out
}

/// Modules and optional tasks granted to a department
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentModules {
    /// Backend id
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Department
    pub department_id: String,
    /// Granted module keys
    #[serde(default)]
    pub modules: Vec<String>,
    /// Granted optional tasks
    #[serde(default)]
    pub optional_tasks: Vec<String>,
}

impl Validate for DepartmentModules {
    fn violations(&self) -> Vec<FieldViolation> {
        let mut rules = Rules::new()
            .require_text("departmentId", &self.department_id, "Department")
            .check("modules", !self.modules.is_empty(), "Select at least one module");

        for (i, key) in self.modules.iter().enumerate() {
            rules = rules.check(
                &format!("modules[{i}]"),
                find(key).is_some(),
                format!("Unknown module '{key}'"),
            );
        }
        for (i, task) in self.optional_tasks.iter().enumerate() {
            rules = rules.check(
                &format!("optionalTasks[{i}]"),
                OPTIONAL_TASKS.contains(&task.as_str()),
                format!("Unknown task '{task}'"),
            );
        }
        rules.finish()
    }
}

/// Department module assignments
#[derive(Debug, Clone)]
pub struct DepartmentAccess {
    client: RestClient,
}

impl DepartmentAccess {
    /// Create over a client
    #[inline]
    #[must_use]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ScopedSource for DepartmentAccess {
    type Scope = ();
    type View = Vec<DepartmentModules>;

    async fn fetch(&self, _: &()) -> Result<Vec<DepartmentModules>, ConsoleError> {
        self.client.list(Resource::DepartmentModules, Vec::new()).await
    }
}

#[async_trait]
impl RecordStore for DepartmentAccess {
    type Scope = ();
    type Draft = DepartmentModules;

    async fn create(&self, _: &(), draft: &DepartmentModules) -> Result<(), ConsoleError> {
        self.client
            .create(Resource::DepartmentModules, draft)
            .await
            .map(drop)
    }

    async fn update(&self, _: &(), id: &str, draft: &DepartmentModules) -> Result<(), ConsoleError> {
        self.client
            .update(Resource::DepartmentModules, id, draft)
            .await
            .map(drop)
    }

    async fn delete(&self, _: &(), id: &str) -> Result<(), ConsoleError> {
        self.client.delete(Resource::DepartmentModules, id).await
    }
}
