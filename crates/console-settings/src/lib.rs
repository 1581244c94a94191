//! Console Settings - the settings records edited through the console
//!
//! Each collection pairs a [`ScopedSource`] (read side) with a
//! [`RecordStore`] (write side) so it can be driven by a
//! [`Submitter`](console_cascade::Submitter) or a
//! [`SettingsPage`](console_cascade::SettingsPage).
//!
//! | Module | Resource | Scope |
//! |---|---|---|
//! | [`approval`] | `/approval-overdue` | approval type |
//! | [`buy_lead`] | `/buy-lead-settings` | location chain |
//! | [`checklist`] | `/checklist*` | location chain |
//! | [`escalation`] | `/overdue-task-settings` | none |
//! | [`loan`] | `/loan` | none |
//! | [`catalog`] | `/department-modules` | none |
//!
//! [`ScopedSource`]: console_cascade::ScopedSource
//! [`RecordStore`]: console_cascade::RecordStore

#![warn(unreachable_pub)]

pub mod approval;
pub mod buy_lead;
pub mod catalog;
pub mod checklist;
pub mod escalation;
pub mod loan;
pub mod validation;

pub use approval::{rule_key, ApprovalRule, ApprovalRuleDraft, ApprovalRules, ApprovalType, RuleStatus};
pub use buy_lead::{per_lead_rupees, BuyLeadDraft, BuyLeadSetting, BuyLeadSettings};
pub use catalog::{DepartmentAccess, DepartmentModules, ModuleEntry, OPTIONAL_TASKS, SIDEBAR_MODULES};
pub use checklist::{
    ChecklistCategory, ChecklistCompletion, ChecklistDraft, ChecklistItem, ChecklistModule,
    ChecklistView, Checklists, Progress,
};
pub use escalation::{EscalationSetting, EscalationSettings, EscalationTier};
pub use loan::{FieldType, LoanField, LoanFields};
pub use validation::Rules;
