//! Checklist templates and their completion progress
//!
//! The view joins three collections fetched concurrently: categories,
//! modules and completion counts. Modules apply to every cluster unless
//! pinned to one.

use crate::validation::Rules;
use async_trait::async_trait;
use console_cascade::{ChainSnapshot, RecordStore, ScopedSource};
use console_client::{Resource, RestClient};
use console_core::{ConsoleError, FieldViolation, LocationLevel, Validate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

/// Name of the bucket holding modules whose category is unknown
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Checklist category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistCategory {
    /// Backend id
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    /// Display name
    pub name: String,
}

/// One checklist item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Item text
    pub name: String,
}

/// Checklist module (a named list of items)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistModule {
    /// Backend id
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    /// Display name
    pub name: String,
    /// Category id
    #[serde(alias = "category", default)]
    pub category_id: String,
    /// Items
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
    /// Cluster the module is pinned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

/// Completion counts reported for a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistCompletion {
    /// Module the counts belong to
    pub module_id: String,
    /// Items marked complete
    pub completed_count: u32,
    /// Items in the module
    pub total_count: u32,
}

/// Completion progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Items marked complete
    pub completed: u32,
    /// Items in total
    pub total: u32,
}

impl Progress {
    /// Create progress
    #[inline]
    #[must_use]
    pub fn new(completed: u32, total: u32) -> Self {
        Self { completed, total }
    }

    /// Completed iff every item is complete (so an empty module counts)
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed == self.total
    }

    /// Rounded percentage; `0` when there are no items
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let (completed, total) = (u64::from(self.completed), u64::from(self.total));
        // half-up rounding of completed * 100 / total
        let rounded = (completed * 200 + total) / (2 * total);
        u32::try_from(rounded).unwrap_or(u32::MAX)
    }
}

/// Module with its progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProgress {
    /// Module
    pub module: ChecklistModule,
    /// Progress (no completion record means nothing done)
    pub progress: Progress,
}

/// Category with its modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    /// Category; the uncategorized bucket has an empty id
    pub category: ChecklistCategory,
    /// Modules in fetch order
    pub modules: Vec<ModuleProgress>,
}

/// Checklist page view model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecklistView {
    /// Groups in category order, uncategorized last
    pub groups: Vec<CategoryGroup>,
}

impl ChecklistView {
    /// Join the three collections
    #[must_use]
    pub fn assemble(
        categories: Vec<ChecklistCategory>,
        modules: Vec<ChecklistModule>,
        completions: &[ChecklistCompletion],
    ) -> Self {
        let counts: HashMap<&str, Progress> = completions
            .iter()
            .map(|c| (c.module_id.as_str(), Progress::new(c.completed_count, c.total_count)))
            .collect();

        let mut groups: Vec<CategoryGroup> = categories
            .into_iter()
            .map(|category| CategoryGroup {
                category,
                modules: Vec::new(),
            })
            .collect();
        let mut uncategorized = Vec::new();

        for module in modules {
            let total = u32::try_from(module.items.len()).unwrap_or(u32::MAX);
            let progress = counts
                .get(module.id.as_str())
                .copied()
                .unwrap_or(Progress::new(0, total));
            let entry = ModuleProgress { module, progress };
            match groups
                .iter_mut()
                .find(|g| g.category.id == entry.module.category_id)
            {
                Some(group) => group.modules.push(entry),
                None => uncategorized.push(entry),
            }
        }

        if !uncategorized.is_empty() {
            groups.push(CategoryGroup {
                category: ChecklistCategory {
                    id: String::new(),
                    name: UNCATEGORIZED.to_string(),
                },
                modules: uncategorized,
            });
        }
        Self { groups }
    }

    /// Number of modules across all groups
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.groups.iter().map(|g| g.modules.len()).sum()
    }

    /// Find a module by id
    #[must_use]
    pub fn module(&self, id: &str) -> Option<&ModuleProgress> {
        self.groups
            .iter()
            .flat_map(|g| g.modules.iter())
            .find(|m| m.module.id == id)
    }
}

/// Module form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistDraft {
    /// Display name
    pub name: String,
    /// Category id
    pub category_id: String,
    /// Item texts
    pub items: Vec<String>,
    /// Pin to a cluster
    pub cluster_id: Option<String>,
}

impl Validate for ChecklistDraft {
    fn violations(&self) -> Vec<FieldViolation> {
        Rules::new()
            .require_text("name", &self.name, "Module name")
            .require_text("categoryId", &self.category_id, "Category")
            .check(
                "items",
                self.items.iter().any(|i| !i.trim().is_empty()),
                "Add at least one item",
            )
            .finish()
    }
}

/// Checklist templates for a location
#[derive(Debug, Clone)]
pub struct Checklists {
    client: RestClient,
}

impl Checklists {
    /// Create over a client
    #[inline]
    #[must_use]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn body(draft: &ChecklistDraft) -> serde_json::Value {
        let items: Vec<ChecklistItem> = draft
            .items
            .iter()
            .map(|i| i.trim())
            .filter(|i| !i.is_empty())
            .map(|name| ChecklistItem {
                name: name.to_string(),
            })
            .collect();
        json!({
            "name": draft.name.trim(),
            "categoryId": draft.category_id,
            "items": items,
            "clusterId": draft.cluster_id,
        })
    }
}

#[async_trait]
impl ScopedSource for Checklists {
    type Scope = ChainSnapshot;
    type View = ChecklistView;

    async fn fetch(&self, scope: &ChainSnapshot) -> Result<ChecklistView, ConsoleError> {
        let (categories, modules, completions) = futures::try_join!(
            self.client
                .list::<ChecklistCategory>(Resource::ChecklistCategories, Vec::new()),
            self.client.list::<ChecklistModule>(Resource::Checklist, Vec::new()),
            self.client
                .list::<ChecklistCompletion>(Resource::ChecklistCompletion, scope.query()),
        )?;

        let cluster = scope.id_of(LocationLevel::Cluster).map(|id| id.as_str());
        let modules: Vec<ChecklistModule> = modules
            .into_iter()
            .filter(|m| match (&m.cluster_id, cluster) {
                (Some(pinned), Some(selected)) => pinned == selected,
                _ => true,
            })
            .collect();

        tracing::debug!(scope = %scope.describe(), modules = modules.len(), "checklist assembled");
        Ok(ChecklistView::assemble(categories, modules, &completions))
    }
}

#[async_trait]
impl RecordStore for Checklists {
    type Scope = ChainSnapshot;
    type Draft = ChecklistDraft;

    async fn create(&self, _: &ChainSnapshot, draft: &ChecklistDraft) -> Result<(), ConsoleError> {
        self.client
            .create(Resource::Checklist, &Self::body(draft))
            .await
            .map(drop)
    }

    async fn update(
        &self,
        _: &ChainSnapshot,
        id: &str,
        draft: &ChecklistDraft,
    ) -> Result<(), ConsoleError> {
        self.client
            .update(Resource::Checklist, id, &Self::body(draft))
            .await
            .map(drop)
    }

    async fn delete(&self, _: &ChainSnapshot, id: &str) -> Result<(), ConsoleError> {
        self.client.delete(Resource::Checklist, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn module(id: &str, category: &str, items: usize) -> ChecklistModule {
        ChecklistModule {
            id: id.into(),
            name: id.to_uppercase(),
            category_id: category.into(),
            items: (0..items)
                .map(|i| ChecklistItem {
                    name: format!("item {i}"),
                })
                .collect(),
            cluster_id: None,
        }
    }

    #[test]
    fn percentage_table() {
        assert_eq!(Progress::new(0, 0).percentage(), 0);
        assert_eq!(Progress::new(4, 4).percentage(), 100);
        assert_eq!(Progress::new(0, 5).percentage(), 0);
        assert_eq!(Progress::new(3, 4).percentage(), 75);
        assert_eq!(Progress::new(1, 3).percentage(), 33);
        assert_eq!(Progress::new(2, 3).percentage(), 67);
        assert_eq!(Progress::new(1, 8).percentage(), 13);
    }

    #[test]
    fn completed_iff_counts_match() {
        assert!(Progress::new(4, 4).is_completed());
        assert!(!Progress::new(3, 4).is_completed());
        assert!(Progress::new(0, 0).is_completed());
    }

    #[test]
    fn assemble_groups_and_buckets_unknown_categories() {
        let categories = vec![ChecklistCategory {
            id: "c1".into(),
            name: "Installation".into(),
        }];
        let modules = vec![module("m1", "c1", 4), module("m2", "gone", 2)];
        let completions = vec![ChecklistCompletion {
            module_id: "m1".into(),
            completed_count: 3,
            total_count: 4,
        }];

        let view = ChecklistView::assemble(categories, modules, &completions);
        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[1].category.name, UNCATEGORIZED);
        assert_eq!(view.module("m1").unwrap().progress.percentage(), 75);
        assert_eq!(view.module("m2").unwrap().progress, Progress::new(0, 2));
        assert_eq!(view.module_count(), 2);
    }

    #[test]
    fn draft_needs_a_non_blank_item() {
        let draft = ChecklistDraft {
            name: "Survey".into(),
            category_id: "c1".into(),
            items: vec!["  ".into()],
            cluster_id: None,
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            ConsoleError::invalid_field("items", "Add at least one item")
        );
    }
}
