//! End-to-end settings scenarios against the in-memory backend

use console_cascade::{FormDraft, PageState, ScopedDataLoader, SelectionChain, SettingsPage, Submitter};
use console_client::Method;
use console_core::ConsoleError;
use console_settings::{
    per_lead_rupees, ApprovalRuleDraft, ApprovalRules, ApprovalType, BuyLeadDraft, BuyLeadSettings,
    ChecklistDraft, Checklists, DepartmentAccess, DepartmentModules, Progress, RuleStatus,
};
use console_test_utils::{default_levels, india, services, FakeBackend};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn creating_an_approval_rule_lists_it_under_its_type() {
    let backend = Arc::new(FakeBackend::new());
    backend.insert(
        "/approval-overdue",
        json!({ "_id": "old", "key": "discount_1", "ruleName": "Discount", "overdueDays": 1, "status": "Active", "type": "discount" }),
    );
    let (client, _) = services(&backend);
    let rules = ApprovalRules::new(client);
    let loader = Arc::new(ScopedDataLoader::new(rules.clone()));
    let submitter = Submitter::new(rules, Arc::clone(&loader));

    let scope = ApprovalType::new("onboarding");
    let draft = FormDraft::new(ApprovalRuleDraft::new("Temporary Incharge Approval", 1, "onboarding"));
    let view = submitter.submit(&scope, &draft).await.unwrap();

    assert_eq!(view.len(), 1);
    let rule = &view[0];
    assert_eq!(rule.rule_name, "Temporary Incharge Approval");
    assert_eq!(rule.overdue_days, 1);
    assert_eq!(rule.status, RuleStatus::Active);
    let suffix = rule
        .key
        .strip_prefix("temporary_incharge_approval_")
        .expect("slugged key");
    assert!(!suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()));

    let listing = backend
        .requests()
        .into_iter()
        .rfind(|r| r.method == Method::Get)
        .unwrap();
    assert_eq!(listing.query_param("type"), Some("onboarding"));
}

#[tokio::test]
async fn approval_rule_with_zero_days_is_never_sent() {
    let backend = Arc::new(FakeBackend::new());
    let (client, _) = services(&backend);
    let rules = ApprovalRules::new(client);
    let submitter = Submitter::new(rules.clone(), Arc::new(ScopedDataLoader::new(rules)));

    let draft = FormDraft::new(ApprovalRuleDraft::new("Late", 0, "quotation"));
    let err = submitter
        .submit(&ApprovalType::new("quotation"), &draft)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(backend.writes(), 0);
}

#[test]
fn per_lead_price_scenario() {
    assert_eq!(
        per_lead_rupees(Decimal::from(500), 10).unwrap(),
        Decimal::new(5000, 2)
    );
    assert!(matches!(
        per_lead_rupees(Decimal::from(500), 0),
        Err(ConsoleError::Validation(_))
    ));
}

#[test]
fn completion_percentage_table() {
    for (completed, total, expected) in [(0, 0, 0), (4, 4, 100), (0, 5, 0), (3, 4, 75)] {
        assert_eq!(Progress::new(completed, total).percentage(), expected);
    }
}

#[tokio::test]
async fn buy_lead_pricing_is_saved_for_the_selected_location() {
    let backend = Arc::new(india().enveloped());
    let (client, locations) = services(&backend);
    let settings = BuyLeadSettings::new(client);
    let page = SettingsPage::new(
        SelectionChain::new(default_levels()),
        locations,
        settings.clone(),
        settings,
    );

    page.mount().await.unwrap();
    page.select(0, Some("gj".into())).await.unwrap();
    page.select(1, Some("rk".into())).await.unwrap();
    assert_eq!(page.select(2, Some("amr".into())).await.unwrap(), PageState::Loaded);
    assert!(page.view().unwrap().is_empty());

    let draft = FormDraft::new(BuyLeadDraft {
        total_rupees: Decimal::from(500),
        num_leads: 10,
    });
    assert_eq!(page.submit(&draft).await.unwrap(), PageState::Loaded);

    let view = page.view().unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].per_lead_rupees, Decimal::new(5000, 2));
    assert_eq!(backend.records("/buy-lead-settings")[0]["districtId"], "amr");

    let zero = FormDraft::new(BuyLeadDraft {
        total_rupees: Decimal::from(500),
        num_leads: 0,
    });
    assert!(page.submit(&zero).await.unwrap_err().is_validation());
    assert_eq!(page.state(), PageState::Loaded);
}

#[tokio::test]
async fn checklist_view_joins_categories_modules_and_completion() {
    let backend = india();
    backend.insert("/checklist/categories", json!({ "_id": "c1", "name": "Installation" }));
    backend.insert(
        "/checklist",
        json!({ "_id": "m1", "name": "Panel mounting", "categoryId": "c1", "items": [{ "name": "a" }, { "name": "b" }, { "name": "c" }, { "name": "d" }] }),
    );
    backend.insert(
        "/checklist",
        json!({ "_id": "m2", "name": "Pune only", "categoryId": "c1", "items": [{ "name": "a" }], "clusterId": "pn" }),
    );
    backend.insert(
        "/checklist/completion",
        json!({ "moduleId": "m1", "completedCount": 3, "totalCount": 4, "stateId": "gj", "clusterId": "rk", "districtId": "rkc" }),
    );
    let backend = Arc::new(backend);
    let (client, locations) = services(&backend);
    let checklists = Checklists::new(client);
    let page = SettingsPage::new(
        SelectionChain::new(default_levels()),
        locations,
        checklists.clone(),
        checklists,
    );

    page.mount().await.unwrap();
    page.select(0, Some("gj".into())).await.unwrap();
    page.select(1, Some("rk".into())).await.unwrap();
    page.select(2, Some("rkc".into())).await.unwrap();

    let view = page.view().unwrap();
    assert_eq!(view.module_count(), 1);
    let m1 = view.module("m1").unwrap();
    assert_eq!(m1.progress.percentage(), 75);
    assert!(!m1.progress.is_completed());

    let draft = FormDraft::new(ChecklistDraft {
        name: "Earthing".into(),
        category_id: "c9".into(),
        items: vec!["Pit dug".into(), " ".into()],
        cluster_id: None,
    });
    page.submit(&draft).await.unwrap();
    let view = page.view().unwrap();
    assert_eq!(view.groups.last().unwrap().category.name, "Uncategorized");
    assert_eq!(backend.records("/checklist")[2]["items"], json!([{ "name": "Pit dug" }]));
}

#[tokio::test]
async fn checklist_load_fails_as_a_whole() {
    let backend = india();
    backend.fail(
        "/checklist/completion",
        ConsoleError::Server {
            status: 500,
            message: "boom".into(),
        },
    );
    let backend = Arc::new(backend);
    let (client, locations) = services(&backend);
    let checklists = Checklists::new(client);
    let page = SettingsPage::new(
        SelectionChain::new(default_levels()),
        locations,
        checklists.clone(),
        checklists,
    );

    page.mount().await.unwrap();
    page.select(0, Some("mh".into())).await.unwrap();
    page.select(1, Some("pn".into())).await.unwrap();
    assert!(page.select(2, Some("pnc".into())).await.is_err());
    assert_eq!(page.state(), PageState::LoadError);
    assert!(page.view().is_none());
}

#[tokio::test]
async fn department_modules_round_trip_through_the_catalog() {
    let backend = Arc::new(FakeBackend::new());
    let (client, _) = services(&backend);
    let access = DepartmentAccess::new(client);
    let submitter = Submitter::new(access.clone(), Arc::new(ScopedDataLoader::new(access)));

    let draft = FormDraft::new(DepartmentModules {
        id: String::new(),
        department_id: "sales".into(),
        modules: vec!["leads".into(), "leads.buy".into()],
        optional_tasks: vec!["approve-discount".into()],
    });
    let view = submitter.submit(&(), &draft).await.unwrap();
    assert_eq!(view[0].modules, vec!["leads".to_string(), "leads.buy".to_string()]);

    let id = view[0].id.clone();
    let declined = |_: &str| false;
    submitter.remove(&(), &id, &declined).await.unwrap();
    assert_eq!(backend.records("/department-modules").len(), 1);

    let accepted = |_: &str| true;
    submitter.remove(&(), &id, &accepted).await.unwrap();
    assert!(backend.records("/department-modules").is_empty());
}
