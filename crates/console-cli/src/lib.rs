//! `consolectl` command handling
//!
//! The binary parses arguments, loads configuration and prints whatever the
//! handlers here return.

#![warn(unreachable_pub)]

use anyhow::{anyhow, bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use console_cascade::{
    CascadeController, FormDraft, PageState, ScopedDataLoader, SelectionChain, SettingsPage,
    Submitter,
};
use console_client::{ApiTransport, HttpTransport, LevelSpec, LocationService, RestClient};
use console_core::{AuthContext, ConsoleConfig, LoggingConfig, NodeId, TokenStore};
use console_settings::{
    per_lead_rupees, ApprovalRule, ApprovalRuleDraft, ApprovalRules, ApprovalType, ChecklistView,
    Checklists, RuleStatus,
};
use rust_decimal::Decimal;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Config file read when `--config` is not given and the file exists
pub const DEFAULT_CONFIG_FILE: &str = "console.toml";

/// Token file used when `auth.token_file` is not configured
pub const DEFAULT_TOKEN_FILE: &str = ".console-token";

/// Argument definitions
#[must_use]
pub fn command() -> Command {
    let select = Arg::new("select")
        .long("select")
        .action(ArgAction::Append)
        .help("Option id per level, broadest first");

    Command::new("consolectl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Solar ERP settings console")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (TOML)"),
        )
        .subcommand(
            Command::new("login").about("Store a bearer token").arg(
                Arg::new("token")
                    .long("token")
                    .required(true)
                    .help("Token issued by the backend"),
            ),
        )
        .subcommand(Command::new("logout").about("Forget the stored token"))
        .subcommand(
            Command::new("locations")
                .about("Walk the location cascade and show each level's options")
                .arg(select.clone()),
        )
        .subcommand(
            Command::new("checklist")
                .about("Show checklist progress for a location")
                .arg(select.required(true)),
        )
        .subcommand(
            Command::new("approvals")
                .about("Approval overdue rules")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list").about("List rules of a type").arg(
                        Arg::new("type")
                            .long("type")
                            .required(true)
                            .help("Approval type, e.g. quotation"),
                    ),
                )
                .subcommand(
                    Command::new("add")
                        .about("Create a rule")
                        .arg(Arg::new("name").long("name").required(true).help("Rule name"))
                        .arg(
                            Arg::new("days")
                                .long("days")
                                .required(true)
                                .value_parser(value_parser!(i64))
                                .allow_negative_numbers(true)
                                .help("Days until an approval is overdue"),
                        )
                        .arg(Arg::new("type").long("type").required(true).help("Approval type"))
                        .arg(
                            Arg::new("inactive")
                                .long("inactive")
                                .action(ArgAction::SetTrue)
                                .help("Create the rule disabled"),
                        ),
                ),
        )
        .subcommand(
            Command::new("per-lead")
                .about("Compute the per-lead price of a lead bundle")
                .arg(Arg::new("total").long("total").required(true).help("Bundle price in rupees"))
                .arg(
                    Arg::new("leads")
                        .long("leads")
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true)
                        .help("Leads in the bundle"),
                ),
        )
}

/// Load configuration: explicit path, else `console.toml` when present,
/// else defaults; then environment overrides
///
/// # Errors
/// Unreadable or invalid configuration
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ConsoleConfig> {
    let config = match path {
        Some(path) => ConsoleConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => ConsoleConfig::load(DEFAULT_CONFIG_FILE)?,
        None => ConsoleConfig::default(),
    };
    Ok(config.with_env()?)
}

/// Install the global subscriber
///
/// # Errors
/// Invalid filter directive or a subscriber already installed
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter '{}'", config.filter))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("initialising logging: {e}"))
}

/// Configured collaborators
pub struct Console {
    config: ConsoleConfig,
    auth: Arc<AuthContext>,
    client: RestClient,
    locations: Arc<LocationService>,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Console {
    /// Connect over HTTP
    ///
    /// # Errors
    /// Unreadable token file or HTTP client construction failure
    pub fn connect(config: ConsoleConfig) -> anyhow::Result<Self> {
        let auth = Arc::new(auth_context(&config)?);
        let transport = HttpTransport::new(&config.api, Arc::clone(&auth))?;
        Ok(Self::with_transport(config, auth, Arc::new(transport)))
    }

    /// Use an existing transport
    #[must_use]
    pub fn with_transport(
        config: ConsoleConfig,
        auth: Arc<AuthContext>,
        transport: Arc<dyn ApiTransport>,
    ) -> Self {
        let client = RestClient::new(transport);
        let locations = Arc::new(LocationService::new(client.clone()));
        Self {
            config,
            auth,
            client,
            locations,
        }
    }

    fn chain(&self) -> SelectionChain {
        SelectionChain::new(LevelSpec::chain(&self.config.cascade.levels))
            .with_reselect(self.config.cascade.reselect)
    }

    /// Run a parsed command; returns the text to print
    ///
    /// # Errors
    /// Any failure of the command, with context
    pub async fn run(&self, matches: &ArgMatches) -> anyhow::Result<String> {
        match matches.subcommand() {
            Some(("login", args)) => {
                let token = required::<String>(args, "token")?;
                self.auth.set(token.as_str())?;
                Ok("Logged in".to_string())
            }
            Some(("logout", _)) => {
                self.auth.clear()?;
                Ok("Logged out".to_string())
            }
            Some(("locations", args)) => self.locations(&selections(args)).await,
            Some(("checklist", args)) => self.checklist(&selections(args)).await,
            Some(("approvals", args)) => match args.subcommand() {
                Some(("list", args)) => {
                    let rule_type = required::<String>(args, "type")?;
                    self.list_rules(rule_type).await
                }
                Some(("add", args)) => {
                    let draft = ApprovalRuleDraft::new(
                        required::<String>(args, "name")?.as_str(),
                        *required::<i64>(args, "days")?,
                        required::<String>(args, "type")?.as_str(),
                    );
                    let draft = if args.get_flag("inactive") {
                        draft.with_status(RuleStatus::Inactive)
                    } else {
                        draft
                    };
                    self.add_rule(draft).await
                }
                _ => bail!("unknown approvals command"),
            },
            Some(("per-lead", args)) => {
                let total = required::<String>(args, "total")?;
                let total = Decimal::from_str(total.trim())
                    .with_context(|| format!("'{total}' is not an amount"))?;
                let leads = *required::<i64>(args, "leads")?;
                let per_lead = per_lead_rupees(total, leads)?;
                Ok(format!("{per_lead:.2} per lead ({leads} leads for {total})"))
            }
            _ => bail!("no command given; see --help"),
        }
    }

    async fn locations(&self, ids: &[String]) -> anyhow::Result<String> {
        let controller = CascadeController::new(self.chain(), Arc::clone(&self.locations));
        controller.mount().await.context("loading first level")?;
        for (index, id) in ids.iter().enumerate() {
            controller
                .select(index, Some(NodeId::new(id.as_str())))
                .await
                .with_context(|| format!("selecting '{id}'"))?;
        }
        Ok(render_chain(&controller.chain()))
    }

    async fn checklist(&self, ids: &[String]) -> anyhow::Result<String> {
        let checklists = Checklists::new(self.client.clone());
        let page = SettingsPage::new(
            self.chain(),
            Arc::clone(&self.locations),
            checklists.clone(),
            checklists,
        );
        page.mount().await.context("loading first level")?;
        for (index, id) in ids.iter().enumerate() {
            page.select(index, Some(NodeId::new(id.as_str())))
                .await
                .with_context(|| format!("selecting '{id}'"))?;
        }

        match (page.state(), page.view()) {
            (PageState::Loaded, Some(view)) => {
                let scope = page.controller().snapshot()?;
                Ok(format!("{}\n{}", scope.describe(), render_checklist(&view)))
            }
            _ => bail!(
                "select one option for each of the {} levels",
                page.controller().len()
            ),
        }
    }

    async fn list_rules(&self, rule_type: &str) -> anyhow::Result<String> {
        let loader = ScopedDataLoader::new(ApprovalRules::new(self.client.clone()));
        let rules = loader.load(&ApprovalType::new(rule_type)).await?;
        Ok(render_rules(&rules))
    }

    async fn add_rule(&self, draft: ApprovalRuleDraft) -> anyhow::Result<String> {
        let rules = ApprovalRules::new(self.client.clone());
        let submitter = Submitter::new(rules.clone(), Arc::new(ScopedDataLoader::new(rules)));
        let scope = ApprovalType::new(draft.rule_type.as_str());
        let name = draft.rule_name.trim().to_string();

        let view = submitter.submit(&scope, &FormDraft::new(draft)).await?;
        let created = view
            .iter()
            .filter(|r| r.rule_name == name)
            .max_by(|a, b| a.key.cmp(&b.key));
        Ok(match created {
            Some(rule) => format!("Created rule {}", rule.key),
            None => format!("Created rule '{name}'"),
        })
    }
}

fn auth_context(config: &ConsoleConfig) -> anyhow::Result<AuthContext> {
    if let Some(token) = &config.auth.token {
        return Ok(AuthContext::with_token(token.as_str()));
    }
    let path = config
        .auth
        .token_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));
    Ok(AuthContext::persistent(TokenStore::new(path))?)
}

fn required<'a, T>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(name)
        .ok_or_else(|| anyhow!("--{name} is required"))
}

fn selections(args: &ArgMatches) -> Vec<String> {
    args.get_many::<String>("select")
        .map(|ids| ids.cloned().collect())
        .unwrap_or_default()
}

/// One block per level; `*` marks the selection
#[must_use]
pub fn render_chain(chain: &SelectionChain) -> String {
    ChainTable(chain).to_string()
}

/// Categories with per-module progress
#[must_use]
pub fn render_checklist(view: &ChecklistView) -> String {
    ChecklistTable(view).to_string()
}

/// Rule table
#[must_use]
pub fn render_rules(rules: &[ApprovalRule]) -> String {
    RuleTable(rules).to_string()
}

struct ChainTable<'a>(&'a SelectionChain);

impl fmt::Display for ChainTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in self.0.levels() {
            writeln!(f, "{}:", level.spec().level)?;
            if level.options().is_empty() {
                writeln!(f, "  (no options)")?;
            }
            for option in level.options() {
                let marker = if level.selected() == Some(&option.id) { '*' } else { ' ' };
                writeln!(f, "  {marker} {:<12} {}", option.id, option.name)?;
            }
        }
        if let Ok(scope) = self.0.snapshot() {
            writeln!(f, "Scope: {}", scope.describe())?;
        }
        Ok(())
    }
}

struct ChecklistTable<'a>(&'a ChecklistView);

impl fmt::Display for ChecklistTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.groups.is_empty() {
            return writeln!(f, "No checklist modules");
        }
        for group in &self.0.groups {
            writeln!(f, "{}", group.category.name)?;
            for entry in &group.modules {
                let mark = if entry.progress.is_completed() { "done" } else { "    " };
                writeln!(
                    f,
                    "  [{mark}] {:<28} {:>3}% ({}/{})",
                    entry.module.name,
                    entry.progress.percentage(),
                    entry.progress.completed,
                    entry.progress.total
                )?;
            }
        }
        Ok(())
    }
}

struct RuleTable<'a>(&'a [ApprovalRule]);

impl fmt::Display for RuleTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No rules");
        }
        for rule in self.0 {
            writeln!(
                f,
                "{:<36} {:>3} days  {:<8} {}",
                rule.rule_name, rule.overdue_days, rule.status, rule.key
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_test_utils::{india, FakeBackend};
    use pretty_assertions::assert_eq;

    fn console(backend: FakeBackend) -> Console {
        Console::with_transport(
            ConsoleConfig::default(),
            Arc::new(AuthContext::new()),
            Arc::new(backend),
        )
    }

    async fn run(console: &Console, args: &[&str]) -> anyhow::Result<String> {
        let matches = command().try_get_matches_from(args)?;
        console.run(&matches).await
    }

    #[test]
    fn command_definition_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn repeated_select_collects_in_order() {
        let matches = command()
            .try_get_matches_from(["consolectl", "locations", "--select", "gj", "--select", "rk"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(selections(args), vec!["gj".to_string(), "rk".to_string()]);
    }

    #[tokio::test]
    async fn locations_marks_selection_and_scope() {
        let console = console(india());
        let out = run(&console, &["consolectl", "locations", "--select", "gj", "--select", "rk", "--select", "amr"])
            .await
            .unwrap();
        assert!(out.contains("* gj"));
        assert!(out.contains("  mh"));
        assert!(out.contains("* amr"));
        assert!(out.ends_with("Scope: Gujarat / Rajkot / Amreli\n"));
    }

    #[tokio::test]
    async fn unknown_location_is_an_error() {
        let console = console(india());
        let err = run(&console, &["consolectl", "locations", "--select", "xx"])
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("selecting 'xx'"));
    }

    #[tokio::test]
    async fn checklist_requires_full_chain() {
        let console = console(india());
        let err = run(&console, &["consolectl", "checklist", "--select", "gj"])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "select one option for each of the 3 levels");
    }

    #[tokio::test]
    async fn approvals_add_then_list() {
        let console = console(FakeBackend::new());
        let out = run(
            &console,
            &["consolectl", "approvals", "add", "--name", "Temporary Incharge Approval", "--days", "2", "--type", "quotation"],
        )
        .await
        .unwrap();
        assert!(out.starts_with("Created rule temporary_incharge_approval_"));

        let out = run(&console, &["consolectl", "approvals", "list", "--type", "quotation"])
            .await
            .unwrap();
        assert!(out.contains("Temporary Incharge Approval"));
        assert!(out.contains("2 days"));
        assert!(out.contains("Active"));

        let out = run(&console, &["consolectl", "approvals", "list", "--type", "discount"])
            .await
            .unwrap();
        assert_eq!(out, "No rules\n");
    }

    #[tokio::test]
    async fn approvals_add_rejects_zero_days() {
        let console = console(FakeBackend::new());
        let err = run(
            &console,
            &["consolectl", "approvals", "add", "--name", "x", "--days", "0", "--type", "quotation"],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Must be at least 1"));
    }

    #[tokio::test]
    async fn per_lead_price() {
        let console = console(FakeBackend::new());
        let out = run(&console, &["consolectl", "per-lead", "--total", "500", "--leads", "10"])
            .await
            .unwrap();
        assert_eq!(out, "50.00 per lead (10 leads for 500)");
        assert!(run(&console, &["consolectl", "per-lead", "--total", "500", "--leads", "0"])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn login_and_logout_use_the_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        let mut config = ConsoleConfig::default();
        config.auth.token_file = Some(path.clone());
        let auth = Arc::new(auth_context(&config).unwrap());
        let console = Console::with_transport(config, Arc::clone(&auth), Arc::new(FakeBackend::new()));

        run(&console, &["consolectl", "login", "--token", "abc"]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "abc");
        assert_eq!(auth.bearer().as_deref(), Some("Bearer abc"));

        run(&console, &["consolectl", "logout"]).await.unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn rule_table_pads_columns() {
        let rule = ApprovalRule {
            id: "r1".into(),
            key: "late_1".into(),
            rule_name: "Late".into(),
            overdue_days: 3,
            status: RuleStatus::Active,
            rule_type: "onboarding".into(),
        };
        assert_eq!(render_rules(&[]), "No rules\n");
        assert_eq!(
            render_rules(&[rule]),
            format!("{:<36}   3 days  Active   late_1\n", "Late")
        );
    }

    #[test]
    fn checklist_rendering() {
        use console_settings::{ChecklistCategory, ChecklistCompletion, ChecklistItem, ChecklistModule};

        assert_eq!(render_checklist(&ChecklistView::default()), "No checklist modules\n");

        let view = ChecklistView::assemble(
            vec![ChecklistCategory {
                id: "c1".into(),
                name: "Installation".into(),
            }],
            vec![ChecklistModule {
                id: "m1".into(),
                name: "Panel mounting".into(),
                category_id: "c1".into(),
                items: vec![ChecklistItem { name: "a".into() }; 4],
                cluster_id: None,
            }],
            &[ChecklistCompletion {
                module_id: "m1".into(),
                completed_count: 4,
                total_count: 4,
            }],
        );
        let out = render_checklist(&view);
        assert!(out.starts_with("Installation\n  [done] Panel mounting"));
        assert!(out.contains("100% (4/4)"));
    }
}
