//! Doorman CLI — terminal console for the Doorman API gateway.
//!
//! Each subcommand drives one `doorman-core` view against the management
//! API. The credential and preferences are kept in `~/.doorman/local.json`,
//! the last selected record of each family in `~/.doorman/session.json`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use doorman_core::logs::{self, LogEntry, LogFilter};
use doorman_core::metrics::{self, MetricsRange};
use doorman_core::models::{Api, Group, Role, Routing, User};
use doorman_core::password::{self, Strength};
use doorman_core::settings::Preferences;
use doorman_core::{
    ConsoleConfig, CreateView, DetailView, Draft, Entity, EntityKind, FileStore, KeyValueStore,
    ListView, ResourceClient, Route, Session, Theme, dashboard,
};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// Doorman — API gateway admin console.
#[derive(Parser)]
#[command(
    name = "doorman",
    version,
    about = "Doorman console — manage gateway APIs, routings, users, groups and roles",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         DOORMAN_URL           Management API origin (default: http://localhost:3002)\n  \
         DOORMAN_HOME          Console home directory (default: ~/.doorman)\n  \
         DOORMAN_PAGE_SIZE     Rows per list page (default: 10)\n  \
         DOORMAN_REFRESH_SECS  Credential refresh interval (default: 900)\n  \
         DOORMAN_TIMEOUT_SECS  Request timeout, 0 disables it (default: 0)\n  \
         DOORMAN_LOG_LEVEL     Log filter (default: warn)\n\n\
         {DIM}Examples:{RESET}\n  \
         doorman login --email admin@example.com\n  \
         doorman apis list --search orders --sort name\n  \
         doorman apis create --set api_name=orders --set api_version=v1 --set api_description='order service'\n  \
         doorman groups edit ops --add api_access=billing/v2 --remove api_access=0\n  \
         doorman apis delete orders/v1 --confirm orders"
    ),
)]
struct Cli {
    /// Management API origin.
    #[arg(long, env = "DOORMAN_URL")]
    url: Option<String>,

    /// Write logs to stderr as JSON lines.
    #[arg(long, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the credential.
    Login {
        /// Operator email address.
        #[arg(long)]
        email: String,
        /// Operator password.
        #[arg(long, env = "DOORMAN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Invalidate the credential and clear all client-side state.
    Logout,
    /// Check that the stored credential is still accepted.
    Status,
    /// Show request totals, active users and popular APIs.
    Dashboard,
    /// Search gateway request logs.
    Logs(LogArgs),
    /// Show gateway metrics for a time window.
    Metrics {
        /// Window: 1h, 24h, 7d or 30d.
        #[arg(long, default_value = "24h")]
        range: String,
    },
    /// Show console settings, or change the theme.
    Settings {
        /// New theme: light or dark.
        #[arg(long)]
        theme: Option<String>,
    },
    /// Score a password against the strength rules.
    Strength {
        /// Password to score.
        password: String,
    },
    /// Change a user's password.
    Passwd {
        /// User whose password changes.
        username: String,
        /// The user's current password.
        #[arg(long, env = "DOORMAN_CURRENT_PASSWORD", hide_env_values = true)]
        current_password: String,
        /// The new password.
        #[arg(long, env = "DOORMAN_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
        /// The new password again; must match exactly.
        #[arg(long, env = "DOORMAN_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm_password: Option<String>,
    },
    /// Manage proxied APIs (addressed as NAME/VERSION).
    Apis {
        #[command(subcommand)]
        action: ResourceCommands,
    },
    /// Manage client routings (addressed by client key).
    Routings {
        #[command(subcommand)]
        action: ResourceCommands,
    },
    /// Manage users (addressed by username).
    Users {
        #[command(subcommand)]
        action: ResourceCommands,
    },
    /// Manage groups (addressed by group name).
    Groups {
        #[command(subcommand)]
        action: ResourceCommands,
    },
    /// Manage roles (addressed by role name).
    Roles {
        #[command(subcommand)]
        action: ResourceCommands,
    },
}

#[derive(Subcommand)]
enum ResourceCommands {
    /// List one page of records.
    List {
        /// Page to fetch, starting at 1.
        #[arg(long, default_value = "1")]
        page: u32,
        /// Rows per page (default: DOORMAN_PAGE_SIZE).
        #[arg(long)]
        page_size: Option<u32>,
        /// Case-insensitive filter over the record's name fields.
        #[arg(long)]
        search: Option<String>,
        /// Sort the displayed rows by this field.
        #[arg(long)]
        sort: Option<String>,
        /// Select the displayed row at this index and show it.
        #[arg(long)]
        select: Option<usize>,
    },
    /// Show one record.
    Show {
        /// Record identifier.
        key: String,
    },
    /// Create a record.
    Create {
        #[command(flatten)]
        edits: EditArgs,
    },
    /// Change fields on a record.
    Edit {
        /// Record identifier.
        key: String,
        #[command(flatten)]
        edits: EditArgs,
    },
    /// Delete a record. The record's name must be typed exactly.
    Delete {
        /// Record identifier.
        key: String,
        /// The record's name, typed exactly.
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Args)]
struct EditArgs {
    /// Set a scalar field.
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    set: Vec<String>,
    /// Append an item to a list field.
    #[arg(long = "add", value_name = "FIELD=ITEM")]
    add: Vec<String>,
    /// Remove a list item by position. Positions refer to the list before
    /// any --add.
    #[arg(long = "remove", value_name = "FIELD=INDEX")]
    remove: Vec<String>,
    /// Put an entry into a map field.
    #[arg(long = "attr", value_name = "FIELD:KEY=VALUE")]
    attr: Vec<String>,
    /// Drop an entry from a map field.
    #[arg(long = "unset-attr", value_name = "FIELD:KEY")]
    unset_attr: Vec<String>,
}

impl EditArgs {
    fn is_empty(&self) -> bool {
        self.set.is_empty()
            && self.add.is_empty()
            && self.remove.is_empty()
            && self.attr.is_empty()
            && self.unset_attr.is_empty()
    }
}

#[derive(Args)]
struct LogArgs {
    /// First day, YYYY-MM-DD.
    #[arg(long)]
    start_date: Option<String>,
    /// Last day, YYYY-MM-DD.
    #[arg(long)]
    end_date: Option<String>,
    /// Start time, HH:MM.
    #[arg(long)]
    start_time: Option<String>,
    /// End time, HH:MM.
    #[arg(long)]
    end_time: Option<String>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    api: Option<String>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    request_id: Option<String>,
    #[arg(long)]
    group: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    status_code: Option<String>,
    /// HTTP method, e.g. GET.
    #[arg(long)]
    method: Option<String>,
    #[arg(long)]
    ip_address: Option<String>,
    /// Minimum response time in milliseconds.
    #[arg(long)]
    min_response_time: Option<String>,
    /// Maximum response time in milliseconds.
    #[arg(long)]
    max_response_time: Option<String>,
    #[arg(long)]
    protocol: Option<String>,
}

impl From<LogArgs> for LogFilter {
    fn from(args: LogArgs) -> Self {
        Self {
            start_date: args.start_date,
            end_date: args.end_date,
            start_time: args.start_time,
            end_time: args.end_time,
            user: args.user,
            api: args.api,
            endpoint: args.endpoint,
            request_id: args.request_id,
            group: args.group,
            role: args.role,
            status_code: args.status_code,
            method: args.method,
            ip_address: args.ip_address,
            min_response_time: args.min_response_time,
            max_response_time: args.max_response_time,
            protocol: args.protocol,
        }
    }
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

const fn kind_icon(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Api => "🔌",
        EntityKind::Routing => "🧭",
        EntityKind::User => "👤",
        EntityKind::Group => "👥",
        EntityKind::Role => "🎭",
    }
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => format!("{DIM}(unset){RESET}"),
        Some(Value::Bool(true)) => format!("{GREEN}yes{RESET}"),
        Some(Value::Bool(false)) => format!("{RED}no{RESET}"),
        Some(Value::String(s)) if s.is_empty() => format!("{DIM}(unset){RESET}"),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) if items.is_empty() => format!("{DIM}(none){RESET}"),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_owned))
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Object(map)) if map.is_empty() => format!("{DIM}(none){RESET}"),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| match v.as_str() {
                Some(s) => format!("{k}={s}"),
                None => format!("{k}={v}"),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

fn print_record<E: Entity>(record: &E) -> Result<()> {
    header(
        kind_icon(E::KIND),
        &format!("{} {}", E::KIND.label(), record.identifier()),
    );
    let value = serde_json::to_value(record).context("failed to render record")?;
    for spec in E::SCHEMA.iter().filter(|f| !f.write_only) {
        kv_line(spec.name, &render_value(value.get(spec.name)));
    }
    println!();
    Ok(())
}

fn print_list<E: Entity>(view: &ListView<E>) {
    header(
        kind_icon(E::KIND),
        &format!(
            "{} · page {} ({} per page)",
            E::KIND.plural(),
            view.page(),
            view.page_size()
        ),
    );
    if let Some(term) = view.search_term() {
        kv_line("Search", term);
    }
    if let Some(field) = view.sort_field() {
        kv_line("Sorted by", field);
    }

    let rows = view.displayed();
    if rows.is_empty() {
        println!("  {DIM}(no {}){RESET}", E::KIND.plural());
    }
    for (index, record) in rows.iter().enumerate() {
        let id = record.identifier();
        let extra = record
            .search_fields()
            .into_iter()
            .filter(|f| !f.is_empty() && *f != id && *f != record.primary_name())
            .collect::<Vec<_>>()
            .join(" · ");
        println!("  {CYAN}{index:>3}{RESET}  {BOLD}{id}{RESET}  {DIM}{extra}{RESET}");
    }
    println!();
    println!("  {DIM}{} of {} shown{RESET}", rows.len(), view.all().len());
    println!();
}

fn print_log_entry(entry: &LogEntry) {
    let color = match entry.level.to_lowercase().as_str() {
        "error" | "critical" => RED,
        "warning" | "warn" => YELLOW,
        "info" => GREEN,
        _ => DIM,
    };
    let method = entry.method.as_deref().unwrap_or("-");
    let endpoint = entry.endpoint.as_deref().unwrap_or("-");
    let status = entry
        .status_code
        .map_or_else(|| "-".to_owned(), |s| s.to_string());
    println!(
        "  {DIM}{}{RESET} {color}{:<7}{RESET} {MAGENTA}{method}{RESET} {endpoint} {BOLD}{status}{RESET}  {}",
        entry.timestamp, entry.level, entry.message
    );
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ConsoleConfig::load().context("failed to load configuration")?;
    if let Some(url) = cli.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        config.base_url = url.trim_end_matches('/').to_owned();
    }
    init_tracing(&config.log_level, cli.log_json);

    let local: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.local_store_path()));
    let selections: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.session_store_path()));
    Preferences::new(local.as_ref())
        .apply(&mut config)
        .await
        .context("failed to read preferences")?;

    let session = Session::open(&config, local, selections).await?;
    debug!(url = %config.base_url, home = %config.home_dir.display(), "console ready");

    dispatch(&session, &config, cli.command).await?;
    session
        .persist()
        .await
        .context("failed to save the credential")
}

async fn dispatch(session: &Session, config: &ConsoleConfig, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Login { email, password } => cmd_login(session, &email, &password).await,
        Commands::Logout => cmd_logout(session).await,
        Commands::Status => cmd_status(session, config).await,
        Commands::Dashboard => cmd_dashboard(session).await,
        Commands::Logs(args) => cmd_logs(session, args.into()).await,
        Commands::Metrics { range } => cmd_metrics(session, &range).await,
        Commands::Settings { theme } => cmd_settings(session, config, theme.as_deref()).await,
        Commands::Strength { password } => {
            cmd_strength(&password);
            Ok(())
        }
        Commands::Passwd {
            username,
            current_password,
            new_password,
            confirm_password,
        } => {
            cmd_passwd(
                session,
                &username,
                &current_password,
                &new_password,
                confirm_password.as_deref(),
            )
            .await
        }
        Commands::Apis { action } => cmd_resource::<Api>(session, config, action).await,
        Commands::Routings { action } => cmd_resource::<Routing>(session, config, action).await,
        Commands::Users { action } => cmd_resource::<User>(session, config, action).await,
        Commands::Groups { action } => cmd_resource::<Group>(session, config, action).await,
        Commands::Roles { action } => cmd_resource::<Role>(session, config, action).await,
    }
}

// ── Session commands ─────────────────────────────────────────────────

async fn cmd_login(session: &Session, email: &str, password: &str) -> Result<()> {
    session.login(email, password).await?;
    println!();
    success(&format!("Logged in as {BOLD}{email}{RESET}"));
    kv_line("Management API", session.client().base_url());
    kv_line("Next", &Route::Dashboard.to_string());
    println!();
    Ok(())
}

async fn cmd_logout(session: &Session) -> Result<()> {
    session.logout().await?;
    success("Logged out — credential and cached selections cleared");
    Ok(())
}

async fn cmd_status(session: &Session, config: &ConsoleConfig) -> Result<()> {
    let status = session.client().status().await?;
    println!();
    header("🔐", "Session");
    kv_line("Management API", &config.base_url);
    kv_line("Status", &format!("{GREEN}{status}{RESET}"));
    if let Some(credential) = session.client().credential().await {
        kv_line("Issued at", &credential.issued_at.to_rfc3339());
    }
    println!();
    Ok(())
}

async fn cmd_passwd(
    session: &Session,
    username: &str,
    current_password: &str,
    new_password: &str,
    confirm_password: Option<&str>,
) -> Result<()> {
    if let Some(confirmation) = confirm_password {
        password::require_confirmed(new_password, confirmation)?;
    }
    ResourceClient::<User>::new(session.client())
        .update_password(username, current_password, new_password)
        .await?;
    success(&format!("Password updated for {BOLD}{username}{RESET}"));
    Ok(())
}

fn cmd_strength(candidate: &str) {
    let assessment = password::assess(candidate);
    let color = match assessment.strength {
        Strength::Weak => RED,
        Strength::Medium => YELLOW,
        Strength::Strong => GREEN,
    };
    println!();
    header("🔑", "Password strength");
    kv_line("Score", &format!("{color}{}/5{RESET}", assessment.score));
    kv_line("Verdict", &format!("{color}{}{RESET}", assessment.strength.message()));
    println!();
}

// ── Overview commands ────────────────────────────────────────────────

async fn cmd_dashboard(session: &Session) -> Result<()> {
    let summary = dashboard::fetch(session.client()).await?;
    println!();
    header("📊", "Dashboard");
    kv_line("Total requests", &summary.total_requests.to_string());
    kv_line("Active users", &summary.active_users.to_string());
    kv_line("New APIs", &summary.new_apis.to_string());
    kv_line("Monthly usage", &summary.monthly_usage.to_string());

    println!();
    println!("  {BOLD}Popular APIs{RESET}");
    if summary.popular_apis.is_empty() {
        println!("  {DIM}(none){RESET}");
    }
    for api in &summary.popular_apis {
        println!(
            "  {CYAN}├─{RESET} {} {DIM}{}{RESET}  {} requests · {} subscribers",
            api.name, api.version, api.requests, api.subscribers
        );
    }

    println!();
    println!("  {BOLD}Active users{RESET}");
    if summary.active_users_list.is_empty() {
        println!("  {DIM}(none){RESET}");
    }
    for user in &summary.active_users_list {
        println!("  {CYAN}├─{RESET} {} {DIM}{}{RESET}", user.name, user.email);
    }
    println!();
    Ok(())
}

async fn cmd_logs(session: &Session, filter: LogFilter) -> Result<()> {
    let entries = logs::search(session.client(), &filter).await?;
    println!();
    header("📜", &format!("Logs ({} entries)", entries.len()));
    for (key, value) in filter.query() {
        kv_line(key, &value);
    }
    if entries.is_empty() {
        println!("  {DIM}(no matching entries){RESET}");
    }
    for entry in &entries {
        print_log_entry(entry);
    }
    println!();
    Ok(())
}

async fn cmd_metrics(session: &Session, range: &str) -> Result<()> {
    let range: MetricsRange = range.parse()?;
    let data = metrics::fetch(session.client(), range).await?;
    println!();
    header("📈", &format!("Metrics · last {range}"));
    for (name, samples) in data.series() {
        let Some(latest) = samples.last() else {
            kv_line(name, &format!("{DIM}(no data){RESET}"));
            continue;
        };
        let peak = samples.iter().map(|s| s.value).fold(f64::MIN, f64::max);
        kv_line(
            name,
            &format!(
                "{:.2} {DIM}(peak {peak:.2}, {} samples){RESET}",
                latest.value,
                samples.len()
            ),
        );
    }
    if !data.status_codes.is_empty() {
        println!();
        println!("  {BOLD}Status codes{RESET}");
        for (code, count) in &data.status_codes {
            kv_line(code, &count.to_string());
        }
    }
    println!();
    Ok(())
}

async fn cmd_settings(session: &Session, config: &ConsoleConfig, theme: Option<&str>) -> Result<()> {
    if let Some(raw) = theme {
        let theme: Theme = raw.parse()?;
        Preferences::new(session.local_store().as_ref())
            .set_theme(theme)
            .await?;
        success(&format!("Theme set to {BOLD}{theme}{RESET}"));
        return Ok(());
    }

    let logged_in = session.client().credential().await.is_some();
    println!();
    header("⚙", "Settings");
    kv_line("Management API", &config.base_url);
    kv_line("Home", &config.home_dir.display().to_string());
    kv_line("Page size", &config.page_size.to_string());
    kv_line(
        "Refresh every",
        &format!("{}s", config.refresh_interval.as_secs()),
    );
    kv_line(
        "Request timeout",
        &config
            .request_timeout
            .map_or_else(|| "none".to_owned(), |d| format!("{}s", d.as_secs())),
    );
    kv_line("Log level", &config.log_level);
    kv_line("Theme", &config.theme.to_string());
    kv_line(
        "Logged in",
        &if logged_in {
            format!("{GREEN}yes{RESET}")
        } else {
            format!("{RED}no{RESET}")
        },
    );
    println!();
    Ok(())
}

// ── Resource commands ────────────────────────────────────────────────

async fn cmd_resource<E: Entity>(
    session: &Session,
    config: &ConsoleConfig,
    action: ResourceCommands,
) -> Result<()> {
    let api = ResourceClient::<E>::new(session.client());
    let cache = session.cache();

    match action {
        ResourceCommands::List {
            page,
            page_size,
            search,
            sort,
            select,
        } => {
            let mut view = ListView::<E>::new(page_size.unwrap_or(config.page_size));
            view.set_page(page);
            view.load(&api).await?;
            if let Some(term) = search {
                view.search(&term);
            }
            if let Some(field) = sort {
                view.sort(&field)?;
            }
            let Some(index) = select else {
                println!();
                print_list(&view);
                return Ok(());
            };
            let route = view.select(index, cache).await?;
            if let Some(record) = view.displayed().get(index) {
                println!();
                print_record(record)?;
                kv_line("Route", &route.to_string());
                println!();
            }
            Ok(())
        }
        ResourceCommands::Show { key } => {
            let view = DetailView::<E>::open(&key, &api, cache).await?;
            println!();
            print_record(view.record())
        }
        ResourceCommands::Create { edits } => {
            let mut view = CreateView::<E>::new();
            apply_edits(view.draft_mut(), &edits)?;
            let route = view.submit(&api).await?;
            println!();
            success(&format!("{} created", E::KIND.label()));
            kv_line("Next", &route.to_string());
            println!();
            Ok(())
        }
        ResourceCommands::Edit { key, edits } => {
            if edits.is_empty() {
                bail!("nothing to change — pass --set, --add, --remove, --attr or --unset-attr");
            }
            let mut view = DetailView::<E>::open(&key, &api, cache).await?;
            view.edit()?;
            apply_edits(view.draft_mut()?, &edits)?;
            view.save(&api, cache).await?;
            println!();
            success(&format!("{} {} saved", E::KIND.label(), view.record().identifier()));
            println!();
            print_record(view.record())
        }
        ResourceCommands::Delete { key, confirm } => {
            let mut view = DetailView::<E>::open(&key, &api, cache).await?;
            view.edit()?;
            view.begin_delete()?;
            view.type_confirmation(&confirm)?;
            let route = view.confirm_delete(&api, cache).await?;
            println!();
            success(&format!(
                "{} {} deleted",
                E::KIND.label(),
                view.record().identifier()
            ));
            kv_line("Next", &route.to_string());
            println!();
            Ok(())
        }
    }
}

/// Apply command-line edits to a draft: removals first (highest index
/// first, so positions refer to the original list; a repeated position is
/// removed once), then map removals, appends, scalar sets and map puts.
fn apply_edits(draft: &mut Draft, edits: &EditArgs) -> Result<()> {
    let mut removals = edits
        .remove
        .iter()
        .map(|raw| -> Result<(&str, usize)> {
            let (field, index) = split_pair(raw, '=', "FIELD=INDEX")?;
            let index = index
                .trim()
                .parse::<usize>()
                .map_err(|_| anyhow!("invalid index in '{raw}'"))?;
            Ok((field, index))
        })
        .collect::<Result<Vec<_>>>()?;
    removals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    removals.dedup();
    for (field, index) in removals {
        let removed = draft.remove(field, index)?;
        debug!(field, index, %removed, "list item removed");
    }

    for raw in &edits.unset_attr {
        let (field, key) = split_pair(raw, ':', "FIELD:KEY")?;
        if !draft.remove_entry(field, key)? {
            warning(&format!("'{field}' has no key '{key}'"));
        }
    }
    for raw in &edits.add {
        let (field, item) = split_pair(raw, '=', "FIELD=ITEM")?;
        draft.push(field, item)?;
    }
    for raw in &edits.set {
        let (field, value) = split_pair(raw, '=', "FIELD=VALUE")?;
        draft.set(field, value)?;
    }
    for raw in &edits.attr {
        let (field, entry) = split_pair(raw, ':', "FIELD:KEY=VALUE")?;
        let (key, value) = split_pair(entry, '=', "FIELD:KEY=VALUE")?;
        draft.put_entry(field, key, value)?;
    }
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────

fn split_pair<'a>(raw: &'a str, sep: char, shape: &str) -> Result<(&'a str, &'a str)> {
    raw.split_once(sep)
        .map(|(field, rest)| (field.trim(), rest))
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| anyhow!("invalid {shape} pair: '{raw}'"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use doorman_core::models::Group;
    use serde_json::json;

    use super::*;

    fn edits(remove: &[&str], add: &[&str]) -> EditArgs {
        EditArgs {
            set: Vec::new(),
            add: add.iter().map(|s| (*s).to_owned()).collect(),
            remove: remove.iter().map(|s| (*s).to_owned()).collect(),
            attr: Vec::new(),
            unset_attr: Vec::new(),
        }
    }

    fn ops_draft() -> Draft {
        let group = Group {
            group_name: "ops".into(),
            group_description: String::new(),
            api_access: vec!["a/v1".into(), "b/v1".into(), "c/v1".into(), "d/v1".into()],
        };
        Draft::from_record(Group::KIND, Group::SCHEMA, &group).unwrap()
    }

    #[test]
    fn repeated_removal_removes_one_item() {
        let mut draft = ops_draft();
        apply_edits(&mut draft, &edits(&["api_access=1", "api_access=1"], &[])).unwrap();
        assert_eq!(draft.get("api_access"), Some(&json!(["a/v1", "c/v1", "d/v1"])));
    }

    #[test]
    fn removals_use_original_positions_before_appends() {
        let mut draft = ops_draft();
        apply_edits(
            &mut draft,
            &edits(&["api_access=0", "api_access=2"], &["api_access=billing/v2"]),
        )
        .unwrap();
        assert_eq!(
            draft.get("api_access"),
            Some(&json!(["b/v1", "d/v1", "billing/v2"]))
        );
    }

    #[test]
    fn malformed_index_is_rejected() {
        let mut draft = ops_draft();
        let err = apply_edits(&mut draft, &edits(&["api_access=first"], &[])).unwrap_err();
        assert!(err.to_string().contains("invalid index"), "{err}");
    }
}
