//! Institution Insights - institution dashboard analytics from the terminal
//!
//! A CLI tool that signs in to the institution dashboard backend, lists
//! the institutions an administrator manages and renders categorized
//! exam, quiz and project analytics as Markdown or JSON.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, authentication, config, etc.)

mod analysis;
mod api;
mod cli;
mod config;
mod listing;
mod models;
mod report;
mod session;

use anyhow::{Context, Result};
use api::{ApiClient, ApiError};
use cli::{Args, Command, OutputFormat, MAX_PAGE_LIMIT};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use listing::InstitutionPager;
use models::{FilterState, LabelStyle, LoginRequest, RegisterRequest, Window};
use report::ReportOptions;
use session::TokenStore;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `[general] verbose` applies
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("Institution Insights v{}", env!("CARGO_PKG_VERSION"));
    origin.log();
    debug!("Arguments: {:?}", redacted(&args));

    if let Err(e) = run(args, config).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        if let Some(api_error) = e.downcast_ref::<ApiError>() {
            if api_error.is_unauthorized() && !matches!(api_error, ApiError::NotAuthenticated) {
                eprintln!("   Run `insights login` to start a new session.");
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .insights.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the API URL, token storage, paging, and reports.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Copy of the arguments that is safe to log.
fn redacted(args: &Args) -> Args {
    let mut args = args.clone();
    match &mut args.command {
        Some(Command::Login { password, .. }) | Some(Command::Register { password, .. }) => {
            *password = "***".to_string();
        }
        _ => {}
    }
    args
}

/// Build the shared client and dispatch the command.
async fn run(args: Args, config: Config) -> Result<()> {
    let tokens = TokenStore::from_config(&config.session)?;
    debug!("Session token at {}", tokens.path().display());
    let client = ApiClient::new(&config.api, tokens)?;

    let Some(command) = args.command.clone() else {
        return Ok(());
    };

    match command {
        Command::Login { email, password } => {
            let payload = client.login(&LoginRequest { email, password }).await?;
            println!(
                "✅ Signed in as {} {} <{}>",
                payload.admin.first_name, payload.admin.last_name, payload.admin.email
            );
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
        } => {
            let request = RegisterRequest::new(first_name, last_name, email, password);
            let payload = client.register(&request).await?;
            println!(
                "✅ Registered {} {} <{}>",
                payload.admin.first_name, payload.admin.last_name, payload.admin.email
            );
        }
        Command::Logout => {
            client.logout()?;
            println!("👋 Signed out.");
        }
        Command::Whoami => handle_whoami(&client),
        Command::Institutions { search, all, .. } => {
            handle_institutions(&client, &config, search.as_deref(), all).await?;
        }
        Command::Stats {
            institution_id,
            grade,
            section,
            today,
            output,
            ..
        } => {
            let window = if today { Window::Today } else { Window::AllTime };
            let request = StatsRequest {
                institution_id,
                grade,
                section,
                window,
                output,
            };
            handle_stats(&client, &config, request, args.quiet).await?;
        }
    }

    Ok(())
}

fn handle_whoami(client: &ApiClient) {
    if !client.is_authenticated() {
        println!("Not signed in.");
        return;
    }

    match client.user_info() {
        Some(user) => println!("{} {} <{}>", user.first_name, user.last_name, user.email),
        None => println!("Signed in (profile not available from the session token)."),
    }
}

async fn handle_institutions(
    client: &ApiClient,
    config: &Config,
    search: Option<&str>,
    all: bool,
) -> Result<()> {
    let signed_in = client.is_authenticated();
    let mut pager = InstitutionPager::new(client, config.listing.page, config.listing.limit)
        .with_enabled(signed_in);

    let fetched = if all {
        if pager.set_limit(MAX_PAGE_LIMIT) {
            debug!("Walking all pages, {} at a time", pager.limit());
        }
        pager.fetch_all().await?
    } else {
        pager.refetch().await?
    };

    if !signed_in {
        warn!("Not signed in; run `insights login` to list your institutions");
    }
    if let Some(e) = pager.error() {
        eprintln!("⚠️  Listing is incomplete: {}", e);
    }

    let institutions = match search {
        Some(term) => listing::search(&fetched, term),
        None => fetched.iter().collect(),
    };
    info!(
        "Showing {} of {} fetched institutions (through page {})",
        institutions.len(),
        fetched.len(),
        pager.page()
    );

    let pagination = pager.pagination();
    let rendered = match config.report.format {
        OutputFormat::Json => report::generate_institutions_json(&institutions, &pagination)?,
        OutputFormat::Markdown => {
            report::generate_institutions_markdown(&institutions, &pagination)
        }
    };
    println!("{}", rendered);

    Ok(())
}

struct StatsRequest {
    institution_id: String,
    grade: Option<String>,
    section: Option<String>,
    window: Window,
    output: Option<PathBuf>,
}

async fn handle_stats(
    client: &ApiClient,
    config: &Config,
    request: StatsRequest,
    quiet: bool,
) -> Result<()> {
    let spinner = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Fetching analytics for {}", request.institution_id));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let result = client.get_institution_stats(&request.institution_id).await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let stats = result?;

    if request.window == Window::Today && stats.assigned_today.is_none() {
        warn!("No per-day counts in the analytics payload; today's totals will be empty");
    }

    let filter = FilterState::resolve(
        &stats.breakdown,
        request.grade.as_deref(),
        request.section.as_deref(),
    );
    if let Some(section) = &filter.section {
        if section.grade_name.is_none() {
            warn!("Section {} not found in the grade breakdown", section.section_id);
        }
    }

    let options = ReportOptions {
        filter,
        window: request.window,
        labels: if config.report.short_labels {
            LabelStyle::Short
        } else {
            LabelStyle::Full
        },
        api_base_url: client.base_url().to_string(),
    };
    let analytics = report::build_analytics_report(&request.institution_id, &stats, &options);

    let rendered = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&analytics)?,
        OutputFormat::Markdown => report::generate_markdown_report(&analytics),
    };

    match &request.output {
        Some(path) => {
            report::write_output(&rendered, path)?;
            if !quiet {
                println!("\n📊 Analytics Summary ({}):", analytics.metadata.scope);
                for breakdown in &analytics.breakdowns {
                    println!(
                        "   {}",
                        analysis::summary_text(breakdown.kind, &breakdown.totals)
                    );
                }
                println!("\n✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Where the configuration came from, logged once logging is up.
enum ConfigOrigin {
    Explicit(PathBuf),
    DefaultFile,
    Builtin,
    Fallback(String),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE_NAME),
            ConfigOrigin::Builtin => debug!("No config file found, using defaults"),
            ConfigOrigin::Fallback(e) => warn!("Failed to load config: {}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Builtin)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Fallback(format!("{:#}", e)))),
    }
}
