//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use uuid::Uuid;

use leadline_core::IntakeService;
use leadline_document::render_application_pdf;
use leadline_http::AppState;
use leadline_shared::{
    AppConfig, LeadlineError, LifeInsuranceApplication, Submission, init_config, load_config,
    load_config_from,
};
use leadline_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Leadline: route website form submissions into Pipedrive.
#[derive(Parser)]
#[command(
    name = "leadline",
    version,
    about = "Route website lead submissions into Pipedrive and render application documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.leadline/leadline.toml).
    #[arg(long, global = true, env = "LEADLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the submission function and document download over HTTP.
    Serve {
        /// Bind address (overrides `[server] bind`).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Process one submission JSON file, as if it were POSTed.
    Submit {
        /// Path to the submission JSON.
        file: PathBuf,
    },

    /// Render a life-insurance application to PDF.
    Render {
        /// Id of a stored application.
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        id: Option<String>,

        /// A `life_insurance_application` submission JSON to render directly.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output directory.
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Stored applications.
    Applications {
        #[command(subcommand)]
        action: ApplicationsAction,
    },

    /// Show the most recent processed submissions.
    Log {
        /// Number of entries.
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ApplicationsAction {
    /// List stored applications, newest first.
    List {
        #[arg(short, long, default_value = "50")]
        limit: u32,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leadline=info,tower_http=info",
        1 => "leadline=debug,tower_http=debug",
        _ => "leadline=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Serve { bind } => cmd_serve(config_path, bind).await,
        Command::Submit { file } => cmd_submit(config_path, &file).await,
        Command::Render { id, file, out } => {
            cmd_render(config_path, id.as_deref(), file.as_deref(), &out).await
        }
        Command::Applications { action } => match action {
            ApplicationsAction::List { limit } => cmd_applications_list(config_path, limit).await,
        },
        Command::Log { limit } => cmd_log(config_path, limit).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

async fn open_storage(config: &AppConfig) -> Result<Arc<Storage>> {
    let db_path = PathBuf::from(&config.server.db_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LeadlineError::io(parent, e))?;
    }
    Ok(Arc::new(Storage::open(&db_path).await?))
}

async fn intake(config: &AppConfig) -> Result<IntakeService> {
    let storage = open_storage(config).await?;
    Ok(IntakeService::from_config(config)?.with_storage(storage))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(config_path: Option<&Path>, bind: Option<String>) -> Result<()> {
    let config = config(config_path)?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let state = AppState::new(intake(&config).await?, config.document.clone());

    info!(%bind, db = %config.server.db_path, "starting leadline server");
    leadline_http::serve(&bind, state).await?;
    Ok(())
}

async fn cmd_submit(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let config = config(config_path)?;
    let raw = std::fs::read_to_string(file).map_err(|e| LeadlineError::io(file, e))?;
    let submission: Submission = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("{} is not a valid submission", file.display()))?;

    let service = intake(&config).await?;
    let receipt = service.process(submission).await?;

    // A one-shot process would exit before a detached send finishes.
    if let Some(handle) = receipt.notification {
        handle.await.wrap_err("notification task panicked")?;
    }

    let outcome = &receipt.outcome;
    println!();
    println!("  Submission processed");
    println!("  Type:    {}", outcome.record_type.as_str());
    println!("  Person:  {} ({:?})", outcome.person_id, outcome.matched_by);
    match &outcome.record_id {
        Some(record) => println!("  Record:  {record}"),
        None => println!("  Record:  not created"),
    }
    if let Some(id) = &receipt.application_id {
        println!("  Stored:  application {id}");
    }
    for warning in &outcome.warnings {
        println!("  Warning: {warning}");
    }
    println!();
    Ok(())
}

async fn cmd_render(
    config_path: Option<&Path>,
    id: Option<&str>,
    file: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let config = config(config_path)?;

    let app = match (id, file) {
        (Some(id), _) => open_storage(&config)
            .await?
            .get_application(id)
            .await?
            .ok_or_else(|| eyre!("no application with id {id}"))?,
        (None, Some(file)) => application_from_file(file)?,
        (None, None) => return Err(eyre!("pass --id or --file")),
    };

    let rendered = render_application_pdf(&app, &config.document)?;
    std::fs::create_dir_all(out).map_err(|e| LeadlineError::io(out, e))?;
    let path = out.join(&rendered.filename);
    std::fs::write(&path, &rendered.bytes).map_err(|e| LeadlineError::io(&path, e))?;

    println!(
        "Rendered {} ({} pages) to {}",
        app.display_name(),
        rendered.pages,
        path.display()
    );
    Ok(())
}

/// Read a `life_insurance_application` submission and give it a fresh id.
fn application_from_file(file: &Path) -> Result<LifeInsuranceApplication> {
    let raw = std::fs::read_to_string(file).map_err(|e| LeadlineError::io(file, e))?;
    let submission: Submission = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("{} is not a valid submission", file.display()))?;

    let kind = submission.kind();
    let Submission::LifeInsuranceApplication(q) = submission else {
        return Err(eyre!(
            "only life_insurance_application submissions can be rendered, got {kind}"
        ));
    };
    Ok(LifeInsuranceApplication {
        id: Uuid::now_v7().to_string(),
        created_at: Utc::now(),
        applicant_name: q.applicant_name,
        applicant_email: q.applicant_email,
        applicant_phone: q.applicant_phone,
        form_data: q.form_data.unwrap_or_default(),
    })
}

async fn cmd_applications_list(config_path: Option<&Path>, limit: u32) -> Result<()> {
    let config = config(config_path)?;
    let storage = open_storage(&config).await?;
    let apps = storage.list_applications(limit).await?;

    if apps.is_empty() {
        println!("No stored applications.");
        return Ok(());
    }
    for app in apps {
        println!(
            "{}  {}  {:<28}  {}",
            app.id,
            app.created_at.format("%Y-%m-%d %H:%M"),
            app.applicant_name.as_deref().unwrap_or("-"),
            app.applicant_email.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

async fn cmd_log(config_path: Option<&Path>, limit: u32) -> Result<()> {
    let config = config(config_path)?;
    let storage = open_storage(&config).await?;

    for entry in storage.recent_submissions(limit).await? {
        let record = match (&entry.record_type, &entry.record_id) {
            (Some(kind), Some(id)) => format!("{kind} {id}"),
            (Some(kind), None) => format!("{kind} (not created)"),
            _ => "aborted".to_string(),
        };
        println!(
            "{}  {:<28}  {:<24}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.kind,
            entry.contact_name,
            record
        );
        if let Some(error) = &entry.error {
            println!("    ! {error}");
        }
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_render_by_id() {
        let cli = Cli::try_parse_from(["leadline", "render", "--id", "abc", "--out", "out"]).unwrap();
        match cli.command {
            Command::Render { id, file, out } => {
                assert_eq!(id.as_deref(), Some("abc"));
                assert!(file.is_none());
                assert_eq!(out, PathBuf::from("out"));
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn render_requires_a_source() {
        assert!(Cli::try_parse_from(["leadline", "render"]).is_err());
        assert!(Cli::try_parse_from(["leadline", "render", "--id", "a", "--file", "b"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["leadline", "serve", "-vv", "--log-format", "json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
    }

    #[test]
    fn application_file_gets_fresh_id() {
        let path = std::env::temp_dir().join(format!("leadline_test_{}.json", Uuid::now_v7()));
        std::fs::write(
            &path,
            r#"{"submission_type":"life_insurance_application","applicant_name":"Ava Reyes"}"#,
        )
        .unwrap();
        let app = application_from_file(&path).unwrap();
        assert_eq!(app.display_name(), "Ava Reyes");
        assert!(!app.id.is_empty());

        std::fs::write(&path, r#"{"submission_type":"contact"}"#).unwrap();
        assert!(application_from_file(&path).is_err());
    }
}
