//! applist: command-line client for the app list.
//!
//! Reads the cached catalog and the sessions last reported by the backend
//! from the storage root (`~/.applist`, or `$APPLIST_HOME`), decides what a
//! selection means and dispatches at most one command per invocation.
//!
//! Commands go to the unix socket named in `config.json`, or as one JSON line
//! to stdout when none is configured. Everything meant for a person goes to
//! stderr.
//!
//! ## Subcommands
//!
//! - `list`: Show the catalog grouped by category
//! - `select`: Select an app (restart, launch or ask for credentials)
//! - `credentials`: Submit credentials and launch
//! - `details`: Show one app
//! - `stop`: Stop an app's session
//! - `refresh`: Refresh the catalog from a source file and wait for it
//! - `set-transport`: Change the remembered transport for an app

mod context;
mod logging;

use std::io::{self, Write};
use std::path::PathBuf;

use applist_core::{
    build_list_items, AppListError, AppsListItem, ContextOutcome, CredentialError,
    CredentialForm, MenuAction, RefreshStatus, SelectionAction, StorageConfig, SubmitOutcome,
    TransportType,
};
use clap::{Parser, Subcommand};

use crate::context::Context;

#[derive(Parser)]
#[command(name = "applist")]
#[command(about = "Select, launch and stop remote apps")]
#[command(version)]
struct Cli {
    /// Behave as if the required system permissions were not granted
    #[arg(long, global = true)]
    no_permissions: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog grouped by category
    List,

    /// Select an app as if it was tapped in the list
    Select {
        #[arg(value_name = "APP")]
        app: String,
    },

    /// Submit credentials for an app and launch it
    Credentials {
        #[arg(value_name = "APP")]
        app: String,

        #[arg(long)]
        login: String,

        #[arg(long)]
        password: String,

        /// Display/control (VNC) password, at most 8 characters
        #[arg(long)]
        secondary_password: String,

        /// Transport to remember for this app (ssh or vnc)
        #[arg(long)]
        transport: TransportType,
    },

    /// Show an app's details
    Details {
        #[arg(value_name = "APP")]
        app: String,
    },

    /// Stop an app's session
    Stop {
        #[arg(value_name = "APP")]
        app: String,
    },

    /// Refresh the catalog and wait until the refresh settles
    Refresh {
        /// Catalog JSON to refresh from
        #[arg(long, value_name = "PATH")]
        source: PathBuf,
    },

    /// Change the transport remembered for an app
    SetTransport {
        #[arg(value_name = "APP")]
        app: String,

        #[arg(value_name = "TRANSPORT")]
        transport: TransportType,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] AppListError),

    #[error("credentials rejected: {0}")]
    Rejected(CredentialError),

    /// The notice explaining why was already shown.
    #[error("cannot launch '{0}' now")]
    LaunchRefused(String),

    #[error("catalog refresh failed")]
    RefreshFailed,

    #[error("output error: {0}")]
    Output(#[from] io::Error),

    #[error("could not render app: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Rejected(_) => 2,
            CliError::LaunchRefused(_) => 3,
            _ => 1,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let storage = StorageConfig::default();
    let _logging_guard = logging::init(&storage.logs_dir());

    let source = match &cli.command {
        Commands::Refresh { source } => Some(source.clone()),
        _ => None,
    };

    let result = Context::open(storage, !cli.no_permissions, source)
        .and_then(|ctx| run(&ctx, cli.command, &mut io::stdout()));

    if let Err(e) = result {
        tracing::error!(error = %e, "applist failed");
        eprintln!("applist: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(ctx: &Context, command: Commands, out: &mut dyn Write) -> Result<(), CliError> {
    let coordinator = &ctx.coordinator;
    tracing::debug!(root = %ctx.storage.root().display(), "Using storage root");

    match command {
        Commands::List => {
            let snapshot = coordinator.snapshot();
            if snapshot.catalog_is_empty() {
                eprintln!("No apps yet. Run `applist refresh --source <PATH>` to fetch the catalog.");
                return Ok(());
            }
            for item in build_list_items(snapshot.apps.clone()) {
                match item {
                    AppsListItem::Separator { category } => writeln!(out, "── {} ──", category)?,
                    AppsListItem::AppEntry { app } => {
                        let marker = if snapshot.session_for(&app.name).is_some() {
                            " (running)"
                        } else {
                            ""
                        };
                        writeln!(out, "  {}{}", app.name, marker)?;
                    }
                }
            }
        }

        Commands::Select { app } => {
            let decision = coordinator.select_by_name(&app)?;
            tracing::debug!(reason = %decision.reason, "Selection resolved");
            match decision.action {
                SelectionAction::RestartSession { session } => {
                    eprintln!("Restarting session '{}'", session.name)
                }
                SelectionAction::LaunchWithKnownTransport { app, transport } => {
                    eprintln!("Launching '{}' over {}", app.name, transport)
                }
                SelectionAction::RequireCredentials { app } => eprintln!(
                    "No transport stored for '{}'. Run `applist credentials {} --login .. --password .. --secondary-password .. --transport ssh|vnc`.",
                    app.name, app.name
                ),
                // Notices were already shown.
                SelectionAction::PermissionsRequired
                | SelectionAction::RejectDuplicate
                | SelectionAction::Handled => {}
            }
        }

        Commands::Credentials {
            app,
            login,
            password,
            secondary_password,
            transport,
        } => {
            let snapshot = coordinator.snapshot();
            let app = snapshot
                .find_app(&app)
                .cloned()
                .ok_or(AppListError::AppNotFound(app))?;
            let name = app.name.clone();
            let prompt = coordinator
                .begin_credentials(app)
                .ok_or(CliError::LaunchRefused(name))?;
            let form = CredentialForm {
                login,
                password,
                secondary_password,
                transport,
            };
            match coordinator.submit_credentials(prompt, form)? {
                SubmitOutcome::Launched { app, transport } => {
                    eprintln!("Launching '{}' over {}", app.name, transport)
                }
                SubmitOutcome::Rejected { prompt, error } => {
                    coordinator.cancel_credentials(prompt);
                    return Err(CliError::Rejected(error));
                }
                SubmitOutcome::Refused { app, .. } => {
                    return Err(CliError::LaunchRefused(app.name));
                }
            }
        }

        Commands::Details { app } => {
            if let ContextOutcome::ShowDetails { app } =
                coordinator.context_action(&entry(ctx, &app)?, MenuAction::ShowDetails)
            {
                let snapshot = coordinator.snapshot();
                let rendered = serde_json::json!({
                    "app": app,
                    "session": snapshot.session_for(&app.name),
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&rendered)?)?;
            }
        }

        Commands::Stop { app } => {
            if let ContextOutcome::StopApp { app } =
                coordinator.context_action(&entry(ctx, &app)?, MenuAction::StopApp)
            {
                eprintln!("Stopping '{}'", app.name);
            }
        }

        Commands::Refresh { .. } => {
            let outcome = coordinator.refresh_catalog();
            if outcome.timed_out {
                eprintln!("Refresh still running; gave up waiting");
            }
            if outcome.status == RefreshStatus::Error {
                return Err(CliError::RefreshFailed);
            }
            let count = coordinator.snapshot().apps.len();
            eprintln!("Catalog has {} app(s)", count);
        }

        Commands::SetTransport { app, transport } => {
            coordinator.change_transport(&app, transport)?;
            eprintln!("'{}' will launch over {}", app, transport);
        }
    }

    Ok(())
}

fn entry(ctx: &Context, name: &str) -> Result<AppsListItem, CliError> {
    let snapshot = ctx.coordinator.snapshot();
    let app = snapshot
        .find_app(name)
        .cloned()
        .ok_or_else(|| AppListError::AppNotFound(name.to_string()))?;
    Ok(AppsListItem::AppEntry { app })
}
