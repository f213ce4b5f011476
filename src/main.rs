//! Orgchart CLI Entry Point
//!
//! This is the main binary entry point for the orgchart CLI.
//! It provides three subcommands:
//! - `menu` - Interactive menu (the default when no subcommand is given)
//! - `check` - Validate the connection and print server information
//! - `init` - Create the schema, optionally with sample data
//!
//! Tables and messages go to stdout. Logs and errors go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use orgchart::config::{self, ConnectionOverrides};
use orgchart::engine::{DatabaseType, OrgStore};
use orgchart::{seed, ui, App, TerminalPrompter};

/// Orgchart - manage departments, roles and employees from the terminal
#[derive(Parser)]
#[command(name = "orgchart")]
#[command(about = "Interactive org-chart manager for departments, roles and employees")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Enable debug logging (RUST_LOG still wins when set)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Connection flags; each one overrides its DB_* variable
#[derive(Args)]
struct ConnectionArgs {
    /// Database engine: mysql, postgres or sqlite
    #[arg(long, global = true)]
    engine: Option<DatabaseType>,

    #[arg(long, global = true)]
    host: Option<String>,

    #[arg(long, global = true)]
    port: Option<u16>,

    #[arg(long, global = true)]
    user: Option<String>,

    #[arg(long, global = true)]
    password: Option<String>,

    #[arg(long, global = true)]
    database: Option<String>,

    /// SQLite database file
    #[arg(long, global = true)]
    file: Option<PathBuf>,
}

impl From<ConnectionArgs> for ConnectionOverrides {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            engine: args.engine,
            host: args.host,
            port: args.port,
            user: args.user,
            password: args.password,
            database: args.database,
            file: args.file,
        }
    }
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Start the interactive menu
    Menu,

    /// Validate the connection and print server information
    Check,

    /// Create the department, role and employee tables
    Init {
        /// Also insert a sample organisation
        #[arg(long)]
        seed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.debug) {
        eprintln!("failed to initialise logging: {err}");
    }

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            ui::error("Error", &format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    config::load_dotenv();

    let stored = match config::stored_connection_path() {
        Ok(path) => config::load_stored_connection(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        Err(err) => {
            tracing::debug!(error = %err, "no user config directory");
            None
        }
    };

    let overrides = ConnectionOverrides::from(cli.connection);
    let connection =
        config::resolve_connection(&overrides, |key| std::env::var(key).ok(), stored.as_ref())?;
    tracing::debug!(target_db = %connection.describe(), "resolved connection");

    let command = cli.command.unwrap_or(Commands::Menu);

    match connection.engine {
        #[cfg(feature = "sqlite")]
        DatabaseType::SQLite => {
            execute(orgchart::engine::sqlite::SqliteStore::open(&connection)?, command).await
        }
        #[cfg(feature = "mysql")]
        DatabaseType::MySQL => {
            let store = orgchart::engine::mysql::MySqlStore::connect(&connection).await?;
            execute(store, command).await
        }
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => {
            let store = orgchart::engine::postgres::PostgresStore::connect(&connection).await?;
            execute(store, command).await
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("{other} support is not compiled in (enable the '{other}' feature)"),
    }
}

async fn execute<S: OrgStore>(store: S, command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Menu => {
            ui::banner();
            // The menu reports its own fatal error before returning it
            match App::new(store, TerminalPrompter::new()).run().await {
                Ok(()) => Ok(ExitCode::SUCCESS),
                Err(_) => Ok(ExitCode::FAILURE),
            }
        }
        Commands::Check => {
            let info = store.server_info().await;
            store.close().await?;
            let info = info?;

            ui::success("Connection OK");
            ui::info(&format!("Server:   {}", info.server_info));
            ui::info(&format!("Version:  {}", info.database_version));
            ui::info(&format!("Database: {}", info.connected_database));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { seed } => {
            let result = initialise(&store, seed).await;
            store.close().await?;
            result?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn initialise<S: OrgStore>(store: &S, with_seed: bool) -> anyhow::Result<()> {
    store.create_schema().await.context("creating schema")?;
    ui::success("Schema ready.");

    if with_seed {
        let summary = seed::seed(store).await.context("inserting sample data")?;
        ui::success(&format!(
            "Inserted {} departments, {} roles and {} employees.",
            summary.departments, summary.roles, summary.employees
        ));
    }

    Ok(())
}
