use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use playlist_harvester::{
    AppConfig, CliConfig, EnvCredentials, FileConfig, Harvester, ParentSelection, RetryPolicy,
    SpotifyCatalogClient, SqliteHarvestStore,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("HARVESTER_GIT_HASH"), ")");

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().context("Error resolving current directory")?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[command(name = "harvester", version = VERSION)]
/// Harvests playlists and their tracks from the catalog API into SQLite.
struct CliArgs {
    /// Path to a TOML config file.
    #[clap(long, global = true, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database file.
    #[clap(long, global = true, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search playlists, fetch their tracks and store them.
    Harvest {
        /// Search query, repeat for several. Replaces the configured list.
        #[clap(long = "query")]
        queries: Vec<String>,

        /// Maximum number of playlists to fetch tracks for.
        #[clap(long)]
        target: Option<usize>,

        /// How playlists are picked when more than `target` are found.
        #[clap(long, value_enum)]
        selection: Option<ParentSelection>,
    },

    /// Create the database and its tables. Safe to run again.
    InitDb,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .init();

    info!("playlist-harvester {}", VERSION);

    match run(cli_args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli_args: CliArgs) -> Result<ExitCode> {
    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let (queries, target_playlists, parent_selection) = match &cli_args.command {
        Command::Harvest {
            queries,
            target,
            selection,
        } => (queries.clone(), *target, *selection),
        Command::InitDb => (Vec::new(), None, None),
    };
    let cli_config = CliConfig {
        db_path: cli_args.db.clone(),
        queries,
        target_playlists,
        parent_selection,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    match cli_args.command {
        Command::InitDb => {
            SqliteHarvestStore::initialize(&config.db_path)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Harvest { .. } => harvest(config).await,
    }
}

async fn harvest(config: AppConfig) -> Result<ExitCode> {
    let catalog = SpotifyCatalogClient::new(config.catalog.clone(), &EnvCredentials::with_dotenv())?;
    let store = SqliteHarvestStore::open(&config.db_path)?;

    let snapshot_date = Local::now().date_naive();
    info!(
        "Harvesting {} queries into {:?}, snapshot {}",
        config.harvest.queries.len(),
        config.db_path,
        snapshot_date
    );

    let harvester = Harvester::new(
        Arc::new(catalog),
        Arc::new(store),
        config.harvest.clone(),
        RetryPolicy::new(&config.retry),
        snapshot_date,
    );
    let report = harvester
        .run(&config.harvest.queries)
        .await
        .context("Harvest aborted, rerun to resume from the last saved batch")?;

    report.log_summary();
    Ok(report.status().exit_code())
}
