//! floor-engine daemon
//!
//! Runs the governance engine for one season:
//! - HTTP API for the chat/web layer to drive commands
//! - Round scheduler advancing the season clock and resolving tally
//!   boundaries on cadence
//! - Rule-set versions published for the simulation to read at round starts

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::RwLock;
use tracing::{error, info};

use floor_engine::api::{create_router, AppState, SeasonClock};
use floor_engine::config::Config;
use floor_engine::engine::{wall_clock_ms, GovernanceEngine, SeasonCtx};
use floor_engine::interpret::HttpInterpreter;
use floor_engine::league::League;
use floor_engine::registry::RuleSpace;

#[derive(Parser)]
#[command(name = "floor-engine")]
#[command(about = "Governance engine for the Hooper League simulation")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "floor-engine.toml")]
    config: String,

    /// Data directory
    #[arg(short, long, env = "FLOOR_DATA_DIR")]
    data_dir: Option<String>,

    /// Season ID (overrides config file)
    #[arg(long, env = "FLOOR_SEASON_ID")]
    season_id: Option<String>,

    /// League roster file (overrides config file)
    #[arg(long, env = "FLOOR_LEAGUE_FILE")]
    league_file: Option<String>,

    /// HTTP API port (overrides config file)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("floor_engine=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting floor-engine");
    info!("Config file: {}", cli.config);

    // Load or create default config
    let mut config: Config = if std::path::Path::new(&cli.config).exists() {
        let content = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&content)?
    } else {
        info!("Config file not found, using defaults");
        Config::default()
    };

    // Apply CLI overrides
    if let Some(data_dir) = cli.data_dir {
        config.engine.data_dir = PathBuf::from(data_dir);
    }
    if let Some(season_id) = cli.season_id {
        config.engine.season_id = season_id;
    }
    if let Some(league_file) = cli.league_file {
        config.engine.league_file = Some(league_file);
    }
    if let Some(port) = cli.port {
        config.api.http_port = port;
    }

    info!("Season: {}", config.engine.season_id);
    info!("Data dir: {}", config.engine.data_dir.display());

    let league = League::load_or_demo(config.engine.league_file.as_deref())?;
    let rule_space = RuleSpace::load_or_builtin(config.engine.rule_space_file.as_deref())?;
    let interpreter = Arc::new(HttpInterpreter::new(&config.interpreter));

    let engine = Arc::new(GovernanceEngine::open(
        &config,
        league,
        rule_space,
        interpreter,
        wall_clock_ms(),
    )?);

    let clock = Arc::new(RwLock::new(SeasonClock {
        season_id: config.engine.season_id.clone(),
        round: 0,
    }));

    // Round scheduler: advances the season clock and resolves tally
    // boundaries on cadence
    {
        let engine = engine.clone();
        let clock = clock.clone();
        let cadence = config.governance.rounds_per_window.max(1);
        let interval_secs = config.governance.round_interval_secs.max(1);
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            ticker.tick().await; // first tick is immediate
            loop {
                ticker.tick().await;
                let round = {
                    let mut clock = clock.write().await;
                    clock.round += 1;
                    clock.round
                };
                if round % cadence == 0 {
                    let ctx = {
                        let clock = clock.read().await;
                        SeasonCtx::at(clock.season_id.clone(), clock.round, wall_clock_ms())
                    };
                    info!(round, "Tally boundary");
                    if let Err(e) = engine.tally(&ctx).await {
                        error!(round, error = %e, "Tally failed");
                    }
                }
            }
        });
    }

    let state = AppState { engine, clock };
    let router = create_router(state);

    let addr = format!("0.0.0.0:{}", config.api.http_port);
    info!("HTTP API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
