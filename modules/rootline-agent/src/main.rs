use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rootline_agent::enrichment::EnrichmentScheduler;
use rootline_agent::repair::RepairScheduler;
use rootline_agent::scheduler::ResearchScheduler;
use rootline_common::Config;
use rootline_store::{PgStore, Store};

#[derive(Parser)]
#[command(name = "rootline-agent", about = "Autonomous genealogy discovery engine")]
struct Args {
    /// Which loop(s) to run.
    #[arg(long, value_enum, default_value_t = Agent::All)]
    agent: Agent,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Agent {
    Research,
    Enrichment,
    Categories,
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rootline=info".parse()?))
        .init();

    let args = Args::parse();
    info!("Rootline agent starting...");

    let config = Config::from_env();
    let pg = PgStore::connect(&config.database_url).await?;
    pg.migrate().await?;
    let store: Arc<dyn Store> = Arc::new(pg);

    match args.agent {
        Agent::Research => ResearchScheduler::new(store, config)?.run().await,
        Agent::Enrichment => EnrichmentScheduler::new(store, config)?.run().await,
        Agent::Categories => RepairScheduler::new(store, config)?.run().await,
        Agent::All => {
            let research = ResearchScheduler::new(store.clone(), config.clone())?;
            let enrichment = EnrichmentScheduler::new(store.clone(), config.clone())?;
            let repair = RepairScheduler::new(store, config)?;
            let handles = [
                tokio::spawn(research.run()),
                tokio::spawn(enrichment.run()),
                tokio::spawn(repair.run()),
            ];
            for handle in handles {
                handle.await?;
            }
        }
    }

    Ok(())
}
