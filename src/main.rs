use clap::Parser;
use jobledger::config::LedgerConfig;
use jobledger::interfaces::cli::{Cli, Gateway, open_store};
use jobledger::interfaces::json::seed_reader::SeedReader;
use jobledger::telemetry;
use miette::{IntoDiagnostic, Result};
use std::fs::File;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let store = open_store(cli.db_path).into_diagnostic()?;

    if let Some(seed_path) = cli.seed {
        let file = File::open(seed_path).into_diagnostic()?;
        let seed = SeedReader::new(file).read().into_diagnostic()?;
        seed.provision(store.as_ref()).await.into_diagnostic()?;
    }

    let config = LedgerConfig::default().with_max_retries(cli.max_retries);
    let gateway = Gateway::new(store, config);
    let body = gateway.dispatch(cli.command).await.into_diagnostic()?;

    println!("{}", serde_json::to_string(&body).into_diagnostic()?);
    Ok(())
}
