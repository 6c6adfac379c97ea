use std::{net::TcpListener, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use trawler::{
    configuration::{get_configuration, load_job},
    services::{DroidLauncher, Harvester, WebhookNotifier},
    startup::run,
};

#[derive(Parser)]
#[command(name = "trawler")]
#[command(about = "Harvests email addresses from search results")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest once using a job file with `names`, `niche` and `domain`
    Run {
        /// Job file, defaults to `harvest.job_file` from the configuration
        #[arg(long)]
        job: Option<PathBuf>,
    },
    /// Serve `POST /scrape-emails`
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let configuration = get_configuration().context("Failed to read configuration.")?;

    let launcher = Arc::new(DroidLauncher::new(configuration.webdriver.clone()));
    let harvester = Harvester::new(launcher, &configuration.harvest)?;

    match cli.command {
        Command::Run { job } => {
            let job = job.unwrap_or_else(|| configuration.harvest.job_file.clone());
            let config = load_job(&job)?;
            let emails = harvester.run(&config).await?;
            log::info!(
                "Wrote {} emails to {}",
                emails.len(),
                harvester.store().combined_path().display()
            );
        }
        Command::Serve => {
            let address = format!(
                "{}:{}",
                configuration.application.host, configuration.application.port
            );
            let listener = TcpListener::bind(&address)
                .with_context(|| format!("Failed to bind {}", address))?;
            log::info!("Server is running on {}", address);

            let notifier = WebhookNotifier::new()?;
            run(listener, harvester, notifier)?.await?;
        }
    }

    Ok(())
}
