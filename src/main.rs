use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use homework_watchbot::config;
use homework_watchbot::logging;
use homework_watchbot::poller::{PollerSettings, StatusPoller};
use homework_watchbot::practicum::PracticumClient;
use homework_watchbot::telegram::TelegramNotifier;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Optional YAML config file; environment variables override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Poll once, report the outcome and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let cfg = match config::load(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(critical = true, %err, "required configuration is missing or invalid, shutting down");
            return Err(err.into());
        }
    };

    let api = PracticumClient::from_config(&cfg)?;
    let notifier = TelegramNotifier::from_config(&cfg)?;
    let settings = PollerSettings::from_config(&cfg);
    let mut poller = StatusPoller::new(settings, api, notifier, Utc::now().timestamp());

    if args.once {
        let outcome = poller.tick().await;
        info!(?outcome, "single poll finished");
        return Ok(());
    }

    poller
        .run(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(?err, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
