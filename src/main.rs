use clap::Parser;
use color_eyre::Result;
use tracing::warn;

use damon::api::PortfolioClient;
use damon::cli::{self, Args};
use damon::config::Config;
use damon::logging;
use damon::session::SessionState;

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(&config.log)?;

  let client = PortfolioClient::open(&config)?;

  // Expired sessions are logged out once, before any command runs
  if let SessionState::Expired { expired_at } = client.session().restore()? {
    warn!(%expired_at, "stored session had expired; log in again to make changes");
  }

  cli::run(&client, args.command).await
}
