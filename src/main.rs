mod app;
mod cache;
mod commands;
mod config;
mod event;
mod feedback;
mod op;
mod snapshot;
mod store;
mod suggest;
mod sync;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gopy")]
#[command(about = "A terminal UI for hospital feedback intake and review")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/gopy/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Start in the admin console instead of the public intake form
  #[arg(short, long)]
  admin: bool,

  /// Override the store endpoint URL from the config file
  #[arg(long)]
  store_url: Option<String>,
}

/// File logging: the terminal belongs to the UI, so tracing goes to a
/// daily-rolled file under the user data directory.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("gopy")
    .join("logs");

  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(log_dir, "gopy.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gopy=info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Keep the worker alive until exit so buffered log lines are flushed
  let _log_guard = init_logging()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override the endpoint if specified on the command line
  let config = if let Some(url) = args.store_url {
    config::Config {
      store: config::StoreConfig {
        url,
        ..config.store
      },
      ..config
    }
  } else {
    config
  };

  // Initialize and run the app
  let mut app = app::App::new(config, args.admin)?;
  app.run().await?;

  Ok(())
}
