mod cli;
mod config;
mod error;
mod mounts;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging has to be up before the config loads (missing/malformed
    // config is reported as a warning), so peek at the args for -v here.
    let verbose = std::env::args()
        .skip(1)
        .any(|a| a == "-v" || a == "--verbose");
    let default_filter = if verbose {
        "sshfsmount=debug"
    } else {
        "sshfsmount=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config = Config::load();
    let matches = cli::build_cli(&config).get_matches();
    cli::run(&config, &matches).await
}
