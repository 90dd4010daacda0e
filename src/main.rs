//! Acme chat console — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at the configured level
//!   4. Build the backend client and probe reachability
//!   5. Run the console loop until Ctrl-C or EOF

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use acme_chat::backend::ChatClient;
use acme_chat::coordinator::ExchangeCoordinator;
use acme_chat::error::AppError;
use acme_chat::{config, console, logger};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::parse_level(&config.log_level)?;
    logger::init(&config.log_level)?;

    info!(
        base_url = %config.backend.base_url,
        timeout_seconds = config.backend.timeout_seconds,
        log_level = %config.log_level,
        "config loaded"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let client = ChatClient::new(&config.backend.base_url, config.backend.timeout_seconds)
            .map_err(|e| AppError::Backend(e.to_string()))?;

        // Best-effort reachability check; the console runs either way and
        // every failed exchange surfaces in the log as an error turn.
        match client.ping().await {
            Ok(()) => info!("backend reachable"),
            Err(e) => warn!("backend not reachable yet: {e}"),
        }

        let coordinator = Arc::new(ExchangeCoordinator::new(client));

        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal_token.cancel();
            }
        });

        console::run(coordinator, &config.console, shutdown).await
    })
}
