//! Process bootstrap: logging, config, collaborators, serve.

use std::sync::Arc;

use tracing::error;
use tracing_subscriber::EnvFilter;

use taskd::{App, Config, MemoryAuthenticator, MemoryTaskStore, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let app = App::new(
        Arc::new(MemoryAuthenticator::new()),
        Arc::new(MemoryTaskStore::new()),
    );

    if let Err(e) = Server::bind(&config.bind_addr()).serve(app).await {
        error!("server error: {e}");
        std::process::exit(1);
    }
}
