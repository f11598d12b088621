use std::sync::Arc;

use eruvify::config::Config;
use eruvify::engine::Engine;
use eruvify::error::Error;
use eruvify::seed::{read_routes, seed_routes};
use eruvify::server::serve;
use eruvify::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(PgStore::new(url, config.database_max_connections).await?),
        None => {
            tracing::info!("no database configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let engine = Engine::new(store, &config)?;

    if let Some(path) = &config.routes_path {
        seed_routes(&engine, read_routes(path)?).await?;
    }

    serve(engine, config.bind_addr).await
}
