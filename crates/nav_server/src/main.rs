//! Grid Nav - Planning Server

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Grid Nav Planning Server");

    let config = nav_server::ServerConfig::default();
    if let Err(e) = nav_server::protocol::serve(config).await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}
