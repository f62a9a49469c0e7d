use clap::Parser;
use penpot_ai_designer::ai::proxy::{init_subscriber, serve, ProxyConfig};

#[tokio::main]
async fn main() {
    if let Err(e) = init_subscriber() {
        eprintln!("Failed to initialize logging: {e}");
    }

    let config = ProxyConfig::parse();

    if let Err(e) = serve(config).await {
        tracing::error!(error = %e, "gemini proxy stopped");
        std::process::exit(1);
    }
}
