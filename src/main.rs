// JWKS issuer
//
// Publishes the public half of an in-memory RSA key set as a JWKS and issues
// RS256 tokens on request, including deliberately expired ones, so clients
// can exercise their expiry and key-rotation handling.

use clap::Parser;
use jwks_issuer::{config::Config, server, telemetry};

#[tokio::main]
async fn main() {
    let config = Config::parse();
    telemetry::init_tracing(&config.log_level);

    if let Err(e) = server::start_server(config).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
