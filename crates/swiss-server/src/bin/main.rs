use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use swiss_server::config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let port = config.port;
    let (app, _state) = swiss_server::build_app(config).await?;

    let addr = format!("0.0.0.0:{}", port);
    info!("Listening on {}", addr);
    info!(
        "Create a tournament with: curl -X POST http://localhost:{}/tournaments -H 'content-type: application/json' -d '{{\"name\":\"Open\",\"competitors\":[\"A\",\"B\",\"C\"]}}'",
        port
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
