//! Binary entry point: initializes logging, loads configuration from
//! the environment, and serves the `/start` route.

use bollard::Docker;
use botbox::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    let docker = Docker::connect_with_local_defaults()?;
    let listen_addr = config.listen_addr;
    let router = botbox::build_router(docker, config);

    tracing::info!(%listen_addr, "botbox orchestrator listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
