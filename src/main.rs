use tessera::logger::*;
use tessera::server::ReplicaServer;
use tessera::settings::*;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let server = ReplicaServer::try_new(&project_settings).await?;

    signal::ctrl_c().await.expect("Could not register SIGINT");

    let shutdown_timeout = std::time::Duration::from_secs(30);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => tracing::info!("replica shutdown successfully"),
        Err(_) => tracing::error!("replica shutdown timed out"),
    }

    Ok(())
}
