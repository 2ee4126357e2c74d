use kbsync::config::AppConfig;
use kbsync::infrastructure::AppContainer;
use kbsync::presentation::http::HttpServer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()?;
    let container = AppContainer::new(&config)?;

    // Start background workers
    let worker_pool = container.worker_pool;
    tokio::spawn(async move {
        worker_pool.start().await;
    });

    let staging_sweeper = container.staging_sweeper;
    tokio::spawn(async move {
        staging_sweeper.run().await;
    });

    let server = HttpServer::new(
        container.knowledge_base_handler,
        container.document_handler,
        container.task_handler,
        container.search_handler,
        config.server_port,
        config.max_upload_bytes,
    );

    info!("Starting kbsync on port {}", config.server_port);
    server.run().await
}
