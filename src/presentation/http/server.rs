use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, Response};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{Span, error, info};

use crate::presentation::http::{
    handlers::{DocumentHandler, KnowledgeBaseHandler, SearchHandler, TaskHandler},
    routes::{document_routes, health_routes, knowledge_base_routes, search_routes, task_routes},
};

pub struct HttpServer {
    knowledge_base_handler: Arc<KnowledgeBaseHandler>,
    document_handler: Arc<DocumentHandler>,
    task_handler: Arc<TaskHandler>,
    search_handler: Arc<SearchHandler>,
    port: u16,
    max_body_bytes: usize,
}

impl HttpServer {
    pub fn new(
        knowledge_base_handler: Arc<KnowledgeBaseHandler>,
        document_handler: Arc<DocumentHandler>,
        task_handler: Arc<TaskHandler>,
        search_handler: Arc<SearchHandler>,
        port: u16,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            knowledge_base_handler,
            document_handler,
            task_handler,
            search_handler,
            port,
            max_body_bytes,
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(health_routes())
            .merge(knowledge_base_routes(self.knowledge_base_handler.clone()))
            .merge(document_routes(self.document_handler.clone()))
            .merge(task_routes(self.task_handler.clone()))
            .merge(search_routes(self.search_handler.clone()))
            .layer(cors)
            // multipart uploads are bounded by this, not axum's default limit
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.max_body_bytes))
            .layer(
                TraceLayer::new_for_http()
                    .on_request(|request: &Request<Body>, _span: &Span| {
                        info!(method = %request.method(), uri = %request.uri(), "request");
                    })
                    .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                        info!(
                            status = response.status().as_u16(),
                            latency_ms = latency.as_millis() as u64,
                            "response"
                        );
                    })
                    .on_failure(
                        |failure: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                            error!(
                                %failure,
                                latency_ms = latency.as_millis() as u64,
                                "request failed"
                            );
                        },
                    ),
            )
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));

        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", addr);
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::value_objects::{ChunkingConfig, RetryPolicy};
    use crate::infrastructure::AppContainer;

    fn in_memory_config() -> AppConfig {
        AppConfig {
            database_url: None,
            database_pool_size: 1,
            blob_root: std::env::temp_dir().join("kbsync-router-test"),
            blob_bucket: "documents".to_string(),
            embeddings_service_url: "http://127.0.0.1:9".to_string(),
            embedding_dimension: 8,
            server_port: 0,
            max_upload_bytes: 1024 * 1024,
            worker_count: 1,
            queue_capacity: 8,
            chunking: ChunkingConfig::default(),
            vector_batch_size: 16,
            cleanup_retry: RetryPolicy::default(),
            staging_verify_attempts: 1,
            staging_verify_interval: Duration::from_millis(1),
            staging_ttl: chrono::Duration::hours(1),
            staging_sweep_interval: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_router_builds_without_conflicting_routes() {
        let container = AppContainer::new(&in_memory_config()).unwrap();
        let server = HttpServer::new(
            container.knowledge_base_handler,
            container.document_handler,
            container.task_handler,
            container.search_handler,
            0,
            1024,
        );

        let _router = server.router();
    }
}
