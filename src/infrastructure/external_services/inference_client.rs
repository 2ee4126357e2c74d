use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
};
use crate::domain::value_objects::RetryPolicy;

const MODEL_NAME: &str = "inference-service";

#[derive(Serialize)]
struct EmbedBody<'a> {
    text: &'a [String],
}

#[derive(Deserialize)]
struct EmbedReply {
    success: bool,
    embeddings: Vec<Vector>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsClientConfig {
    pub service_url: String,
    pub dimension: usize,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl EmbeddingsClientConfig {
    pub fn new(service_url: String, dimension: usize) -> Self {
        Self {
            service_url,
            dimension,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::new(4, Duration::from_secs(1), Duration::from_secs(8)),
        }
    }
}

/// Thin HTTP client for the embeddings service. Transport failures and
/// 5xx replies are retried on the configured policy; anything else fails fast.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: Client,
    config: EmbeddingsClientConfig,
}

impl InferenceClient {
    pub fn new(config: EmbeddingsClientConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>, EmbeddingProviderError> {
        let policy = self.config.retry;
        let mut attempt = 0;

        loop {
            match self.post_once(texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Transient(e)) if attempt + 1 >= policy.max_attempts => return Err(e),
                Err(Attempt::Transient(e)) => {
                    let wait = policy.delay_for(attempt);
                    tracing::warn!(
                        "Embedding call {} of {} failed: {}; next try in {:?}",
                        attempt + 1,
                        policy.max_attempts,
                        e,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn post_once(&self, texts: &[String]) -> Result<Vec<Vector>, Attempt> {
        let response = self
            .http
            .post(&self.config.service_url)
            .json(&EmbedBody { text: texts })
            .send()
            .await
            .map_err(|e| {
                Attempt::Transient(EmbeddingProviderError::NetworkError(
                    e.without_url().to_string(),
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error = EmbeddingProviderError::ApiError(format!("service returned {}", status));
            return Err(classify(status, error));
        }

        let reply: EmbedReply = response
            .json()
            .await
            .map_err(|e| Attempt::Fatal(EmbeddingProviderError::ApiError(e.to_string())))?;
        if !reply.success {
            return Err(Attempt::Fatal(EmbeddingProviderError::ApiError(
                "service reported failure".to_string(),
            )));
        }
        Ok(reply.embeddings)
    }
}

enum Attempt {
    Transient(EmbeddingProviderError),
    Fatal(EmbeddingProviderError),
}

fn classify(status: StatusCode, error: EmbeddingProviderError) -> Attempt {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Attempt::Transient(error)
    } else {
        Attempt::Fatal(error)
    }
}

pub struct InferenceEmbeddingProvider {
    client: InferenceClient,
}

impl InferenceEmbeddingProvider {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for InferenceEmbeddingProvider {
    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        let embeddings = if request.texts.is_empty() {
            Vec::new()
        } else {
            self.client.embed(&request.texts).await?
        };

        Ok(BatchEmbeddingResponse {
            embeddings,
            model_name: MODEL_NAME.to_string(),
        })
    }

    fn embedding_dimension(&self) -> usize {
        self.client.dimension()
    }
}
