use async_trait::async_trait;
use pgvector::Vector;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Expected {expected} embeddings, got {got}")]
    CountMismatch { expected: usize, got: usize },
}

#[derive(Debug, Clone)]
pub struct BatchEmbeddingRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BatchEmbeddingResponse {
    pub embeddings: Vec<Vector>,
    pub model_name: String,
}

/// Text to vector model. Constructed once at startup and shared by every
/// vector index adapter.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError>;

    fn embedding_dimension(&self) -> usize;

    /// One vector per input text, in input order.
    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vector>, EmbeddingProviderError> {
        let expected = texts.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .generate_embeddings(BatchEmbeddingRequest { texts })
            .await?;
        if response.embeddings.len() != expected {
            return Err(EmbeddingProviderError::CountMismatch {
                expected,
                got: response.embeddings.len(),
            });
        }
        Ok(response.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShortProvider;

    #[async_trait]
    impl EmbeddingProvider for ShortProvider {
        async fn generate_embeddings(
            &self,
            request: BatchEmbeddingRequest,
        ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
            let embeddings = request
                .texts
                .iter()
                .skip(1)
                .map(|_| Vector::from(vec![1.0, 0.0]))
                .collect();
            Ok(BatchEmbeddingResponse {
                embeddings,
                model_name: "short".to_string(),
            })
        }

        fn embedding_dimension(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_embed_texts_rejects_short_reply() {
        let err = ShortProvider
            .embed_texts(vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EmbeddingProviderError::CountMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_embed_texts_empty_input() {
        assert!(ShortProvider.embed_texts(Vec::new()).await.unwrap().is_empty());
    }
}
