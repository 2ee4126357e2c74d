use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::{sync::Arc, time::Instant};
use uuid::Uuid;

use crate::application::use_cases::{SearchKnowledgeBaseUseCase, SearchRequest};
use crate::presentation::http::dto::{
    SearchRequestDto, SearchResponseDto, SearchResultDto, failure, respond,
};

pub struct SearchHandler {
    search_use_case: Arc<SearchKnowledgeBaseUseCase>,
}

impl SearchHandler {
    pub fn new(search_use_case: Arc<SearchKnowledgeBaseUseCase>) -> Self {
        Self { search_use_case }
    }

    pub async fn search(
        State(handler): State<Arc<SearchHandler>>,
        Path(kb_id): Path<Uuid>,
        Json(body): Json<SearchRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let started = Instant::now();
        let request = SearchRequest {
            kb_id,
            query: body.query.clone(),
            top_k: body.top_k,
        };

        match handler.search_use_case.execute(request).await {
            Ok(entries) => {
                let results: Vec<SearchResultDto> =
                    entries.into_iter().map(SearchResultDto::from).collect();
                let dto = SearchResponseDto {
                    query: body.query,
                    total_results: results.len(),
                    results,
                    search_time_ms: started.elapsed().as_millis() as u64,
                };
                Ok(respond(StatusCode::OK, dto))
            }
            Err(e) => Ok(failure(e)),
        }
    }
}
