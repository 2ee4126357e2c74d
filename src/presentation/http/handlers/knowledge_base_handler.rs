use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{
    CreateKnowledgeBaseRequest, CreateKnowledgeBaseUseCase, DeleteKnowledgeBaseUseCase,
    GetKnowledgeBaseUseCase, ListKnowledgeBasesUseCase, UpdateKnowledgeBaseRequest,
    UpdateKnowledgeBaseUseCase,
};
use crate::presentation::http::dto::{
    CreateKnowledgeBaseDto, DeletionResponseDto, KnowledgeBaseDetailDto, KnowledgeBaseDto,
    KnowledgeBaseListDto, PaginationDto, UpdateKnowledgeBaseDto, failure, respond,
};

pub struct KnowledgeBaseHandler {
    create_use_case: Arc<CreateKnowledgeBaseUseCase>,
    get_use_case: Arc<GetKnowledgeBaseUseCase>,
    list_use_case: Arc<ListKnowledgeBasesUseCase>,
    update_use_case: Arc<UpdateKnowledgeBaseUseCase>,
    delete_use_case: Arc<DeleteKnowledgeBaseUseCase>,
}

impl KnowledgeBaseHandler {
    pub fn new(
        create_use_case: Arc<CreateKnowledgeBaseUseCase>,
        get_use_case: Arc<GetKnowledgeBaseUseCase>,
        list_use_case: Arc<ListKnowledgeBasesUseCase>,
        update_use_case: Arc<UpdateKnowledgeBaseUseCase>,
        delete_use_case: Arc<DeleteKnowledgeBaseUseCase>,
    ) -> Self {
        Self {
            create_use_case,
            get_use_case,
            list_use_case,
            update_use_case,
            delete_use_case,
        }
    }

    pub async fn create_knowledge_base(
        State(handler): State<Arc<KnowledgeBaseHandler>>,
        Json(body): Json<CreateKnowledgeBaseDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = CreateKnowledgeBaseRequest {
            name: body.name,
            description: body.description,
        };

        match handler.create_use_case.execute(request).await {
            Ok(knowledge_base) => Ok(respond(
                StatusCode::CREATED,
                KnowledgeBaseDto::from(&knowledge_base),
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn list_knowledge_bases(
        State(handler): State<Arc<KnowledgeBaseHandler>>,
        Query(pagination): Query<PaginationDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler
            .list_use_case
            .execute(pagination.skip, pagination.limit)
            .await
        {
            Ok(knowledge_bases) => {
                let dto = KnowledgeBaseListDto {
                    knowledge_bases: knowledge_bases.iter().map(KnowledgeBaseDto::from).collect(),
                    skip: pagination.skip,
                    limit: pagination.limit,
                };
                Ok(respond(StatusCode::OK, dto))
            }
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn get_knowledge_base(
        State(handler): State<Arc<KnowledgeBaseHandler>>,
        Path(kb_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_use_case.execute(kb_id).await {
            Ok(details) => Ok(respond(StatusCode::OK, KnowledgeBaseDetailDto::from(details))),
            Err(e) => Ok(failure(e)),
        }
    }

    /// Absent fields keep their value; an empty description clears it.
    pub async fn update_knowledge_base(
        State(handler): State<Arc<KnowledgeBaseHandler>>,
        Path(kb_id): Path<Uuid>,
        Json(body): Json<UpdateKnowledgeBaseDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = UpdateKnowledgeBaseRequest {
            name: body.name,
            description: body.description,
        };

        match handler.update_use_case.execute(kb_id, request).await {
            Ok(knowledge_base) => Ok(respond(
                StatusCode::OK,
                KnowledgeBaseDto::from(&knowledge_base),
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn delete_knowledge_base(
        State(handler): State<Arc<KnowledgeBaseHandler>>,
        Path(kb_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.delete_use_case.execute(kb_id).await {
            Ok(receipt) => Ok(respond(StatusCode::ACCEPTED, DeletionResponseDto::from(receipt))),
            Err(e) => Ok(failure(e)),
        }
    }
}
