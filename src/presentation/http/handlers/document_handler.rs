use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::application::use_cases::{
    ExpireStagedUploadsUseCase, GetDocumentUseCase, ListUploadsUseCase, PreviewDocumentRequest,
    PreviewDocumentUseCase, ReadDocumentFileUseCase, SubmitDeletionUseCase,
    SubmitProcessingRequest, SubmitProcessingUseCase, SubmitUploadRequest, SubmitUploadUseCase,
    UploadAndProcessUseCase,
};
use crate::domain::value_objects::ChunkingConfig;
use crate::presentation::http::dto::{
    ApiReply, ChunkingDto, DeletionResponseDto, DocumentDetailDto, DocumentViewDto,
    ExpireResponseDto, FullProcessResponseDto, PreviewResponseDto, ProcessRequestDto,
    ProcessResponseDto, StagedUploadDto, StagedUploadListDto, UploadResponseDto, UploadResultDto,
    bad_request, failure, respond,
};

/// Use cases behind the document routes.
pub struct DocumentUseCases {
    pub upload: Arc<SubmitUploadUseCase>,
    pub process: Arc<SubmitProcessingUseCase>,
    pub upload_and_process: Arc<UploadAndProcessUseCase>,
    pub deletion: Arc<SubmitDeletionUseCase>,
    pub preview: Arc<PreviewDocumentUseCase>,
    pub get: Arc<GetDocumentUseCase>,
    pub list_uploads: Arc<ListUploadsUseCase>,
    pub read_file: Arc<ReadDocumentFileUseCase>,
    pub expire: Arc<ExpireStagedUploadsUseCase>,
}

pub struct DocumentHandler {
    use_cases: DocumentUseCases,
    default_chunking: ChunkingConfig,
}

impl DocumentHandler {
    pub fn new(use_cases: DocumentUseCases, default_chunking: ChunkingConfig) -> Self {
        Self {
            use_cases,
            default_chunking,
        }
    }

    fn chunking_override(&self, chunking: &ChunkingDto) -> Option<ChunkingConfig> {
        (!chunking.is_empty()).then(|| chunking.resolve(self.default_chunking))
    }

    /// Stages every file part of the form. Stops at the first failing file;
    /// files staged before it stay pending until processed or expired.
    pub async fn upload_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Path(kb_id): Path<Uuid>,
        multipart: Multipart,
    ) -> Result<ApiReply<UploadResponseDto>, StatusCode> {
        let files = match read_files(kb_id, multipart).await {
            Ok(files) => files,
            Err(reply) => return Ok(reply),
        };

        let mut uploads = Vec::with_capacity(files.len());
        for file in files {
            match handler.use_cases.upload.execute(file).await {
                Ok(response) => uploads.push(UploadResultDto::from(response)),
                Err(e) => return Ok(failure(e)),
            }
        }

        info!("Staged {} file(s) for knowledge base {}", uploads.len(), kb_id);
        Ok(respond(StatusCode::CREATED, UploadResponseDto { uploads }))
    }

    /// Upload and process in one request. Split overrides come from the query.
    pub async fn full_process_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Path(kb_id): Path<Uuid>,
        Query(chunking): Query<ChunkingDto>,
        multipart: Multipart,
    ) -> Result<ApiReply<FullProcessResponseDto>, StatusCode> {
        let files = match read_files(kb_id, multipart).await {
            Ok(files) => files,
            Err(reply) => return Ok(reply),
        };

        let chunking = handler.chunking_override(&chunking);
        match handler
            .use_cases
            .upload_and_process
            .execute(kb_id, files, chunking)
            .await
        {
            Ok(response) => Ok(respond(
                StatusCode::ACCEPTED,
                FullProcessResponseDto::from(response),
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn list_uploads(
        State(handler): State<Arc<DocumentHandler>>,
        Path(kb_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.use_cases.list_uploads.execute(kb_id).await {
            Ok(uploads) => Ok(respond(
                StatusCode::OK,
                StagedUploadListDto {
                    uploads: uploads.iter().map(StagedUploadDto::from).collect(),
                },
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn get_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path((kb_id, document_id)): Path<(Uuid, Uuid)>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.use_cases.get.execute(kb_id, document_id).await {
            Ok(details) => Ok(respond(StatusCode::OK, DocumentDetailDto::from(details))),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn view_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path((kb_id, document_id)): Path<(Uuid, Uuid)>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.use_cases.get.execute(kb_id, document_id).await {
            Ok(details) => Ok(respond(
                StatusCode::OK,
                DocumentViewDto::from_document(&details.document),
            )),
            Err(e) => Ok(failure(e)),
        }
    }

    /// Raw bytes of the stored file, served inline.
    pub async fn document_content(
        State(handler): State<Arc<DocumentHandler>>,
        Path((kb_id, document_id)): Path<(Uuid, Uuid)>,
    ) -> Response {
        match handler.use_cases.read_file.execute(kb_id, document_id).await {
            Ok(file) => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, file.content_type),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("inline; filename=\"{}\"", file.file_name),
                    ),
                ],
                file.data,
            )
                .into_response(),
            Err(e) => failure::<()>(e).into_response(),
        }
    }

    pub async fn process_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Path(kb_id): Path<Uuid>,
        Json(body): Json<ProcessRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = SubmitProcessingRequest {
            kb_id,
            upload_ids: body.upload_ids,
            chunking: handler.chunking_override(&body.chunking),
        };

        match handler.use_cases.process.execute(request).await {
            Ok(response) => Ok(respond(StatusCode::ACCEPTED, ProcessResponseDto::from(response))),
            Err(e) => Ok(failure(e)),
        }
    }

    pub async fn delete_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path((kb_id, document_id)): Path<(Uuid, Uuid)>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.use_cases.deletion.execute(kb_id, document_id).await {
            Ok(receipt) => Ok(respond(StatusCode::ACCEPTED, DeletionResponseDto::from(receipt))),
            Err(e) => Ok(failure(e)),
        }
    }

    /// `id` may name a document or a staged upload.
    pub async fn preview_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path((kb_id, id)): Path<(Uuid, Uuid)>,
        Query(chunking): Query<ChunkingDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = PreviewDocumentRequest {
            kb_id,
            id,
            chunking: chunking.resolve(handler.default_chunking),
        };

        match handler.use_cases.preview.execute(request).await {
            Ok(response) => Ok(respond(StatusCode::OK, PreviewResponseDto::from(response))),
            Err(e) => Ok(failure(e)),
        }
    }

    /// Same sweep the background sweeper runs, on demand.
    pub async fn cleanup_staged_uploads(
        State(handler): State<Arc<DocumentHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.use_cases.expire.execute().await {
            Ok(report) => Ok(respond(StatusCode::OK, ExpireResponseDto::from(report))),
            Err(e) => Ok(failure(e)),
        }
    }
}

/// Buffers every file part of a multipart form. Plain fields are skipped.
async fn read_files<T>(
    kb_id: Uuid,
    mut multipart: Multipart,
) -> Result<Vec<SubmitUploadRequest>, ApiReply<T>> {
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(bad_request("INVALID_MULTIPART", e.to_string())),
        };

        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);

        let data = match field.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => return Err(bad_request("INVALID_MULTIPART", e.to_string())),
        };

        files.push(SubmitUploadRequest {
            kb_id,
            file_name,
            content_type,
            data,
        });
    }

    if files.is_empty() {
        return Err(bad_request(
            "NO_FILE_PROVIDED",
            "No file provided in the request",
        ));
    }
    Ok(files)
}
