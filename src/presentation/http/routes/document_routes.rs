use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::DocumentHandler;

pub fn document_routes(document_handler: Arc<DocumentHandler>) -> Router {
    Router::new()
        .route(
            "/knowledge-bases/cleanup",
            post(DocumentHandler::cleanup_staged_uploads),
        )
        .route(
            "/knowledge-bases/{kb_id}/documents/upload",
            post(DocumentHandler::upload_documents).get(DocumentHandler::list_uploads),
        )
        .route(
            "/knowledge-bases/{kb_id}/documents/full-process",
            post(DocumentHandler::full_process_documents),
        )
        .route(
            "/knowledge-bases/{kb_id}/documents/process",
            post(DocumentHandler::process_documents),
        )
        .route(
            "/knowledge-bases/{kb_id}/documents/{document_id}/preview",
            get(DocumentHandler::preview_document),
        )
        .route(
            "/knowledge-bases/{kb_id}/documents/{document_id}/view",
            get(DocumentHandler::view_document),
        )
        .route(
            "/knowledge-bases/{kb_id}/documents/{document_id}/content",
            get(DocumentHandler::document_content),
        )
        .route(
            "/knowledge-bases/{kb_id}/documents/{document_id}",
            get(DocumentHandler::get_document).delete(DocumentHandler::delete_document),
        )
        .with_state(document_handler)
}
