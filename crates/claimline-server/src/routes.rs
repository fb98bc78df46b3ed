//! REST endpoints for session management, transcripts and uploads.

use crate::ServerState;
use claimline_core::ClaimlineCoreError;
use claimline_core::types::{DocumentAnalysis, Message, SessionSummary};
use claimline_protocol::SessionId;
use rocket::data::Capped;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: SessionId,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type ApiResult<T> = Result<Json<T>, Custom<Json<ErrorBody>>>;

fn api_error(status: Status, message: impl Into<String>) -> Custom<Json<ErrorBody>> {
    Custom(status, Json(ErrorBody { error: message.into() }))
}

fn parse_session(raw: &str) -> Result<SessionId, Custom<Json<ErrorBody>>> {
    Uuid::parse_str(raw)
        .map_err(|_| api_error(Status::BadRequest, format!("invalid session id: {raw}")))
}

fn internal(err: ClaimlineCoreError) -> Custom<Json<ErrorBody>> {
    api_error(Status::InternalServerError, err.to_string())
}

#[get("/api/health")]
pub fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[post("/api/sessions")]
pub fn create_session(state: &State<ServerState>) -> ApiResult<SessionCreated> {
    let session_id = state.orchestrator.create_session().map_err(internal)?;
    Ok(Json(SessionCreated { session_id }))
}

#[get("/api/sessions")]
pub fn list_sessions(state: &State<ServerState>) -> ApiResult<Vec<SessionSummary>> {
    state.orchestrator.list_sessions().map(Json).map_err(internal)
}

/// Transcript replay; unknown sessions answer with an empty list.
#[get("/api/sessions/<session_id>/history")]
pub fn history(session_id: &str, state: &State<ServerState>) -> ApiResult<Vec<Message>> {
    let session_id = parse_session(session_id)?;
    state.orchestrator.history(session_id).map(Json).map_err(internal)
}

#[get("/api/sessions/<session_id>/documents")]
pub fn list_documents(
    session_id: &str,
    state: &State<ServerState>,
) -> ApiResult<Vec<DocumentAnalysis>> {
    let session_id = parse_session(session_id)?;
    state
        .orchestrator
        .document_analyses(session_id)
        .map(Json)
        .map_err(internal)
}

/// Upload a document for analysis. The request body is the raw file;
/// the response reports the analysis summary or the failure reason.
/// Events for the exchange also flow over the session's websocket.
#[post("/api/sessions/<session_id>/documents?<filename>", data = "<file>")]
pub async fn upload_document(
    session_id: &str,
    filename: &str,
    file: Capped<Vec<u8>>,
    state: &State<ServerState>,
) -> ApiResult<UploadResponse> {
    let session_id = parse_session(session_id)?;
    if !file.is_complete() {
        return Err(api_error(
            Status::PayloadTooLarge,
            format!(
                "document exceeds the {} byte limit",
                state.orchestrator.config().chat.max_document_bytes
            ),
        ));
    }

    let stream = state
        .orchestrator
        .submit_document(session_id, filename, file.into_inner())
        .map_err(|err| api_error(Status::Conflict, err.to_string()))?;

    match stream.finish().await {
        Ok(outcome) => Ok(Json(UploadResponse {
            success: true,
            filename: filename.to_string(),
            summary: Some(outcome.response),
            error: None,
        })),
        Err(err) => Ok(Json(UploadResponse {
            success: false,
            filename: filename.to_string(),
            summary: None,
            error: Some(err.to_string()),
        })),
    }
}
