use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{dispatch, unexpected_reply};
use crate::api::response::{ApiError, AppQuery, JSend, JSendPaginated, Pagination};
use crate::api::session::Caller;
use crate::error::CoreError;
use crate::service::{Call, Reply};
use crate::storage::models::FileMeta;
use crate::AppState;

/// Upper bound for the optional `filename` form field.
const MAX_FILENAME_FIELD: u64 = 1024;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub byte_size: u64,
    pub content_type: String,
    pub filename: String,
    pub id: String,
    pub sha256: String,
    pub uploaded_at: String,
    pub uploader: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    /// Page size; all files when omitted
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_file(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    mut multipart: Multipart,
) -> Result<Json<JSend<FileResponse>>, ApiError> {
    // Refuse before any of the body is read
    let limit = state
        .service
        .lock()
        .await
        .upload_allowance(&caller.identity)?;

    let mut file_data: Option<Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut file_content_type: Option<String> = None;
    let mut filename_override: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_content_type = field.content_type().map(|s| s.to_string());

                let data = read_field(&mut field, limit, |size| {
                    CoreError::QuotaExceeded { size, limit }.into()
                })
                .await?;
                file_data = Some(data);
            }
            "filename" => {
                let data = read_field(&mut field, MAX_FILENAME_FIELD, |_| {
                    ApiError::bad_request("filename field is too long")
                })
                .await?;
                let name = String::from_utf8(data.to_vec())
                    .map_err(|_| ApiError::bad_request("filename must be valid UTF-8"))?;
                filename_override = Some(name);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let content = file_data.ok_or_else(|| ApiError::bad_request("file field is required"))?;
    let filename = filename_override
        .or(file_name)
        .ok_or_else(|| ApiError::bad_request("a filename is required"))?;

    let call = Call::UploadFile {
        filename,
        content_type: file_content_type,
        content,
    };
    match dispatch(&state, &caller.identity, call).await? {
        Reply::File(meta) => Ok(JSend::success(file_to_response(&meta))),
        other => Err(unexpected_reply(other)),
    }
}

/// Download a file's content.
/// Route: GET /files/:id
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let stored = match dispatch(&state, &caller.identity, Call::GetFile { id }).await? {
        Reply::Content(stored) => stored,
        other => return Err(unexpected_reply(other)),
    };
    let meta = stored.meta;

    let mut response = (StatusCode::OK, stored.content).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        meta.content_type
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.byte_size));

    headers.insert(header::CONTENT_DISPOSITION, content_disposition(&meta.filename));

    if let Ok(value) = format!("\"{}\"", meta.sha256).parse() {
        headers.insert(header::ETAG, value);
    }
    if let Ok(value) = meta.sha256.parse() {
        headers.insert("x-content-sha256", value);
    }

    // Content never changes once uploaded, but access is role-checked
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, max-age=3600"),
    );

    Ok(response)
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<JSend<DeleteResponse>>, ApiError> {
    match dispatch(&state, &caller.identity, Call::DeleteFile { id }).await? {
        Reply::Deleted => Ok(JSend::success(DeleteResponse { deleted: true })),
        other => Err(unexpected_reply(other)),
    }
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<JSendPaginated<FileResponse>>, ApiError> {
    if params.limit == Some(0) {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let files = match dispatch(&state, &caller.identity, Call::ListFiles).await? {
        Reply::Files(files) => files,
        other => return Err(unexpected_reply(other)),
    };

    let total = files.len() as u64;
    let limit = params
        .limit
        .unwrap_or_else(|| u32::try_from(total).unwrap_or(u32::MAX));
    let items: Vec<FileResponse> = files
        .iter()
        .skip(params.offset as usize)
        .take(limit as usize)
        .map(file_to_response)
        .collect();

    Ok(JSendPaginated::success(
        items,
        Pagination {
            limit,
            offset: params.offset,
            total,
        },
    ))
}

// ============================================================================
// Helpers
// ============================================================================

/// Read a multipart field, giving up as soon as it grows past `limit` bytes.
async fn read_field(
    field: &mut Field<'_>,
    limit: u64,
    too_large: impl FnOnce(u64) -> ApiError,
) -> Result<Bytes, ApiError> {
    let mut data = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read field: {e}")))?
    {
        let size = (data.len() + chunk.len()) as u64;
        if size > limit {
            return Err(too_large(size));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data.freeze())
}

/// `attachment` disposition. Names that are not plain printable ASCII get an
/// ASCII fallback plus an RFC 5987 `filename*` parameter.
fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();

    let value = if fallback == filename {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(filename)
        )
    };

    HeaderValue::from_str(&value).unwrap_or_else(|_| {
        tracing::warn!(filename, "Dropped filename from Content-Disposition");
        HeaderValue::from_static("attachment")
    })
}

fn file_to_response(file: &FileMeta) -> FileResponse {
    FileResponse {
        byte_size: file.byte_size,
        content_type: file.content_type.clone(),
        filename: file.filename.clone(),
        id: file.id.clone(),
        sha256: file.sha256.clone(),
        uploaded_at: file.uploaded_at.to_rfc3339(),
        uploader: file.uploader.to_string(),
    }
}
