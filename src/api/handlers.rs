//! API request handlers
//!
//! Uploads arrive as `multipart/form-data` with a `file` field, optional
//! repeated `sheet` fields and an optional `utc` flag.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ConverterConfig;
use crate::converter::{Conversion, Converter};
use crate::error::{ConvertError, ConvertResult};
use crate::types::SheetReport;

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Failed request: a status code and a message for the JSON envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ConvertError> for ApiError {
    fn from(e: ConvertError) -> Self {
        let status = match &e {
            ConvertError::NoMatchingSheet { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ConvertError::Workbook(_) | ConvertError::Upload(_) => StatusCode::BAD_REQUEST,
            ConvertError::Io(_)
            | ConvertError::Config(_)
            | ConvertError::Timezone(_)
            | ConvertError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, "request failed: {}", self.message);
        }
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(method: &str, path: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(RootResponse {
        name: "edt-ics".to_string(),
        version: state.version.clone(),
        description: "Timetable workbook to iCalendar converter".to_string(),
        endpoints: vec![
            endpoint("GET", "/health", "Health check endpoint"),
            endpoint("GET", "/version", "Get server version"),
            endpoint(
                "POST",
                "/api/v1/convert",
                "Upload a workbook (multipart field 'file'), receive an .ics file",
            ),
            endpoint(
                "POST",
                "/api/v1/inspect",
                "Upload a workbook, receive the conversion report as JSON",
            ),
        ],
    }))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub sheets: Vec<String>,
    pub timezone: String,
}

/// GET /version - Server version and active conversion settings
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        sheets: state.converter.sheets.clone(),
        timezone: state.converter.timezone.clone(),
    }))
}

/// Fields of an upload form.
#[derive(Debug, Default)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub sheets: Vec<String>,
    pub utc: Option<bool>,
}

impl Upload {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut upload = Upload::default();
        let mut has_file = false;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    upload.file_name = field.file_name().map(str::to_string);
                    upload.bytes = field.bytes().await?.to_vec();
                    has_file = true;
                }
                "sheet" => {
                    let sheet = field.text().await?;
                    if !sheet.trim().is_empty() {
                        upload.sheets.push(sheet.trim().to_string());
                    }
                }
                "utc" => {
                    let value = field.text().await?;
                    upload.utc = Some(parse_flag(&value)?);
                }
                _ => {}
            }
        }

        if !has_file {
            return Err(ConvertError::Upload("missing multipart field 'file'".to_string()).into());
        }
        Ok(upload)
    }

    /// Server configuration with this upload's overrides applied.
    fn config(&self, base: &ConverterConfig) -> ConverterConfig {
        let mut config = base.clone().with_sheets(self.sheets.clone());
        if let Some(utc) = self.utc {
            config.utc = utc;
        }
        config
    }

    /// Name for the returned calendar: "edt.xlsx" → "edt.ics".
    fn download_name(&self) -> String {
        let stem = self
            .file_name
            .as_deref()
            .map(|name| name.rsplit(&['/', '\\'][..]).next().unwrap_or(name))
            .map(|name| name.rsplit_once('.').map_or(name, |(stem, _)| stem))
            .filter(|stem| !stem.trim().is_empty())
            .unwrap_or("edt");

        let cleaned: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}.ics", cleaned)
    }
}

fn parse_flag(value: &str) -> ConvertResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => Err(ConvertError::Upload(format!(
            "invalid value for 'utc': {}",
            other
        ))),
    }
}

/// Conversion is CPU-bound; keep it off the async workers.
///
/// The outer error is a failed task, the inner one a failed conversion.
async fn run_conversion(
    config: ConverterConfig,
    bytes: Vec<u8>,
) -> Result<ConvertResult<Conversion>, ApiError> {
    tokio::task::spawn_blocking(move || Converter::new(config)?.convert_bytes(bytes))
        .await
        .map_err(|e| ApiError::internal(format!("conversion task failed: {}", e)))
}

/// POST /api/v1/convert - Upload a workbook, download the calendar
pub async fn convert(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = Upload::read(multipart).await?;
    let config = upload.config(&state.converter);
    let download_name = upload.download_name();
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id = %request_id,
        file = upload.file_name.as_deref().unwrap_or("-"),
        bytes = upload.bytes.len(),
        "convert request"
    );

    let conversion = run_conversion(config, upload.bytes).await??;

    let headers = [
        (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download_name),
        ),
        (
            HeaderName::from_static("x-events"),
            conversion.report.total_events().to_string(),
        ),
        (
            HeaderName::from_static("x-skipped-rows"),
            conversion.report.total_skipped().to_string(),
        ),
        (HeaderName::from_static("x-request-id"), request_id),
    ];
    Ok((StatusCode::OK, headers, conversion.calendar).into_response())
}

/// Inspect response
#[derive(Debug, Serialize)]
pub struct InspectResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub sheets_found: Vec<String>,
    pub matched: Vec<String>,
    pub events: usize,
    pub skipped_rows: usize,
    pub sheets: Vec<SheetReport>,
}

/// POST /api/v1/inspect - Upload a workbook, get the conversion report
///
/// A workbook without timetable sheets is still a successful inspection:
/// the found sheets are listed and `matched` is empty.
pub async fn inspect(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<InspectResponse>>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let config = upload.config(&state.converter);
    let file_name = upload.file_name.clone();

    let response = match run_conversion(config, upload.bytes).await? {
        Ok(conversion) => {
            let report = conversion.report;
            InspectResponse {
                file_name,
                matched: report.sheets.iter().map(|s| s.name.clone()).collect(),
                events: report.total_events(),
                skipped_rows: report.total_skipped(),
                sheets_found: report.sheets_found,
                sheets: report.sheets,
            }
        }
        Err(ConvertError::NoMatchingSheet { found, .. }) => InspectResponse {
            file_name,
            sheets_found: found,
            matched: Vec::new(),
            events: 0,
            skipped_rows: 0,
            sheets: Vec::new(),
        },
        Err(e) => return Err(e.into()),
    };

    Ok(Json(ApiResponse::ok(response)))
}
