//! Farm command endpoints
//!
//! Each endpoint resolves the `selectedPrinters` form field against the
//! farm, dispatches one action and answers with the outcome list.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, rejection::FormRejection},
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::{ApiState, auth::require_api_key};
use crate::dispatch::{Action, Outcome, Upload};
use crate::farm::DeviceRecord;
use crate::{Error, system};

/// Largest accepted G-code upload
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Error body for rejected requests
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(super) type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = std::result::Result<T, ApiError>;

pub(super) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn from_error(e: &Error) -> ApiError {
    match e {
        Error::UnknownDevice(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
        _ => {
            tracing::error!(error = %e, "farm command failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Form carrying the printer selection
#[derive(Debug, Default, Deserialize)]
pub struct SelectionForm {
    #[serde(rename = "selectedPrinters", default)]
    pub selected_printers: String,
}

/// Form for the preheat endpoint
#[derive(Debug, Deserialize)]
pub struct PreheatForm {
    #[serde(rename = "selectedPrinters", default)]
    pub selected_printers: String,
    pub tool: String,
    pub bed: String,
}

/// Configured printer as listed by the API; never includes the credential
#[derive(Debug, Serialize)]
pub struct PrinterResponse {
    pub id: String,
    pub address: String,
    pub port: u16,
}

impl From<&DeviceRecord> for PrinterResponse {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            id: record.id.clone(),
            address: record.address.clone(),
            port: record.port,
        }
    }
}

/// Build farm command routes with auth middleware
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/printers", get(list_printers))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/print", post(print))
        .route("/cancel", post(cancel))
        .route("/finish", post(finish))
        .route("/preheat", post(preheat))
        .route(
            "/load",
            post(load).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/load/{file_name}", post(load_file))
        .route("/system/shutdown/{target}", post(shutdown))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

/// Resolve the selection and dispatch one action
async fn run(state: &ApiState, action: &Action, selection: &str) -> ApiResult<Json<Vec<Outcome>>> {
    let devices = state.farm.select(selection).map_err(|e| from_error(&e))?;
    dispatch_to(state, action, &devices).await
}

async fn dispatch_to(
    state: &ApiState,
    action: &Action,
    devices: &[DeviceRecord],
) -> ApiResult<Json<Vec<Outcome>>> {
    let outcomes = state
        .dispatcher
        .dispatch(action, devices)
        .await
        .map_err(|e| from_error(&e))?;
    Ok(Json(outcomes))
}

/// List configured printers
async fn list_printers(State(state): State<Arc<ApiState>>) -> Json<Vec<PrinterResponse>> {
    Json(state.farm.all().iter().map(PrinterResponse::from).collect())
}

async fn pause(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<SelectionForm>,
) -> ApiResult<Json<Vec<Outcome>>> {
    run(&state, &Action::Pause, &form.selected_printers).await
}

async fn resume(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<SelectionForm>,
) -> ApiResult<Json<Vec<Outcome>>> {
    run(&state, &Action::Resume, &form.selected_printers).await
}

async fn print(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<SelectionForm>,
) -> ApiResult<Json<Vec<Outcome>>> {
    run(&state, &Action::Print, &form.selected_printers).await
}

async fn cancel(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<SelectionForm>,
) -> ApiResult<Json<Vec<Outcome>>> {
    run(&state, &Action::Cancel, &form.selected_printers).await
}

async fn finish(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<SelectionForm>,
) -> ApiResult<Json<Vec<Outcome>>> {
    run(&state, &Action::Finish, &form.selected_printers).await
}

async fn preheat(
    State(state): State<Arc<ApiState>>,
    Form(form): Form<PreheatForm>,
) -> ApiResult<Json<Vec<Outcome>>> {
    let tool = parse_temperature("tool", &form.tool)?;
    let bed = parse_temperature("bed", &form.bed)?;
    run(&state, &Action::Preheat { tool, bed }, &form.selected_printers).await
}

/// Select and print a file already stored on the printers
async fn load_file(
    State(state): State<Arc<ApiState>>,
    Path(file_name): Path<String>,
    Form(form): Form<SelectionForm>,
) -> ApiResult<Json<Vec<Outcome>>> {
    let action = Action::LoadFile { file_name };
    run(&state, &action, &form.selected_printers).await
}

/// Receive a file, keep a copy, and push it to the selected printers
async fn load(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Vec<Outcome>>> {
    let mut selection = String::new();
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .and_then(sanitize_file_name)
                    .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "invalid file name"))?;
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
                upload = Some(Upload {
                    file_name,
                    content: Arc::from(content.as_ref()),
                });
            }
            Some("selectedPrinters") => {
                selection = field
                    .text()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "missing file field"))?;
    save_upload(&state.upload_dir, &upload)
        .await
        .map_err(|e| from_error(&e))?;

    tracing::info!(
        file = %upload.file_name,
        bytes = upload.content.len(),
        "received file for farm load"
    );

    run(&state, &Action::Load(upload), &selection).await
}

/// Shut down every printer (`farm`) or the selected ones (`printers`)
///
/// A farm-wide shutdown also runs the host shutdown script afterwards.
/// Only the `printers` target reads the selection form.
async fn shutdown(
    State(state): State<Arc<ApiState>>,
    Path(target): Path<String>,
    form: std::result::Result<Form<SelectionForm>, FormRejection>,
) -> ApiResult<Json<Vec<Outcome>>> {
    match target.as_str() {
        "farm" => {
            let devices = state.farm.all();
            let outcomes = dispatch_to(&state, &Action::Shutdown, &devices).await?;

            match system::run_shutdown_script(&state.shutdown_script, system::DEFAULT_COMMAND_TIMEOUT)
                .await
            {
                Ok(report) => tracing::info!(
                    succeeded = report.succeeded,
                    failed = report.failed.len(),
                    "shutdown script finished"
                ),
                Err(e) => tracing::error!(error = %e, "shutdown script not run"),
            }

            Ok(outcomes)
        }
        "printers" => {
            let Form(form) =
                form.map_err(|rejection| api_error(rejection.status(), rejection.body_text()))?;
            run(&state, &Action::Shutdown, &form.selected_printers).await
        }
        other => Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("unknown shutdown target: {other}"),
        )),
    }
}

fn parse_temperature(field: &str, value: &str) -> ApiResult<u16> {
    value.trim().parse().map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("invalid {field} temperature: {value}"),
        )
    })
}

/// Reduce a client file name to a safe single path component
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; whitespace becomes `_`;
/// directory parts and leading dots are dropped.
#[must_use]
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']);

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

async fn save_upload(dir: &FsPath, upload: &Upload) -> crate::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&upload.file_name);
    tokio::fs::write(&path, &upload.content).await?;
    tracing::debug!(path = %path.display(), "saved upload");
    Ok(())
}
