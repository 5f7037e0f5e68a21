//! HTTP upload boundary.
//!
//! A small `axum` app with two surfaces:
//!
//! - `/` renders an upload form; posting a file plus a rule set runs
//!   detection and renders the duplicate groups back into the same page.
//!   Form errors (bad strategy, unsupported file, malformed input) are
//!   shown inline rather than as HTTP errors.
//! - `POST /api/detect` accepts records inline as JSON and returns the
//!   same structure as `--output json`, for callers that do not want to
//!   stage files.
//!
//! The server holds no state across requests; every upload builds its own
//! rules and detector.

use std::net::SocketAddr;

use anyhow::Context as _;
use askama::Template;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Json, Multipart};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};

use crate::detect::{
    DetectError, Detection, DetectionSummary, DuplicateDetector, MasterRule, MatchingRule,
    RuleError, Strategy,
};
use crate::error::ExitCode;
use crate::loader::{self, LoadError};
use crate::output::JsonOutput;
use crate::record::Record;

/// Uploads larger than this are rejected before parsing.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Build the application router.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/", get(index).post(upload))
        .route("/api/detect", post(api_detect))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Bind and serve until Ctrl-C.
///
/// Synchronous entry point: builds its own tokio runtime so the CLI can
/// stay a plain blocking binary.
///
/// # Errors
///
/// Runtime construction, bind, or server failures.
pub fn serve(bind: SocketAddr) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to create async runtime")?;
    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .with_context(|| format!("failed to bind {bind}"))?;
        log::info!("listening on http://{bind}");
        axum::serve(listener, router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")
    })
}

async fn shutdown_signal() {
    // If the handler cannot be installed Ctrl-C keeps its default
    // behavior, which still stops the process.
    let _ = tokio::signal::ctrl_c().await;
    log::info!("shutting down");
}

/// The upload page, for both the empty form and rendered results.
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    /// Error message rendered into the page, if the last post failed.
    error: Option<String>,
    /// Results of the last successful post.
    result: Option<PageResult>,
}

impl IndexTemplate {
    fn empty() -> Self {
        Self {
            error: None,
            result: None,
        }
    }

    fn with_error(message: String) -> Self {
        Self {
            error: Some(message),
            result: None,
        }
    }

    fn with_result(result: PageResult) -> Self {
        Self {
            error: None,
            result: Some(result),
        }
    }
}

/// One detection run formatted for HTML presentation.
struct PageResult {
    /// Name of the uploaded file.
    file_name: String,
    /// One-line run summary.
    summary_line: String,
    /// Duplicate groups as display strings.
    groups: Vec<PageGroup>,
    /// Formatted generation timestamp.
    generated_at: String,
    /// Application version.
    version: String,
}

/// A duplicate group formatted for HTML presentation.
struct PageGroup {
    /// Match key display string.
    match_key: String,
    /// Master record display string.
    master: String,
    /// Every group member, master included, as display strings.
    duplicates: Vec<String>,
}

impl PageResult {
    fn new(file_name: &str, detections: &[Detection], summary: &DetectionSummary) -> Self {
        let groups = detections
            .iter()
            .map(|detection| PageGroup {
                match_key: detection.match_key.to_string(),
                master: detection.master.to_string(),
                duplicates: detection
                    .duplicates
                    .iter()
                    .map(|record| record.to_string())
                    .collect(),
            })
            .collect();

        Self {
            file_name: file_name.to_string(),
            summary_line: format!(
                "{} duplicate group(s), {} duplicate record(s) among {} record(s) ({:.1}% duplication)",
                summary.duplicate_groups,
                summary.duplicate_records,
                summary.total_records,
                summary.duplication_rate()
            ),
            groups,
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

async fn index() -> Response {
    render_page(&IndexTemplate::empty())
}

/// Handle a form post: any failure renders back into the page with 200,
/// matching what a browser user expects from an inline form.
async fn upload(mut multipart: Multipart) -> Response {
    let page = match read_form(&mut multipart).await.and_then(detect_upload) {
        Ok(result) => IndexTemplate::with_result(result),
        Err(err) => {
            log::debug!("upload rejected: {err:#}");
            IndexTemplate::with_error(format!("{err:#}"))
        }
    };
    render_page(&page)
}

fn render_page(template: &IndexTemplate) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            log::error!("template render failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// The parsed upload form.
struct UploadForm {
    file_name: String,
    content: Bytes,
    match_fields: Vec<String>,
    master_field: String,
    strategy: Strategy,
}

async fn read_form(multipart: &mut Multipart) -> anyhow::Result<UploadForm> {
    let mut file: Option<(String, Bytes)> = None;
    let mut match_fields: Vec<String> = Vec::new();
    let mut master_field = String::new();
    let mut strategy_token = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .context("malformed multipart request")?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await.context("failed to read upload")?;
                file = Some((file_name, content));
            }
            "match_fields" => {
                match_fields = split_fields(&field.text().await.context("bad match_fields")?);
            }
            "master_field" => {
                master_field = field
                    .text()
                    .await
                    .context("bad master_field")?
                    .trim()
                    .to_string();
            }
            "strategy" => strategy_token = field.text().await.context("bad strategy")?,
            _ => {}
        }
    }

    let (file_name, content) = file.ok_or_else(|| anyhow::anyhow!("no file uploaded"))?;
    if file_name.is_empty() {
        anyhow::bail!("no file selected");
    }
    let strategy = if strategy_token.trim().is_empty() {
        Strategy::Highest
    } else {
        strategy_token.parse()?
    };

    Ok(UploadForm {
        file_name,
        content,
        match_fields,
        master_field,
        strategy,
    })
}

/// Split a comma-separated field list, dropping empty entries.
fn split_fields(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

fn detect_upload(form: UploadForm) -> anyhow::Result<PageResult> {
    let records = loader::load_named(&form.file_name, &form.content)?;
    let matching = MatchingRule::new(form.match_fields)?;
    let master = MasterRule::new(form.master_field, form.strategy)?;
    let detector = DuplicateDetector::new(matching, master);

    let (detections, summary) = detector.detect_with_summary(records)?;
    Ok(PageResult::new(&form.file_name, &detections, &summary))
}

/// Request body for `POST /api/detect`.
#[derive(Debug, Deserialize)]
struct DetectRequest {
    /// Records as flat JSON objects.
    records: Vec<Map<String, JsonValue>>,
    /// Fields used to detect duplicates, in order.
    match_fields: Vec<String>,
    /// Field used to select the master record.
    master_field: String,
    /// Strategy token; defaults to `highest`.
    #[serde(default)]
    strategy: Option<String>,
}

/// JSON error response with a matching HTTP status.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn unprocessable(message: String) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message,
        }
    }
}

impl From<RuleError> for ApiError {
    fn from(err: RuleError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<LoadError> for ApiError {
    fn from(err: LoadError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<DetectError> for ApiError {
    fn from(err: DetectError) -> Self {
        Self::unprocessable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Detect duplicates over inline records.
///
/// Responds 200 with the `--output json` schema whether or not any
/// duplicates were found; the embedded `exit_code` distinguishes the two,
/// exactly as it does for CLI consumers.
async fn api_detect(Json(request): Json<DetectRequest>) -> Response {
    match detect_inline(&request) {
        Ok((detections, summary)) => {
            let exit_code = if detections.is_empty() {
                ExitCode::NoDuplicates
            } else {
                ExitCode::Success
            };
            Json(JsonOutput::new(&detections, &summary, exit_code)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

fn detect_inline(
    request: &DetectRequest,
) -> Result<(Vec<Detection>, DetectionSummary), ApiError> {
    let strategy = match &request.strategy {
        Some(token) => token.parse::<Strategy>()?,
        None => Strategy::Highest,
    };
    let matching = MatchingRule::new(request.match_fields.iter().cloned())?;
    let master = MasterRule::new(request.master_field.clone(), strategy)?;
    let detector = DuplicateDetector::new(matching, master);

    let records = request
        .records
        .iter()
        .enumerate()
        .map(|(index, object)| loader::json::record_from_object(index, object))
        .collect::<Result<Vec<Record>, LoadError>>()?;

    Ok(detector.detect_with_summary(records)?)
}
