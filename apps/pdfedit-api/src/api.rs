//! API handlers for the PDF editing server
//!
//! Each editing route reads one multipart form, runs a single
//! `pdfedit_core` operation on the blocking pool and streams the result
//! back as an attachment.

use axum::{
    extract::Multipart,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pdfedit_core::{ImageWatermark, PdfEditError, Rotation, TextWatermark};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ApiError;
use crate::form::UploadForm;

const PDF_MIME: &str = "application/pdf";
const ZIP_MIME: &str = "application/zip";
const NOT_A_PDF: &str = "File must be a PDF";

/// All routes, without middleware.
pub fn routes() -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/log/error", post(handle_log_error))
        .route("/merge", post(handle_merge))
        .route("/split", post(handle_split))
        .route("/protect", post(handle_protect))
        .route("/unlock", post(handle_unlock))
        .route("/metadata/strip", post(handle_strip_metadata))
        .route("/watermark/text", post(handle_watermark_text))
        .route("/watermark/image", post(handle_watermark_image))
        .route("/reorder", post(handle_reorder))
        .route("/rotate", post(handle_rotate))
        .route("/annotate/highlight", post(handle_highlight))
        .route("/compress", post(handle_compress))
        .route("/edit/replace_text", post(handle_replace_text))
}

/// Run a core operation on the blocking pool.
async fn run_blocking<T, F>(operation: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, PdfEditError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| ApiError::Internal(format!("Worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// `<prefix>-<8 hex>.<extension>`
pub fn attachment_name(prefix: &str, extension: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}.{}", prefix, &id[..8], extension)
}

fn attachment(prefix: &str, extension: &str, mime: &'static str, body: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename={}", attachment_name(prefix, extension));
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

fn pdf_attachment(prefix: &str, body: Vec<u8>) -> Response {
    attachment(prefix, "pdf", PDF_MIME, body)
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: "pdfedit-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Error report sent by the browser client
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientError {
    pub message: String,
    pub stack: Option<String>,
    pub component: Option<String>,
    pub url: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Serialize)]
pub struct LoggedResponse {
    pub logged: bool,
}

/// Handler: POST /log/error
pub async fn handle_log_error(Json(report): Json<ClientError>) -> Json<LoggedResponse> {
    let timestamp = report
        .timestamp
        .clone()
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());

    error!(
        target: "client",
        timestamp = %timestamp,
        component = report.component.as_deref().unwrap_or("-"),
        url = report.url.as_deref().unwrap_or("-"),
        user_agent = report.user_agent.as_deref().unwrap_or("-"),
        "{}",
        report.message
    );
    if let Some(stack) = &report.stack {
        for line in stack.lines() {
            error!(target: "client", "  {}", line);
        }
    }

    Json(LoggedResponse { logged: true })
}

/// Handler: POST /merge
pub async fn handle_merge(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let files = form.files("files");
    if files.len() < 2 {
        return Err(ApiError::InvalidRequest(
            "Provide at least two PDFs to merge.".into(),
        ));
    }

    let mut documents = Vec::with_capacity(files.len());
    for upload in files {
        if !upload.filename.to_lowercase().ends_with(".pdf") {
            return Err(ApiError::InvalidRequest(format!(
                "'{}' is not a PDF",
                upload.filename
            )));
        }
        documents.push(upload.data.clone());
    }

    info!("Merge request: {} files", documents.len());
    let merged = run_blocking(move || pdfedit_core::merge_documents(&documents)).await?;
    Ok(pdf_attachment("merged", merged))
}

/// Handler: POST /split
pub async fn handle_split(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("file", NOT_A_PDF)?.data.clone();
    let ranges = form.text_or("ranges", "1-").to_string();

    info!("Split request: ranges '{}'", ranges);
    let archive = run_blocking(move || pdfedit_core::split_to_zip(&pdf, &ranges)).await?;
    Ok(attachment("split", "zip", ZIP_MIME, archive))
}

/// Handler: POST /protect
pub async fn handle_protect(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("file", NOT_A_PDF)?.data.clone();
    let password = form.text("password")?.to_string();

    let protected = run_blocking(move || pdfedit_core::protect(&pdf, &password)).await?;
    Ok(pdf_attachment("protected", protected))
}

/// Handler: POST /unlock
pub async fn handle_unlock(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("file", NOT_A_PDF)?.data.clone();
    let password = form.text("password")?.to_string();

    let unlocked = run_blocking(move || pdfedit_core::unlock(&pdf, &password)).await?;
    Ok(pdf_attachment("unlocked", unlocked))
}

/// Handler: POST /metadata/strip
pub async fn handle_strip_metadata(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("file", NOT_A_PDF)?.data.clone();

    let scrubbed = run_blocking(move || pdfedit_core::strip_metadata(&pdf)).await?;
    Ok(pdf_attachment("scrubbed", scrubbed))
}

/// Handler: POST /watermark/text
pub async fn handle_watermark_text(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("file", NOT_A_PDF)?.data.clone();

    let mut watermark = TextWatermark::new(form.text("text")?);
    watermark.opacity = form.parse_or("opacity", watermark.opacity)?;
    watermark.rotation = form.parse_or("rotation", watermark.rotation)?;
    watermark.font_size = form.parse_or("font_size", watermark.font_size)?;

    info!(
        "Text watermark request: '{}' ({}pt)",
        watermark.text, watermark.font_size
    );
    let output = run_blocking(move || pdfedit_core::watermark_text(&pdf, &watermark)).await?;
    Ok(pdf_attachment("watermarked", output))
}

/// Handler: POST /watermark/image
pub async fn handle_watermark_image(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("pdf_file", "PDF file must be a PDF")?.data.clone();

    let mut watermark = ImageWatermark::new(form.image("image_file")?.data.clone());
    watermark.opacity = form.parse_or("opacity", watermark.opacity)?;
    watermark.scale = form.parse_or("scale", watermark.scale)?;

    let output = run_blocking(move || pdfedit_core::watermark_image(&pdf, &watermark)).await?;
    Ok(pdf_attachment("watermarked", output))
}

/// Handler: POST /reorder
pub async fn handle_reorder(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("file", NOT_A_PDF)?.data.clone();
    let order = form.text("order")?.to_string();

    info!("Reorder request: '{}'", order);
    let output = run_blocking(move || pdfedit_core::reorder(&pdf, &order)).await?;
    Ok(pdf_attachment("reordered", output))
}

/// Handler: POST /rotate
pub async fn handle_rotate(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("file", NOT_A_PDF)?.data.clone();
    let rotation = Rotation::try_from(form.parse_or::<i64>("degrees", 90)?)?;
    let ranges = form.text_or("ranges", "1-").to_string();

    info!("Rotate request: pages '{}' by {}", ranges, rotation);
    let output = run_blocking(move || pdfedit_core::rotate(&pdf, &ranges, rotation)).await?;
    Ok(pdf_attachment("rotated", output))
}

/// Handler: POST /annotate/highlight
pub async fn handle_highlight(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("file", NOT_A_PDF)?.data.clone();
    let items = pdfedit_core::parse_highlights(form.text("highlights")?)?;

    info!("Highlight request: {} items", items.len());
    let output = run_blocking(move || pdfedit_core::highlight(&pdf, &items)).await?;
    Ok(pdf_attachment("highlighted", output))
}

/// Handler: POST /compress
pub async fn handle_compress(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("file", NOT_A_PDF)?.data.clone();

    let output = run_blocking(move || pdfedit_core::compress(&pdf)).await?;
    Ok(pdf_attachment("compressed", output))
}

/// Handler: POST /edit/replace_text
pub async fn handle_replace_text(multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let pdf = form.pdf("file", NOT_A_PDF)?.data.clone();
    let page_index: i64 = form.parse("page_index")?;
    let page_index = usize::try_from(page_index).map_err(|_| {
        PdfEditError::Range(format!("Page index {} is out of range", page_index))
    })?;
    let find = form.text("find_text")?.to_string();
    let replace = form.text("replace_text")?.to_string();
    let fallback = form.optional_file("fallback_font").map(|f| f.data.clone());

    info!(
        "Replace text request: page {}, '{}' -> '{}' (fallback font: {})",
        page_index,
        find,
        replace,
        fallback.is_some()
    );
    let output = run_blocking(move || {
        pdfedit_core::replace_text(&pdf, page_index, &find, &replace, fallback.as_deref())
    })
    .await?;
    Ok(pdf_attachment("edited", output))
}
