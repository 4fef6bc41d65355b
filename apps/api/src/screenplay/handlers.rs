//! Axum route handlers for the Screenplay API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::screenplay::classifier::{classify_script, LineClass};
use crate::screenplay::ScreenplayInput;
use crate::state::AppState;

const PDF_MEDIA_TYPE: &str = "application/pdf";
const PAGE_COUNT_HEADER: &str = "x-page-count";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub script_text: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifiedLineView {
    /// 1-based line number in the submitted text.
    pub line_number: usize,
    pub text: String,
    pub class: LineClass,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub lines: Vec<ClassifiedLineView>,
    /// Whether the text ends inside an open dialogue block.
    pub ends_in_dialogue: bool,
}

/// Raw multipart fields of an export request.
#[derive(Debug, Default)]
struct ExportForm {
    script_text: Option<String>,
    logline: Option<String>,
    shot_list: Option<String>,
    image: Option<Bytes>,
}

impl ExportForm {
    /// Validates the form and decodes the storyboard upload.
    fn into_input(self) -> Result<ScreenplayInput, AppError> {
        let script_text = self
            .script_text
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::Validation("script_text cannot be empty".to_string()))?;

        let image = match self.image {
            Some(data) => Some(image::load_from_memory(&data).map_err(|e| {
                AppError::Validation(format!("image could not be decoded: {e}"))
            })?),
            None => None,
        };

        Ok(ScreenplayInput {
            script_text,
            logline: self.logline.unwrap_or_default(),
            image,
            shot_list: self.shot_list.filter(|s| !s.trim().is_empty()),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/screenplay/export
///
/// Multipart fields: `script_text` (required), `logline`, `shot_list`, `image` (PNG/JPEG).
/// Returns the formatted screenplay as a PDF attachment.
pub async fn handle_export(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_export_form(&mut multipart).await?;
    let has_image = form.image.is_some();
    let formatter = state.formatter.clone();

    // Image decoding and layout are CPU-bound; keep them off the async executor.
    let formatted = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let input = form.into_input()?;
        Ok(formatter.format(&input)?)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in export: {e}")))??;

    info!(
        pages = formatted.page_count,
        bytes = formatted.bytes.len(),
        has_image,
        "Screenplay exported"
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.config.export_filename
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, PDF_MEDIA_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (
                HeaderName::from_static(PAGE_COUNT_HEADER),
                formatted.page_count.to_string(),
            ),
        ],
        formatted.bytes,
    )
        .into_response())
}

/// POST /api/v1/screenplay/classify
///
/// Shows how each line will be read by the formatter, without rendering anything.
pub async fn handle_classify(
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    if request.script_text.trim().is_empty() {
        return Err(AppError::Validation(
            "script_text cannot be empty".to_string(),
        ));
    }

    let (lines, ends_in_dialogue) = classify_script(&request.script_text);
    let lines = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| ClassifiedLineView {
            line_number: i + 1,
            text: line.text,
            class: line.class,
        })
        .collect();

    Ok(Json(ClassifyResponse {
        lines,
        ends_in_dialogue,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_export_form(multipart: &mut Multipart) -> Result<ExportForm, AppError> {
    let mut form = ExportForm::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "script_text" => form.script_text = Some(field.text().await.map_err(malformed)?),
            "logline" => form.logline = Some(field.text().await.map_err(malformed)?),
            "shot_list" => form.shot_list = Some(field.text().await.map_err(malformed)?),
            "image" => {
                let data = field.bytes().await.map_err(malformed)?;
                // Browsers send an empty part when no file was chosen.
                if !data.is_empty() {
                    form.image = Some(data);
                }
            }
            other => debug!(field = other, "Ignoring unknown export field"),
        }
    }

    Ok(form)
}

fn malformed(e: MultipartError) -> AppError {
    AppError::Validation(format!("malformed multipart body: {e}"))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
