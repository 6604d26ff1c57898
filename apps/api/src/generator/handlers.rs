use std::collections::HashMap;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;

use crate::documents::extract::decode_base64;
use crate::errors::{AppError, AppJson};
use crate::generator::layout::layout_document;
use crate::generator::pdf::{fit_logo, jpeg_info, render_pdf, Logo};
use crate::generator::templates::{find_template, Template, TEMPLATES};
use crate::generator::{generate, GeneratedDocument};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub template_id: String,
    #[serde(default)]
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct LogoRequest {
    /// Base64 JPEG, optionally as a data URL.
    pub data: String,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct PdfRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub logo: Option<LogoRequest>,
}

/// GET /api/templates
pub async fn handle_list_templates() -> Json<&'static [Template]> {
    Json(TEMPLATES)
}

/// POST /api/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    AppJson(request): AppJson<GenerateRequest>,
) -> Result<Json<GeneratedDocument>, AppError> {
    let template = find_template(&request.template_id).ok_or_else(|| {
        AppError::NotFound(format!("Unknown template '{}'", request.template_id))
    })?;

    Ok(Json(
        generate(state.llm.as_ref(), template, &request.answers).await?,
    ))
}

/// Requested logo size, defaulting to the image's pixel size, fitted to the logo box.
fn logo_size(request: &LogoRequest, pixel_width: f32, pixel_height: f32) -> (f32, f32) {
    let aspect = pixel_width / pixel_height;
    let (width, height) = match (request.width, request.height) {
        (Some(w), Some(h)) if w > 0.0 && h > 0.0 => (w, h),
        (Some(w), _) if w > 0.0 => (w, w / aspect),
        (_, Some(h)) if h > 0.0 => (h * aspect, h),
        _ => (pixel_width, pixel_height),
    };
    fit_logo(width, height)
}

/// POST /api/generate/pdf
pub async fn handle_pdf(
    AppJson(request): AppJson<PdfRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("Content is required".to_string()));
    }

    let logo_bytes = request
        .logo
        .as_ref()
        .map(|logo| decode_base64(&logo.data))
        .transpose()?;
    let logo = match (&request.logo, &logo_bytes) {
        (Some(req), Some(bytes)) => {
            let info = jpeg_info(bytes)?;
            if info.width == 0 || info.height == 0 {
                return Err(AppError::Validation("Logo has no dimensions".to_string()));
            }
            let size = logo_size(req, f32::from(info.width), f32::from(info.height));
            Some((Logo { jpeg: bytes, info }, size))
        }
        _ => None,
    };

    let title = request.title.trim();
    let pages = layout_document(title, &request.content, logo.as_ref().map(|(_, size)| *size));
    let pdf = render_pdf(title, &pages, logo.as_ref().map(|(logo, _)| logo));

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.pdf\"", file_stem(title)),
            ),
        ],
        Bytes::from(pdf),
    ))
}

fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo(width: Option<f32>, height: Option<f32>) -> LogoRequest {
        LogoRequest {
            data: String::new(),
            width,
            height,
        }
    }

    #[test]
    fn test_logo_size_defaults_to_pixels_then_fits_box() {
        let (w, h) = logo_size(&logo(None, None), 400.0, 100.0);
        assert!((w - 120.0).abs() < 1e-3 && (h - 30.0).abs() < 1e-3, "got {w}x{h}");
    }

    #[test]
    fn test_logo_size_derives_missing_side_from_aspect() {
        assert_eq!(logo_size(&logo(Some(60.0), None), 400.0, 100.0), (60.0, 15.0));
        assert_eq!(logo_size(&logo(None, Some(40.0)), 100.0, 100.0), (40.0, 40.0));
    }

    #[test]
    fn test_file_stem_is_slugged() {
        assert_eq!(file_stem("Non-Disclosure Agreement"), "non-disclosure-agreement");
        assert_eq!(file_stem("  "), "document");
    }
}
