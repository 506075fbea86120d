use crate::{
    config::ThresholdConfig,
    detection_source::PayloadSource,
    pipeline::{AnnotationOutcome, Pipeline},
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{io::Cursor, time::Instant};
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Threshold {threshold} is outside [{min}, {max}]")]
    InvalidThreshold { threshold: f32, min: f32, max: f32 },
    #[error("Invalid multipart payload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Detections field is not valid JSON: {0}")]
    DetectionsJson(#[from] serde_json::Error),
    #[error("Failed to decode image: {0}")]
    ImageDecode(image::ImageError),
    #[error("Failed to encode image: {0}")]
    ImageEncode(image::ImageError),
    #[error("Annotation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for AnnotateError {
    fn into_response(self) -> Response {
        let status = match self {
            AnnotateError::InvalidThreshold { .. }
            | AnnotateError::Multipart(_)
            | AnnotateError::DetectionsJson(_)
            | AnnotateError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            AnnotateError::ImageEncode(_) | AnnotateError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, format!("Something went wrong: {}", self)).into_response()
    }
}

#[derive(Deserialize, Debug)]
pub struct AnnotateParams {
    pub threshold: Option<f32>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct AnnotateResponse {
    pub summary: String,
    /// Base64-encoded PNG, absent when nothing could be rendered.
    pub image: Option<String>,
}

#[derive(Debug, Default)]
struct AnnotateForm {
    image: Option<Bytes>,
    detections: Option<Value>,
}

impl AnnotateForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AnnotateError> {
        let mut form = AnnotateForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("image") => {
                    let data = field.bytes().await?;
                    form.image = (!data.is_empty()).then_some(data);
                }
                Some("detections") => {
                    let data = field.bytes().await?;
                    form.detections = Some(serde_json::from_slice(&data)?);
                }
                other => tracing::debug!("Ignoring multipart field {:?}", other),
            }
        }

        Ok(form)
    }
}

fn resolve_threshold(requested: Option<f32>, config: &ThresholdConfig) -> Result<f32, AnnotateError> {
    let threshold = requested.unwrap_or(config.default);
    if !config.contains(threshold) {
        return Err(AnnotateError::InvalidThreshold {
            threshold,
            min: config.min,
            max: config.max,
        });
    }
    Ok(threshold)
}

#[instrument(skip(state, multipart))]
pub async fn annotate_image(
    State(state): State<SharedState>,
    Query(params): Query<AnnotateParams>,
    multipart: Multipart,
) -> Result<Json<AnnotateResponse>, AnnotateError> {
    let threshold = resolve_threshold(params.threshold, &state.threshold)?;
    let form = AnnotateForm::read(multipart).await?;

    let started = Instant::now();
    let pipeline = state.pipeline.clone();
    let (response, outcome) =
        tokio::task::spawn_blocking(move || render(&pipeline, form, threshold)).await??;

    state
        .metrics
        .record_annotation_duration(started.elapsed().as_millis() as u64);
    state.metrics.record_annotation(outcome.label);
    state.metrics.record_drawn_detections(outcome.drawn);

    Ok(Json(response))
}

#[derive(Debug, PartialEq)]
struct RenderOutcome {
    label: &'static str,
    drawn: usize,
}

fn render(
    pipeline: &Pipeline,
    form: AnnotateForm,
    threshold: f32,
) -> Result<(AnnotateResponse, RenderOutcome), AnnotateError> {
    let image = form
        .image
        .map(|bytes| decode_image(&bytes))
        .transpose()?;
    let source = PayloadSource::new(form.detections.unwrap_or(Value::Null));

    let AnnotationOutcome {
        image: annotated,
        summary,
        drawn,
    } = pipeline.detect_objects(&source, image.as_ref(), threshold);

    let label = match (&image, &annotated) {
        (None, _) => "no_image",
        (Some(_), None) => "error",
        (Some(_), Some(_)) => "annotated",
    };
    let encoded = annotated.as_ref().map(encode_png).transpose()?;

    Ok((
        AnnotateResponse {
            summary,
            image: encoded,
        },
        RenderOutcome { label, drawn },
    ))
}

fn decode_image(bytes: &[u8]) -> Result<RgbImage, AnnotateError> {
    let image = image::load_from_memory(bytes).map_err(AnnotateError::ImageDecode)?;
    Ok(image.to_rgb8())
}

fn encode_png(image: &RgbImage) -> Result<String, AnnotateError> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(AnnotateError::ImageEncode)?;
    Ok(STANDARD.encode(cursor.into_inner()))
}
