use crate::{
    annotator::{Annotation, Annotator},
    catalog::Catalog,
    detection_source::{DetectionSource, SourceError},
    font::LabelFont,
    normalizer::Normalizer,
    raw::NormalizeError,
};
use image::RgbImage;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

pub const NO_IMAGE_MESSAGE: &str = "no image uploaded.";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error("{0}")]
    Normalize(#[from] NormalizeError),
}

/// What the caller gets back: never an error, at worst no image and a message.
#[derive(Debug, Clone)]
pub struct AnnotationOutcome {
    pub image: Option<RgbImage>,
    pub summary: String,
    pub drawn: usize,
}

impl AnnotationOutcome {
    fn failed(summary: String) -> Self {
        Self {
            image: None,
            summary,
            drawn: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    normalizer: Normalizer,
    annotator: Annotator,
}

impl Pipeline {
    pub fn new(catalog: Arc<Catalog>, font: Arc<LabelFont>) -> Self {
        Self {
            normalizer: Normalizer::new(catalog),
            annotator: Annotator::new(font),
        }
    }

    #[instrument(skip(self, source, image))]
    pub fn detect_objects<S: DetectionSource + ?Sized>(
        &self,
        source: &S,
        image: Option<&RgbImage>,
        threshold: f32,
    ) -> AnnotationOutcome {
        let Some(image) = image else {
            return AnnotationOutcome::failed(NO_IMAGE_MESSAGE.to_string());
        };

        match self.run(source, image, threshold) {
            Ok((annotation, drawn)) => {
                tracing::debug!("Annotated {} detections", drawn);
                AnnotationOutcome {
                    image: Some(annotation.image),
                    summary: annotation.summary,
                    drawn,
                }
            }
            Err(e) => {
                tracing::error!("Detection pipeline failed: {}", e);
                AnnotationOutcome::failed(format!("an error occurred: {}", e))
            }
        }
    }

    fn run<S: DetectionSource + ?Sized>(
        &self,
        source: &S,
        image: &RgbImage,
        threshold: f32,
    ) -> Result<(Annotation, usize), PipelineError> {
        let raw = source.detect(image, threshold)?;
        let entries = self.normalizer.normalize(&raw)?;
        let drawn = entries.iter().filter(|e| e.detection().is_some()).count();

        Ok((self.annotator.annotate(image, &entries), drawn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{detection_source::PayloadSource, raw::RawDetections};
    use image::Rgb;
    use serde_json::json;

    struct FailingSource;

    impl DetectionSource for FailingSource {
        fn detect(&self, _image: &RgbImage, _threshold: f32) -> Result<RawDetections, SourceError> {
            Err(SourceError::Failed("model unavailable".to_string()))
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(
            Arc::new(Catalog::default()),
            Arc::new(LabelFont::bitmap(20.0)),
        )
    }

    fn image() -> RgbImage {
        RgbImage::from_pixel(64, 64, Rgb([10, 20, 30]))
    }

    #[test]
    fn test_missing_image() {
        let source = PayloadSource::new(json!([]));

        let outcome = pipeline().detect_objects(&source, None, 0.5);

        assert!(outcome.image.is_none());
        assert_eq!(outcome.summary, NO_IMAGE_MESSAGE);
    }

    #[test]
    fn test_empty_result_returns_unchanged_copy() {
        let source = PayloadSource::new(json!([]));
        let input = image();

        let outcome = pipeline().detect_objects(&source, Some(&input), 0.5);

        assert_eq!(outcome.image, Some(input.clone()));
        assert_eq!(outcome.summary, "detected object count: 0\nno objects detected.");
        assert_eq!(outcome.drawn, 0);
    }

    #[test]
    fn test_source_image_is_not_mutated() {
        let source = PayloadSource::new(json!({
            "xyxy": [[4, 30, 40, 60]],
            "confidence": [0.87],
            "class_id": [3]
        }));
        let input = image();

        let outcome = pipeline().detect_objects(&source, Some(&input), 0.5);

        assert_eq!(input, image());
        assert_ne!(outcome.image, Some(image()));
        assert_eq!(outcome.drawn, 1);
        assert!(outcome
            .summary
            .contains("- car: 0.87 (coords: [4, 30, 40, 60], color: yellow)"));
    }

    #[test]
    fn test_source_failure_is_absorbed() {
        let outcome = pipeline().detect_objects(&FailingSource, Some(&image()), 0.5);

        assert!(outcome.image.is_none());
        assert_eq!(
            outcome.summary,
            "an error occurred: Detection source failed: model unavailable"
        );
    }

    #[test]
    fn test_outer_shape_failure_is_absorbed() {
        let source = PayloadSource::new(json!({
            "xyxy": [[0, 0, 1, 1], [0, 0, 2, 2]],
            "confidence": [0.9],
            "class_id": [1, 2]
        }));

        let outcome = pipeline().detect_objects(&source, Some(&image()), 0.5);

        assert!(outcome.image.is_none());
        assert!(outcome.summary.starts_with("an error occurred: "));
        assert!(outcome.summary.contains("mismatched lengths"));
    }

    #[test]
    fn test_threshold_is_applied_by_the_source() {
        let source = PayloadSource::new(json!([
            [[0, 0, 10, 10], 0.9, 1],
            [[0, 0, 10, 10], 0.2, 2],
            {"class": "dog", "confidence": 0.6}
        ]));

        let outcome = pipeline().detect_objects(&source, Some(&image()), 0.5);

        assert!(outcome.summary.starts_with("detected object count: 2\n"));
        assert!(outcome.summary.contains("- person: 0.90"));
        assert!(outcome.summary.contains("- dog: 0.60 (color: "));
    }

    #[test]
    fn test_lengths_mismatch_hidden_by_threshold_still_surfaces() {
        let source = PayloadSource::new(json!({
            "xyxy": [[0, 0, 10, 10]],
            "confidence": [0.9, 0.1],
            "class_id": [1]
        }));

        let outcome = pipeline().detect_objects(&source, Some(&image()), 0.5);

        assert!(outcome.image.is_none());
        assert!(outcome.summary.starts_with("an error occurred: "));
        assert!(outcome.summary.contains("mismatched lengths"));
    }
}
