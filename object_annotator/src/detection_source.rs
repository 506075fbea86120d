use crate::raw::{NormalizeError, RawDetections};
use image::RgbImage;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Detection source returned an unreadable result: {0}")]
    InvalidResult(#[from] NormalizeError),
    #[error("Detection source failed: {0}")]
    Failed(String),
}

/// Produces a raw detection result for an image.
///
/// Candidates scoring below `threshold` are expected to be suppressed here,
/// before the result reaches the normalizer.
pub trait DetectionSource: Send + Sync {
    fn detect(&self, image: &RgbImage, threshold: f32) -> Result<RawDetections, SourceError>;
}

/// A detection result computed elsewhere and handed over as JSON, for example
/// alongside an uploaded image. Its shape is only checked on `detect`.
#[derive(Debug, Clone)]
pub struct PayloadSource {
    payload: Value,
}

impl PayloadSource {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }
}

impl DetectionSource for PayloadSource {
    fn detect(&self, _image: &RgbImage, threshold: f32) -> Result<RawDetections, SourceError> {
        let raw = RawDetections::from_json(self.payload.clone())?;
        Ok(raw.retain_above(decimal_threshold(threshold))?)
    }
}

/// Widens `threshold` by its decimal value, so `0.1f32` compares equal to a
/// `0.1` confidence.
fn decimal_threshold(threshold: f32) -> f64 {
    threshold
        .to_string()
        .parse()
        .unwrap_or_else(|_| f64::from(threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_source_applies_threshold() {
        let source = PayloadSource::new(json!([
            [[0, 0, 1, 1], 0.95, 1],
            [[0, 0, 1, 1], 0.05, 2]
        ]));

        let raw = source.detect(&RgbImage::new(4, 4), 0.5).unwrap();

        assert_eq!(raw.len(), 1);
    }

    #[test]
    fn test_payload_source_keeps_confidence_equal_to_threshold() {
        let source = PayloadSource::new(json!([
            [[0, 0, 1, 1], 0.3, 1],
            [[0, 0, 1, 1], 0.1, 2]
        ]));

        assert_eq!(source.detect(&RgbImage::new(4, 4), 0.3).unwrap().len(), 1);
        assert_eq!(source.detect(&RgbImage::new(4, 4), 0.1).unwrap().len(), 2);
        assert_eq!(decimal_threshold(0.1), 0.1);
    }

    #[test]
    fn test_payload_source_drops_string_confidence_below_threshold() {
        let source = PayloadSource::new(json!([[[0, 0, 10, 10], "0.05", 1]]));

        let raw = source.detect(&RgbImage::new(4, 4), 0.5).unwrap();

        assert!(raw.is_empty());
    }

    #[test]
    fn test_payload_source_reports_lengths_before_filtering() {
        let source = PayloadSource::new(json!({
            "xyxy": [[0, 0, 10, 10]],
            "confidence": [0.9, 0.1],
            "class_id": [1]
        }));

        let result = source.detect(&RgbImage::new(4, 4), 0.5);

        assert!(matches!(
            result,
            Err(SourceError::InvalidResult(NormalizeError::MismatchedLengths {
                boxes: 1,
                confidences: 2,
                class_ids: 1
            }))
        ));
    }

    #[test]
    fn test_payload_source_rejects_unknown_shape() {
        let source = PayloadSource::new(json!("not detections"));

        let result = source.detect(&RgbImage::new(4, 4), 0.5);

        assert!(matches!(
            result,
            Err(SourceError::InvalidResult(NormalizeError::UnsupportedShape(_)))
        ));
    }
}
