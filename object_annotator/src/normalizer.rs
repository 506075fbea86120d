use crate::{
    catalog::Catalog,
    detection::{BoundingBox, Detection, Entry, NamedDetection},
    raw::{
        as_number, confidence_value, NormalizeError, RawDetections, RawRecord,
        StructuredDetections,
    },
};
use serde_json::{Map, Value};
use std::sync::Arc;

const DEFAULT_CLASS_NAME: &str = "Unknown";

/// Turns a raw detection result of any supported shape into ordered entries.
#[derive(Debug, Clone)]
pub struct Normalizer {
    catalog: Arc<Catalog>,
}

impl Normalizer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Only an unreadable outer shape is an error; bad entries degrade in place.
    pub fn normalize(&self, raw: &RawDetections) -> Result<Vec<Entry>, NormalizeError> {
        match raw {
            RawDetections::Structured(structured) => self.normalize_structured(structured),
            RawDetections::Records(records) => Ok(records
                .iter()
                .enumerate()
                .map(|(index, record)| self.normalize_record(index, record))
                .collect()),
        }
    }

    fn normalize_structured(
        &self,
        structured: &StructuredDetections,
    ) -> Result<Vec<Entry>, NormalizeError> {
        structured.check_lengths()?;

        let entries = structured
            .xyxy
            .iter()
            .zip(&structured.confidence)
            .zip(&structured.class_id)
            .enumerate()
            .map(|(index, ((bbox, confidence), class_id))| {
                let confidence = coerce_confidence(Some(confidence));
                match parse_box(bbox) {
                    Some(bounding_box) => {
                        let class_id = coerce_class_id(Some(class_id)).unwrap_or(index as i64);
                        Entry::Detected(self.detection(bounding_box, confidence, class_id))
                    }
                    None => Entry::MalformedBox { confidence },
                }
            })
            .collect();

        Ok(entries)
    }

    fn normalize_record(&self, index: usize, record: &RawRecord) -> Entry {
        match record {
            RawRecord::Tuple(fields) => self.normalize_tuple(index, fields),
            RawRecord::Mapping(map) => self.normalize_mapping(map),
            RawRecord::Other(value) => Entry::Unrecognized(display_value(value)),
        }
    }

    fn normalize_tuple(&self, index: usize, fields: &[Value]) -> Entry {
        if fields.len() < 2 {
            return Entry::FormatAbnormal;
        }

        let confidence = coerce_confidence(fields.get(1));
        match parse_box(&fields[0]) {
            Some(bounding_box) => {
                let class_id = coerce_class_id(fields.get(2)).unwrap_or(index as i64);
                Entry::Detected(self.detection(bounding_box, confidence, class_id))
            }
            None => Entry::MalformedBox { confidence },
        }
    }

    fn normalize_mapping(&self, map: &Map<String, Value>) -> Entry {
        let class_name = match map.get("class") {
            None | Some(Value::Null) => DEFAULT_CLASS_NAME.to_string(),
            Some(value) => display_value(value),
        };
        let confidence = coerce_confidence(map.get("confidence"));
        let display_color = self.catalog.palette.for_class_name(&class_name);

        Entry::Named(NamedDetection {
            class_name,
            confidence,
            display_color,
        })
    }

    fn detection(&self, bounding_box: BoundingBox, confidence: f64, class_id: i64) -> Detection {
        Detection {
            bounding_box,
            confidence,
            class_id,
            class_label: self.catalog.categories.label_for(class_id),
            display_color: self.catalog.palette.for_class_id(class_id),
        }
    }
}

/// First four values of an array as box corners; anything shorter is malformed.
fn parse_box(value: &Value) -> Option<BoundingBox> {
    let coords = value.as_array()?;
    if coords.len() < 4 {
        return None;
    }

    let mut corners = [0.0f64; 4];
    for (corner, coord) in corners.iter_mut().zip(coords) {
        *corner = as_number(coord).filter(|v| v.is_finite())?;
    }
    let [x1, y1, x2, y2] = corners;

    Some(BoundingBox::from_corners(x1, y1, x2, y2))
}

fn coerce_confidence(value: Option<&Value>) -> f64 {
    value.and_then(confidence_value).unwrap_or(0.0)
}

fn coerce_class_id(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value
        .as_i64()
        .or_else(|| as_number(value).filter(|v| v.is_finite()).map(|v| v as i64))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use serde_json::json;

    fn normalizer() -> Normalizer {
        Normalizer::new(Arc::new(Catalog::default()))
    }

    fn normalize(value: Value) -> Vec<Entry> {
        let raw = RawDetections::from_json(value).unwrap();
        normalizer().normalize(&raw).unwrap()
    }

    #[test]
    fn test_structured_result() {
        let entries = normalize(json!({
            "xyxy": [[10.4, 10.0, 50.0, 50.9], [1, 2]],
            "confidence": [0.87, 0.4],
            "class_id": [3, 18]
        }));

        assert_eq!(entries.len(), 2);
        let detection = entries[0].detection().unwrap();
        assert_eq!(detection.class_id, 3);
        assert_eq!(detection.class_label, "car");
        assert_eq!(detection.display_color.name, "yellow");
        assert_eq!(
            detection.bounding_box,
            BoundingBox {
                x1: 10,
                y1: 10,
                x2: 50,
                y2: 50
            }
        );
        assert_eq!(entries[1], Entry::MalformedBox { confidence: 0.4 });
    }

    #[test]
    fn test_structured_result_with_mismatched_lengths() {
        let raw = RawDetections::from_json(json!({
            "xyxy": [[10, 10, 50, 50]],
            "confidence": [],
            "class_id": [3]
        }))
        .unwrap();

        assert_eq!(
            normalizer().normalize(&raw),
            Err(NormalizeError::MismatchedLengths {
                boxes: 1,
                confidences: 0,
                class_ids: 1
            })
        );
    }

    #[test]
    fn test_tuple_records() {
        let entries = normalize(json!([
            [[5, 5, 2], 0.9],
            [[0, 0, 10, 10], null, null],
            [[0, 0, 10, 10], "0.5", 1],
            [[1, 1, 2, 2]],
            [[0, 0, 10, 10], 0.3, 1000]
        ]));

        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0], Entry::MalformedBox { confidence: 0.9 });

        let defaulted = entries[1].detection().unwrap();
        assert_eq!(defaulted.confidence, 0.0);
        assert_eq!(defaulted.class_id, 1);
        assert_eq!(defaulted.class_label, "person");

        let parsed = entries[2].detection().unwrap();
        assert_eq!(parsed.confidence, 0.5);
        assert_eq!(parsed.class_label, "person");

        assert_eq!(entries[3], Entry::FormatAbnormal);
        assert_eq!(entries[4].detection().unwrap().class_label, "unknown_1000");
    }

    #[test]
    fn test_non_finite_confidence_reads_as_zero() {
        let entries = normalize(json!([
            [[0, 0, 10, 10], "NaN", 1],
            [[0, 0, 10, 10], "inf", 1],
            {"class": "dog", "confidence": "-infinity"}
        ]));

        assert_eq!(entries[0].detection().unwrap().confidence, 0.0);
        assert_eq!(entries[1].detection().unwrap().confidence, 0.0);
        assert!(matches!(
            &entries[2],
            Entry::Named(named) if named.confidence == 0.0
        ));
        assert_eq!(
            entries[0].summary_line(0),
            "- person: 0.00 (coords: [0, 0, 10, 10], color: blue)"
        );
    }

    #[test]
    fn test_tuple_without_class_id_uses_position() {
        let entries = normalize(json!([
            "skip",
            "skip",
            [[0, 0, 4, 4], 0.8]
        ]));

        let detection = entries[2].detection().unwrap();
        assert_eq!(detection.class_id, 2);
        assert_eq!(detection.display_color, Palette::default().for_class_id(2));
    }

    #[test]
    fn test_mapping_records() {
        let entries = normalize(json!([
            {"class": "dog", "confidence": 0.6},
            {}
        ]));
        let palette = Palette::default();

        assert_eq!(
            entries[0],
            Entry::Named(NamedDetection {
                class_name: "dog".to_string(),
                confidence: 0.6,
                display_color: palette.for_class_name("dog"),
            })
        );
        assert_eq!(
            entries[1],
            Entry::Named(NamedDetection {
                class_name: "Unknown".to_string(),
                confidence: 0.0,
                display_color: palette.for_class_name("Unknown"),
            })
        );
    }

    #[test]
    fn test_other_records_keep_their_text() {
        let entries = normalize(json!(["stray", 42, null]));

        assert_eq!(
            entries,
            vec![
                Entry::Unrecognized("stray".to_string()),
                Entry::Unrecognized("42".to_string()),
                Entry::Unrecognized("null".to_string()),
            ]
        );
    }

    #[test]
    fn test_order_is_preserved() {
        let entries = normalize(json!([
            {"class": "a"},
            [[0, 0, 1, 1], 0.5, 5],
            [1],
            "x",
            [[0, 0], 0.1]
        ]));

        assert!(matches!(entries[0], Entry::Named(_)));
        assert!(matches!(entries[1], Entry::Detected(_)));
        assert!(matches!(entries[2], Entry::FormatAbnormal));
        assert!(matches!(entries[3], Entry::Unrecognized(_)));
        assert!(matches!(entries[4], Entry::MalformedBox { .. }));
    }
}
