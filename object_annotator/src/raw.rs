use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum NormalizeError {
    #[error("Unsupported detection result shape: expected an object or an array, got {0}")]
    UnsupportedShape(&'static str),
    #[error("Structured detection result field `{0}` must be an array")]
    InvalidField(&'static str),
    #[error(
        "Structured detection result has mismatched lengths: {boxes} boxes, {confidences} confidences, {class_ids} class ids"
    )]
    MismatchedLengths {
        boxes: usize,
        confidences: usize,
        class_ids: usize,
    },
}

/// Parallel arrays as produced by detectors that expose `xyxy`,
/// `confidence` and `class_id` columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructuredDetections {
    pub xyxy: Vec<Value>,
    pub confidence: Vec<Value>,
    pub class_id: Vec<Value>,
}

impl StructuredDetections {
    pub fn len(&self) -> usize {
        self.xyxy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xyxy.is_empty()
    }

    pub fn check_lengths(&self) -> Result<(), NormalizeError> {
        let boxes = self.xyxy.len();
        if self.confidence.len() != boxes || self.class_id.len() != boxes {
            return Err(NormalizeError::MismatchedLengths {
                boxes,
                confidences: self.confidence.len(),
                class_ids: self.class_id.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// `(box, confidence[, class_id])`
    Tuple(Vec<Value>),
    /// `{"class": ..., "confidence": ...}`
    Mapping(Map<String, Value>),
    Other(Value),
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(fields) => RawRecord::Tuple(fields),
            Value::Object(map) => RawRecord::Mapping(map),
            other => RawRecord::Other(other),
        }
    }
}

impl RawRecord {
    /// Confidence if the record carries a readable one.
    pub fn confidence(&self) -> Option<f64> {
        match self {
            RawRecord::Tuple(fields) => fields.get(1).and_then(confidence_value),
            RawRecord::Mapping(map) => map.get("confidence").and_then(confidence_value),
            RawRecord::Other(_) => None,
        }
    }
}

/// Numbers, numeric strings and booleans read as `f64`.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// A confidence is only readable when it is a finite number.
pub(crate) fn confidence_value(value: &Value) -> Option<f64> {
    as_number(value).filter(|v| v.is_finite())
}

/// A raw detection result in one of the shapes a detector may hand back.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDetections {
    Structured(StructuredDetections),
    Records(Vec<RawRecord>),
}

impl RawDetections {
    pub fn from_json(value: Value) -> Result<Self, NormalizeError> {
        match value {
            Value::Object(mut map)
                if ["xyxy", "confidence", "class_id"]
                    .iter()
                    .all(|key| map.contains_key(*key)) =>
            {
                let structured = StructuredDetections {
                    xyxy: take_array(&mut map, "xyxy")?,
                    confidence: take_array(&mut map, "confidence")?,
                    class_id: take_array(&mut map, "class_id")?,
                };
                Ok(RawDetections::Structured(structured))
            }
            Value::Array(records) => Ok(RawDetections::Records(
                records.into_iter().map(RawRecord::from).collect(),
            )),
            other => Err(NormalizeError::UnsupportedShape(kind_of(&other))),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawDetections::Structured(structured) => structured.len(),
            RawDetections::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops entries whose confidence is readable and below `threshold`.
    ///
    /// Structured arrays must agree in length before anything is dropped.
    pub fn retain_above(self, threshold: f64) -> Result<Self, NormalizeError> {
        let kept = match self {
            RawDetections::Structured(structured) => {
                structured.check_lengths()?;
                let keep: Vec<bool> = structured
                    .confidence
                    .iter()
                    .map(|value| confidence_value(value).map_or(true, |c| c >= threshold))
                    .collect();
                let filter = |column: Vec<Value>| -> Vec<Value> {
                    column
                        .into_iter()
                        .enumerate()
                        .filter(|(i, _)| keep.get(*i).copied().unwrap_or(true))
                        .map(|(_, value)| value)
                        .collect()
                };
                RawDetections::Structured(StructuredDetections {
                    xyxy: filter(structured.xyxy),
                    confidence: filter(structured.confidence),
                    class_id: filter(structured.class_id),
                })
            }
            RawDetections::Records(records) => RawDetections::Records(
                records
                    .into_iter()
                    .filter(|record| record.confidence().map_or(true, |c| c >= threshold))
                    .collect(),
            ),
        };
        Ok(kept)
    }
}

fn take_array(map: &mut Map<String, Value>, key: &'static str) -> Result<Vec<Value>, NormalizeError> {
    match map.remove(key) {
        Some(Value::Array(values)) => Ok(values),
        _ => Err(NormalizeError::InvalidField(key)),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without xyxy/confidence/class_id",
    }
}
