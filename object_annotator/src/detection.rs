use crate::palette::NamedColor;

/// Coordinates are clamped to this magnitude so box arithmetic cannot overflow.
pub const COORD_LIMIT: i32 = 1 << 24;

/// Pixel box with `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Truncates each coordinate toward zero and swaps reversed corners.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let (x1, x2) = ordered(to_pixel(x1), to_pixel(x2));
        let (y1, y2) = ordered(to_pixel(y1), to_pixel(y2));
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x1.abs_diff(self.x2) + 1
    }

    pub fn height(&self) -> u32 {
        self.y1.abs_diff(self.y2) + 1
    }
}

fn to_pixel(value: f64) -> i32 {
    (value as i32).clamp(-COORD_LIMIT, COORD_LIMIT)
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub confidence: f64,
    pub class_id: i64,
    pub class_label: String,
    pub display_color: NamedColor,
}

impl Detection {
    pub fn label(&self) -> String {
        format!("{}: {:.2}", self.class_label, self.confidence)
    }
}

/// A detection that only carries a class name, so it has no box to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedDetection {
    pub class_name: String,
    pub confidence: f64,
    pub display_color: NamedColor,
}

/// One normalized entry of a raw detection result, in raw result order.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Detected(Detection),
    MalformedBox { confidence: f64 },
    FormatAbnormal,
    Named(NamedDetection),
    Unrecognized(String),
}

impl Entry {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            Entry::Detected(detection) => Some(detection),
            _ => None,
        }
    }

    /// Summary line; `index` is the 0-based position in the raw result.
    pub fn summary_line(&self, index: usize) -> String {
        let number = index + 1;
        match self {
            Entry::Detected(d) => {
                let b = &d.bounding_box;
                format!(
                    "- {}: {:.2} (coords: [{}, {}, {}, {}], color: {})",
                    d.class_label, d.confidence, b.x1, b.y1, b.x2, b.y2, d.display_color
                )
            }
            Entry::MalformedBox { confidence } => {
                format!("- Object {}: {:.2} (coordinate data abnormal)", number, confidence)
            }
            Entry::FormatAbnormal => format!("- Object {}: data format abnormal", number),
            Entry::Named(named) => format!(
                "- {}: {:.2} (color: {})",
                named.class_name, named.confidence, named.display_color
            ),
            Entry::Unrecognized(text) => format!("- Object {}: {}", number, text),
        }
    }
}
