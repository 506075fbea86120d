use crate::{
    detection::{BoundingBox, Detection, Entry},
    font::LabelFont,
    palette::WHITE,
};
use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use std::sync::Arc;

const STROKE_WIDTH: u32 = 3;
const LABEL_OFFSET: i32 = 25;

#[derive(Debug, Clone)]
pub struct Annotation {
    pub image: RgbImage,
    pub summary: String,
}

/// Draws normalized entries over a copy of the source image and writes the
/// text summary.
#[derive(Debug, Clone)]
pub struct Annotator {
    font: Arc<LabelFont>,
}

impl Annotator {
    pub fn new(font: Arc<LabelFont>) -> Self {
        Self { font }
    }

    pub fn annotate(&self, source: &RgbImage, entries: &[Entry]) -> Annotation {
        let mut image = source.clone();
        for detection in entries.iter().filter_map(Entry::detection) {
            self.draw_detection(&mut image, detection);
        }

        Annotation {
            image,
            summary: summarize(entries),
        }
    }

    fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) {
        let color = detection.display_color.rgb();
        draw_box_outline(image, &detection.bounding_box, color);

        let label = detection.label();
        let x = detection.bounding_box.x1;
        let y = detection.bounding_box.y1 - LABEL_OFFSET;
        let (width, height) = self.font.text_size(&label);
        if width > 0 && height > 0 {
            draw_filled_rect_mut(image, Rect::at(x, y).of_size(width, height), color);
        }
        self.font.draw_text(image, WHITE.rgb(), x, y, &label);
    }
}

/// Outline `STROKE_WIDTH` pixels thick, growing inward from the box edge.
/// Each side is a filled strip, so only the visible part is touched.
fn draw_box_outline(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let (width, height) = (bbox.width(), bbox.height());
    let stroke = STROKE_WIDTH.min(width).min(height);
    let inner = stroke as i32 - 1;

    let sides = [
        Rect::at(bbox.x1, bbox.y1).of_size(width, stroke),
        Rect::at(bbox.x1, bbox.y2 - inner).of_size(width, stroke),
        Rect::at(bbox.x1, bbox.y1).of_size(stroke, height),
        Rect::at(bbox.x2 - inner, bbox.y1).of_size(stroke, height),
    ];
    for side in sides {
        draw_filled_rect_mut(image, side, color);
    }
}

pub fn summarize(entries: &[Entry]) -> String {
    let mut lines = vec![format!("detected object count: {}", entries.len())];

    if entries.is_empty() {
        lines.push("no objects detected.".to_string());
    } else {
        lines.push("detected objects:".to_string());
        lines.extend(
            entries
                .iter()
                .enumerate()
                .map(|(index, entry)| entry.summary_line(index)),
        );
    }

    lines.join("\n")
}
