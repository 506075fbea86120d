use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufRead},
    path::Path,
};
use thiserror::Error;

const COCO_CLASSES: [(i64, &str); 80] = [
    (1, "person"),
    (2, "bicycle"),
    (3, "car"),
    (4, "motorcycle"),
    (5, "airplane"),
    (6, "bus"),
    (7, "train"),
    (8, "truck"),
    (9, "boat"),
    (10, "traffic light"),
    (11, "fire hydrant"),
    (13, "stop sign"),
    (14, "parking meter"),
    (15, "bench"),
    (16, "bird"),
    (17, "cat"),
    (18, "dog"),
    (19, "horse"),
    (20, "sheep"),
    (21, "cow"),
    (22, "elephant"),
    (23, "bear"),
    (24, "zebra"),
    (25, "giraffe"),
    (27, "backpack"),
    (28, "umbrella"),
    (31, "handbag"),
    (32, "tie"),
    (33, "suitcase"),
    (34, "frisbee"),
    (35, "skis"),
    (36, "snowboard"),
    (37, "sports ball"),
    (38, "kite"),
    (39, "baseball bat"),
    (40, "baseball glove"),
    (41, "skateboard"),
    (42, "surfboard"),
    (43, "tennis racket"),
    (44, "bottle"),
    (46, "wine glass"),
    (47, "cup"),
    (48, "fork"),
    (49, "knife"),
    (50, "spoon"),
    (51, "bowl"),
    (52, "banana"),
    (53, "apple"),
    (54, "sandwich"),
    (55, "orange"),
    (56, "broccoli"),
    (57, "carrot"),
    (58, "hot dog"),
    (59, "pizza"),
    (60, "donut"),
    (61, "cake"),
    (62, "chair"),
    (63, "couch"),
    (64, "potted plant"),
    (65, "bed"),
    (67, "dining table"),
    (70, "toilet"),
    (72, "tv"),
    (73, "laptop"),
    (74, "mouse"),
    (75, "remote"),
    (76, "keyboard"),
    (77, "cell phone"),
    (78, "microwave"),
    (79, "oven"),
    (80, "toaster"),
    (81, "sink"),
    (82, "refrigerator"),
    (84, "book"),
    (85, "clock"),
    (86, "vase"),
    (87, "scissors"),
    (88, "teddy bear"),
    (89, "hair drier"),
    (90, "toothbrush"),
];

#[derive(Error, Debug)]
pub enum LabelsError {
    #[error("Failed to read labels file: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid line {line_number} in labels file: {line}")]
    InvalidLine { line_number: usize, line: String },
    #[error("Duplicate category id {0} in labels file")]
    DuplicateId(i64),
}

/// Category id to display name.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    names: BTreeMap<i64, String>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::coco()
    }
}

impl CategoryTable {
    /// The COCO-2017 detection taxonomy; ids run 1..=90 with gaps.
    pub fn coco() -> Self {
        let names = COCO_CLASSES
            .iter()
            .map(|(id, name)| (*id, name.to_string()))
            .collect();
        Self { names }
    }

    pub fn get(&self, class_id: i64) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    pub fn label_for(&self, class_id: i64) -> String {
        match self.get(class_id) {
            Some(name) => name.to_string(),
            None => format!("unknown_{}", class_id),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Reads `id,name` lines. Blank lines and lines starting with `#` are skipped.
    pub fn from_file(filepath: &Path) -> Result<Self, LabelsError> {
        let file = File::open(filepath)?;
        Self::from_reader(io::BufReader::new(file))
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self, LabelsError> {
        let mut names = BTreeMap::new();

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let invalid = || LabelsError::InvalidLine {
                line_number: index + 1,
                line: line.clone(),
            };

            let (id, name) = trimmed.split_once(',').ok_or_else(invalid)?;
            let id: i64 = id.trim().parse().map_err(|_| invalid())?;
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid());
            }

            if names.insert(id, name.to_string()).is_some() {
                return Err(LabelsError::DuplicateId(id));
            }
        }

        Ok(Self { names })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_coco_table_has_gaps() {
        let table = CategoryTable::coco();

        assert_eq!(table.len(), 80);
        assert_eq!(table.get(3), Some("car"));
        assert_eq!(table.get(90), Some("toothbrush"));
        assert_eq!(table.get(12), None);
        assert_eq!(table.get(0), None);
    }

    #[test]
    fn test_label_falls_back_to_unknown() {
        let table = CategoryTable::coco();

        assert_eq!(table.label_for(18), "dog");
        assert_eq!(table.label_for(12), "unknown_12");
        assert_eq!(table.label_for(-4), "unknown_-4");
        assert_eq!(table.label_for(1000), "unknown_1000");
    }

    #[test]
    fn test_from_reader() {
        let input = "# custom taxonomy\n0, cat\n\n5,dog house\n";
        let table = CategoryTable::from_reader(Cursor::new(input)).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0), Some("cat"));
        assert_eq!(table.get(5), Some("dog house"));
    }

    #[test]
    fn test_shipped_labels_file_matches_builtin_table() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configuration/coco_labels.txt");
        let table = CategoryTable::from_file(&path).unwrap();
        let builtin = CategoryTable::coco();

        assert_eq!(table.len(), builtin.len());
        for (id, name) in COCO_CLASSES {
            assert_eq!(table.get(id), Some(name));
        }
    }

    #[test]
    fn test_from_reader_rejects_invalid_lines() {
        let err = CategoryTable::from_reader(Cursor::new("1,cat\nbird\n")).unwrap_err();
        assert!(matches!(err, LabelsError::InvalidLine { line_number: 2, .. }));

        let err = CategoryTable::from_reader(Cursor::new("x,cat\n")).unwrap_err();
        assert!(matches!(err, LabelsError::InvalidLine { line_number: 1, .. }));

        let err = CategoryTable::from_reader(Cursor::new("1,cat\n1,dog\n")).unwrap_err();
        assert!(matches!(err, LabelsError::DuplicateId(1)));
    }
}
