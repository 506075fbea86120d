use crate::{
    categories::{CategoryTable, LabelsError},
    config::AnnotationConfig,
    palette::Palette,
};

/// Read-only lookup tables shared by the normalizer and the annotator.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub categories: CategoryTable,
    pub palette: Palette,
}

impl Catalog {
    pub fn new(categories: CategoryTable, palette: Palette) -> Self {
        Self {
            categories,
            palette,
        }
    }

    pub fn from_config(config: &AnnotationConfig) -> Result<Self, LabelsError> {
        let categories = match &config.labels_file {
            Some(path) => {
                let table = CategoryTable::from_file(path)?;
                tracing::info!("Loaded {} categories from {:?}", table.len(), path);
                table
            }
            None => CategoryTable::coco(),
        };

        Ok(Self::new(categories, Palette::default()))
    }
}
