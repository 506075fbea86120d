mod routes;
mod server;
mod telemetry;

pub mod annotator;
pub mod app;
pub mod catalog;
pub mod categories;
pub mod config;
pub mod detection;
pub mod detection_source;
pub mod font;
pub mod normalizer;
pub mod palette;
pub mod pipeline;
pub mod raw;

pub use app::start_app;
pub use pipeline::{AnnotationOutcome, Pipeline};
