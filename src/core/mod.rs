pub mod compositor;
pub mod document;
pub mod engine;
pub mod geometry;
pub mod locator;

pub use crate::domain::model::{BatchSummary, Record, RecordFailure, RenderedRecord};
pub use crate::domain::ports::{ConfigProvider, Pipeline, QrGenerator, Storage};
pub use crate::utils::error::Result;
