pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{toml_config::TomlConfig, LocalStorage};

pub use adapters::qr::{QrOptions, SvgQrGenerator};
pub use app::pipelines::QrBatchPipeline;
pub use core::compositor::{composite, Compositor};
pub use core::engine::BatchEngine;
pub use utils::error::{BatchError, Result};
