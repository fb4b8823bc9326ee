pub mod qr_batch_pipeline;

pub use qr_batch_pipeline::QrBatchPipeline;
