use crate::adapters::qr::QrOptions;
use crate::domain::model::{Record, RenderedRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    /// Replaces `path` atomically; readers never observe a partial file.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn csv_path(&self) -> &str;
    fn template_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn group_id(&self) -> &str;
    fn payload_field(&self) -> &str;
    fn fallback_payload_field(&self) -> &str;
    fn identifier_field(&self) -> &str;
    fn concurrency(&self) -> usize;
    fn qr_options(&self) -> QrOptions;
}

/// Produces a standalone SVG (with its own `viewBox`) for a payload.
pub trait QrGenerator: Send + Sync {
    fn generate(&self, payload: &str) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, record: &Record) -> Result<RenderedRecord>;
    async fn load(&self, rendered: RenderedRecord) -> Result<String>;

    /// Short label for log lines and failure reports.
    fn record_label(&self, _record: &Record) -> Option<String> {
        None
    }
}
