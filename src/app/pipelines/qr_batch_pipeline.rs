use crate::adapters::qr::SvgQrGenerator;
use crate::core::compositor::Compositor;
use crate::core::{ConfigProvider, Pipeline, QrGenerator, Record, RenderedRecord, Storage};
use crate::utils::error::{BatchError, Result};
use std::collections::HashMap;

/// CSV rows in, one composited SVG per row out.
pub struct QrBatchPipeline<S: Storage, C: ConfigProvider, G: QrGenerator = SvgQrGenerator> {
    storage: S,
    config: C,
    generator: G,
    compositor: Compositor,
}

impl<S: Storage, C: ConfigProvider> QrBatchPipeline<S, C, SvgQrGenerator> {
    /// Uses the built-in SVG generator configured from `config`.
    pub async fn from_config(storage: S, config: C) -> Result<Self> {
        let generator = SvgQrGenerator::new(config.qr_options());
        Self::new(storage, config, generator).await
    }
}

impl<S: Storage, C: ConfigProvider, G: QrGenerator> QrBatchPipeline<S, C, G> {
    /// 載入並驗證模板；模板有問題時在處理任何記錄前就失敗
    pub async fn new(storage: S, config: C, generator: G) -> Result<Self> {
        tracing::debug!("Loading template from {}", config.template_path());
        let template = tokio::fs::read_to_string(config.template_path()).await?;
        let compositor = Compositor::new(&template, config.group_id())?;

        let geometry = compositor.geometry();
        tracing::info!(
            "📐 Template QR placeholder '{}': x={} y={} width={} height={}",
            compositor.group_id(),
            geometry.x,
            geometry.y,
            geometry.width,
            geometry.height
        );

        Ok(Self {
            storage,
            config,
            generator,
            compositor,
        })
    }

    fn payload<'r>(&self, record: &'r Record) -> Result<&'r str> {
        record
            .field(self.config.payload_field())
            .or_else(|| record.field(self.config.fallback_payload_field()))
            .ok_or_else(|| BatchError::MissingFieldError {
                row: record.row,
                field: format!(
                    "{} (or {})",
                    self.config.payload_field(),
                    self.config.fallback_payload_field()
                ),
            })
    }

    fn identifier<'r>(&self, record: &'r Record) -> Result<&'r str> {
        record
            .field(self.config.identifier_field())
            .ok_or_else(|| BatchError::MissingFieldError {
                row: record.row,
                field: self.config.identifier_field().to_string(),
            })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, G: QrGenerator> Pipeline for QrBatchPipeline<S, C, G> {
    async fn extract(&self) -> Result<Vec<Record>> {
        tracing::debug!("Reading CSV from {}", self.config.csv_path());
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(self.config.csv_path())?;
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row_number = index + 1;
            match row {
                Ok(row) => {
                    let data: HashMap<String, String> = headers
                        .iter()
                        .zip(row.iter())
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect();
                    records.push(Record::new(row_number, data));
                }
                Err(e) => tracing::warn!("⚠️ Skipping unreadable CSV row {}: {}", row_number, e),
            }
        }

        Ok(records)
    }

    async fn transform(&self, record: &Record) -> Result<RenderedRecord> {
        let identifier = self.identifier(record)?;
        let payload = self.payload(record)?;
        tracing::debug!("Processing QR data for {}: {}", identifier, payload);

        let qr_svg = self.generator.generate(payload)?;
        tracing::debug!("Generated QR SVG length: {}", qr_svg.len());
        let svg = self.compositor.composite(&qr_svg)?;

        Ok(RenderedRecord {
            row: record.row,
            identifier: identifier.to_string(),
            file_name: format!("{}.svg", identifier),
            svg,
        })
    }

    async fn load(&self, rendered: RenderedRecord) -> Result<String> {
        tracing::debug!(
            "Writing row {} ({}) as {}",
            rendered.row,
            rendered.identifier,
            rendered.file_name
        );
        self.storage
            .write_file(&rendered.file_name, rendered.svg.as_bytes())
            .await
    }

    fn record_label(&self, record: &Record) -> Option<String> {
        record.field(self.config.identifier_field()).map(str::to_string)
    }
}
