use crate::core::{BatchSummary, Pipeline, Record, RecordFailure};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use futures::stream::{self, StreamExt};

pub struct BatchEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
    concurrency: usize,
}

impl<P: Pipeline> BatchEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
            concurrency: 1,
        }
    }

    /// Records allowed in flight at once. With 1 they run strictly in input order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self) -> Result<BatchSummary> {
        tracing::info!("🚀 Starting batch");
        self.monitor.log_stats("Start");

        let records = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} records", records.len());
        self.monitor.log_stats("Extract");

        let total = records.len();
        let mut outcomes: Vec<(usize, Option<String>, Result<String>)> = stream::iter(records)
            .map(|record| async move {
                let label = self.pipeline.record_label(&record);
                let outcome = self.process(&record).await;
                (record.row, label, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        outcomes.sort_by_key(|(row, _, _)| *row);

        let mut summary = BatchSummary {
            total,
            ..BatchSummary::default()
        };
        for (row, identifier, outcome) in outcomes {
            match outcome {
                Ok(path) => summary.written.push(path),
                Err(e) => summary.failures.push(RecordFailure {
                    row,
                    identifier,
                    reason: e.to_string(),
                }),
            }
        }

        self.monitor.log_stats("Render");
        self.monitor.log_final_stats(total);
        tracing::info!(
            "🏁 Batch finished: {} written, {} failed, {} total",
            summary.succeeded(),
            summary.failed(),
            summary.total
        );

        Ok(summary)
    }

    // 單筆失敗只記錄，不中斷批次
    async fn process(&self, record: &Record) -> Result<String> {
        let outcome = match self.pipeline.transform(record).await {
            Ok(rendered) => self.pipeline.load(rendered).await,
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(path) => tracing::info!("✅ Generated: {}", path),
            Err(e) => tracing::error!(
                "❌ Row {} failed: {} (record: {:?}); 💡 {}",
                record.row,
                e,
                record.data,
                e.recovery_suggestion()
            ),
        }
        outcome
    }
}
