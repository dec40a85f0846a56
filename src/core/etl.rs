use crate::core::exporter::{ExportOutcome, Exporter};
use crate::core::pipeline::AuditPipeline;
use crate::core::{ExportConfirmation, FilterStats, Result, TableSink, TableSource};
use crate::utils::monitor::SystemMonitor;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub destination: String,
    pub batches: usize,
    pub matched: usize,
    pub stats: FilterStats,
    pub outcome: ExportOutcome,
}

impl RunSummary {
    pub fn rows_written(&self) -> usize {
        match self.outcome {
            ExportOutcome::Written { rows, .. } => rows,
            ExportOutcome::Cancelled => 0,
        }
    }
}

/// Read, filter, confirm, export. One engine owns one source/sink pair.
pub struct EtlEngine<S: TableSource, K: TableSink> {
    pipeline: AuditPipeline<S>,
    exporter: Exporter<K>,
    monitor: SystemMonitor,
}

impl<S: TableSource, K: TableSink> EtlEngine<S, K> {
    pub fn new(pipeline: AuditPipeline<S>, exporter: Exporter<K>) -> Self {
        Self::new_with_monitoring(pipeline, exporter, false)
    }

    pub fn new_with_monitoring(
        pipeline: AuditPipeline<S>,
        exporter: Exporter<K>,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            pipeline,
            exporter,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &AuditPipeline<S> {
        &self.pipeline
    }

    /// Identifies the source/sink pair; two runs with the same key must not
    /// overlap.
    pub fn run_key(&self) -> String {
        format!(
            "{} -> {}",
            self.pipeline.source().name(),
            self.exporter.sink().name()
        )
    }

    pub fn run(&self, confirmation: &dyn ExportConfirmation) -> Result<RunSummary> {
        tracing::info!("🚀 Starting non-working-day audit: {}", self.run_key());
        self.monitor.log_stats("Start");

        let result = self.pipeline.run()?;
        self.monitor.log_stats("Filter");

        let outcome = self.exporter.export_confirmed(&result, confirmation)?;
        self.monitor.log_stats("Export");
        self.monitor.log_final_stats();

        Ok(RunSummary {
            source: self.pipeline.source().name(),
            destination: self.exporter.sink().name(),
            batches: result.batches,
            matched: result.count(),
            stats: result.stats,
            outcome,
        })
    }
}
