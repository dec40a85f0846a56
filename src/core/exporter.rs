use crate::core::{ExportConfirmation, FilterResult, Result, TableSink};
use serde::Serialize;

pub const DEFAULT_OUTPUT_FILE: &str = "conexiones_feriados_y_fines_de_semana.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    Written { destination: String, rows: usize },
    Cancelled,
}

pub struct Exporter<K: TableSink> {
    sink: K,
}

impl<K: TableSink> Exporter<K> {
    pub fn new(sink: K) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Writes every row and column of the result, in order.
    pub fn export(&self, result: &FilterResult) -> Result<usize> {
        let written = self.sink.write_table(&result.columns, &result.rows)?;
        tracing::info!("💾 Exported {} rows to {}", written, self.sink.name());
        Ok(written)
    }

    /// Asks first. Declining touches nothing on the sink.
    pub fn export_confirmed(
        &self,
        result: &FilterResult,
        confirmation: &dyn ExportConfirmation,
    ) -> Result<ExportOutcome> {
        let destination = self.sink.name();
        if !confirmation.confirm(result, &destination) {
            tracing::info!("Export to {} cancelled by the user", destination);
            return Ok(ExportOutcome::Cancelled);
        }

        let rows = self.export(result)?;
        Ok(ExportOutcome::Written { destination, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemorySink;
    use crate::core::{FilterStats, Row, Schema};
    use std::sync::Arc;

    fn result() -> FilterResult {
        let schema = Arc::new(Schema::new(vec!["start_date".into(), "user".into(), "ip".into()]));
        FilterResult {
            columns: schema.columns().to_vec(),
            rows: vec![
                Row::new(
                    Arc::clone(&schema),
                    vec![Some("2019-01-06".into()), Some("b".into()), Some("10.0.0.2".into())],
                ),
                Row::new(
                    Arc::clone(&schema),
                    vec![Some("2019-01-05".into()), Some("a".into()), None],
                ),
            ],
            stats: FilterStats::default(),
            batches: 1,
        }
    }

    #[test]
    fn test_declined_export_writes_nothing() {
        let sink = MemorySink::new("memory://out");
        let exporter = Exporter::new(sink.clone());

        let outcome = exporter.export_confirmed(&result(), &false).unwrap();

        assert_eq!(outcome, ExportOutcome::Cancelled);
        assert!(sink.tables().is_empty());
    }

    #[test]
    fn test_confirmed_export_keeps_order_and_columns() {
        let sink = MemorySink::new("memory://out");
        let exporter = Exporter::new(sink.clone());

        let outcome = exporter.export_confirmed(&result(), &true).unwrap();
        assert_eq!(
            outcome,
            ExportOutcome::Written {
                destination: "memory://out".to_string(),
                rows: 2
            }
        );

        let tables = sink.tables();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].columns, vec!["start_date", "user", "ip"]);
        assert_eq!(tables[0].rows[0][2], Some("10.0.0.2".to_string()));
        assert_eq!(tables[0].rows[1][1], Some("a".to_string()));
    }

    #[test]
    fn test_sink_failure_is_propagated() {
        let sink = MemorySink::new("memory://broken").failing();
        let exporter = Exporter::new(sink);

        assert!(exporter.export_confirmed(&result(), &true).is_err());
    }
}
