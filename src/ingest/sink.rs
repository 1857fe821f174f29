//! # Record Sink
//!
//! Downstream consumer of ingested records. Delivery is at-least-once: a
//! crash between delivery and checkpoint persist replays the batch, so
//! implementations must be idempotent or mergeable.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

use super::errors::SinkError;
use crate::store::Record;

/// Consumer of ingested records
pub trait RecordSink: Send + Sync + fmt::Debug {
    fn process(&self, record: &Record) -> Result<(), SinkError>;
}

/// Sink that upserts records by id in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<BTreeMap<String, Record>>,
    deliveries: RwLock<u64>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct records held
    pub fn records(&self) -> Vec<Record> {
        self.records
            .read()
            .map(|r| r.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Total `process` calls, redeliveries included
    pub fn deliveries(&self) -> u64 {
        self.deliveries.read().map(|d| *d).unwrap_or(0)
    }
}

impl RecordSink for MemorySink {
    fn process(&self, record: &Record) -> Result<(), SinkError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| SinkError::Write("Lock poisoned".into()))?;
        records.insert(record.id.clone(), record.clone());

        if let Ok(mut deliveries) = self.deliveries.write() {
            *deliveries += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_redelivery_is_upsert() {
        let sink = MemorySink::new();
        let record = Record::new("a", "porch", NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 1);

        sink.process(&record).unwrap();
        sink.process(&record).unwrap();

        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.deliveries(), 2);
    }
}
