//! Expense Ledger
//!
//! Append-only store for finalized records. Rows are never updated or
//! deleted; `read_recent` returns the newest rows first.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;
use serde::Serialize;
use uuid::Uuid;

use super::database::Database;
use crate::constants::record as record_constants;
use crate::types::{
    ExpenseRecord, ParseWithDefault, RequestKind, Result, ResultExt, log_filter_warn,
};

/// Shared ledger handle, constructed once and injected.
pub type SharedLedger = Arc<dyn LedgerStore>;

/// One stored row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: ExpenseRecord,
    pub source: RequestKind,
    pub created_at: DateTime<Utc>,
}

/// Ledger storage capability
pub trait LedgerStore: Send + Sync {
    /// Append one record. The store serializes its own writes.
    fn append(&self, record: &ExpenseRecord, source: RequestKind) -> Result<LedgerEntry>;

    /// Up to `limit` most recent rows, newest first
    fn read_recent(&self, limit: usize) -> Result<Vec<LedgerEntry>>;

    /// Check that the ledger can be read and written
    fn verify(&self) -> Result<()>;
}

/// SQLite-backed ledger
pub struct SqliteLedger {
    db: Database,
}

impl SqliteLedger {
    /// Open the ledger file and apply migrations
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let db = Database::open(path)?;
        db.initialize()?;
        Ok(Self { db })
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        db.initialize()?;
        Ok(Self { db })
    }

    /// Number of rows stored
    pub fn count(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))
            .with_context("Failed to count expenses")?;
        Ok(count as usize)
    }
}

/// Raw row: (id, date, item, amount, currency, paid_by, source, created_at)
type ExpenseRow = (String, String, String, f64, String, String, String, String);

fn entry_from_row(row: ExpenseRow) -> Result<LedgerEntry> {
    let (id, date, item, amount, currency, paid_by, source, created_at) = row;

    let id = Uuid::parse_str(&id).with_context_fn(|| format!("Corrupted id '{}'", id))?;
    let date = NaiveDate::parse_from_str(&date, record_constants::DATE_FORMAT)
        .with_context_fn(|| format!("Corrupted date for expense {}", id))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .with_context_fn(|| format!("Corrupted timestamp for expense {}", id))?
        .with_timezone(&Utc);

    Ok(LedgerEntry {
        id,
        record: ExpenseRecord {
            date,
            item,
            amount,
            currency,
            paid_by,
        },
        source: RequestKind::parse_or_default(&source),
        created_at,
    })
}

impl LedgerStore for SqliteLedger {
    fn append(&self, record: &ExpenseRecord, source: RequestKind) -> Result<LedgerEntry> {
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            record: record.clone(),
            source,
            created_at: Utc::now(),
        };

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO expenses (id, date, item, amount, currency, paid_by, source, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id.to_string(),
                record.date.format(record_constants::DATE_FORMAT).to_string(),
                record.item,
                record.amount,
                record.currency,
                record.paid_by,
                source.as_str(),
                entry.created_at.to_rfc3339(),
            ],
        )
        .with_context("Failed to append expense")?;

        tracing::debug!(id = %entry.id, "Expense appended to ledger");
        Ok(entry)
    }

    fn read_recent(&self, limit: usize) -> Result<Vec<LedgerEntry>> {
        let conn = self.db.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, date, item, amount, currency, paid_by, source, created_at
                 FROM expenses
                 ORDER BY seq DESC
                 LIMIT ?1",
            )
            .with_context("Failed to prepare recent expenses query")?;

        let rows: Vec<ExpenseRow> = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })
            .with_context("Failed to query recent expenses")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context("Failed to fetch recent expenses")?;

        Ok(rows
            .into_iter()
            .filter_map(|row| log_filter_warn(entry_from_row(row), "Skipping corrupted ledger row"))
            .collect())
    }

    fn verify(&self) -> Result<()> {
        let conn = self.db.connection()?;
        conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get::<_, i64>(0))
            .with_context("Ledger is not readable")?;
        conn.execute_batch("BEGIN IMMEDIATE; ROLLBACK;")
            .with_context("Ledger is not writable")?;
        Ok(())
    }
}
