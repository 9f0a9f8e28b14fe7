//! Database operations for `fitments`.

use chrono::{DateTime, Utc};
use partsync_core::FitmentEntry;
use sqlx::PgPool;

use crate::{DbError, StoreSummary};

pub(crate) const FITMENT_COLUMNS: &str = "id, part_number, year_from, year_to, make_id, \
     model_id, part_type_id, position_id, created_at, updated_at";

/// A row from the `fitments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FitmentRow {
    pub id: i64,
    pub part_number: String,
    pub year_from: String,
    pub year_to: String,
    pub make_id: String,
    pub model_id: String,
    pub part_type_id: Option<String>,
    pub position_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FitmentRow> for FitmentEntry {
    fn from(row: FitmentRow) -> Self {
        Self {
            part_number: row.part_number,
            make: row.make_id,
            model: row.model_id,
            part_type: row.part_type_id,
            position: row.position_id,
            year_from: row.year_from,
            year_to: row.year_to,
        }
    }
}

/// Inserts a fitment unless one with the same key already exists.
///
/// Returns `true` when a row was inserted, `false` when the key was present.
/// An existing row is never modified.
///
/// # Errors
///
/// Returns [`DbError::InvalidRecord`] if any key field is blank, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_fitment_if_absent(pool: &PgPool, entry: &FitmentEntry) -> Result<bool, DbError> {
    if !entry.is_complete() {
        return Err(DbError::InvalidRecord(format!(
            "fitment for part '{}' is missing a key field",
            entry.part_number
        )));
    }

    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO fitments \
             (part_number, year_from, year_to, make_id, model_id, part_type_id, position_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT ON CONSTRAINT fitments_key DO NOTHING \
         RETURNING id",
    )
    .bind(&entry.part_number)
    .bind(&entry.year_from)
    .bind(&entry.year_to)
    .bind(&entry.make)
    .bind(&entry.model)
    .bind(&entry.part_type)
    .bind(&entry.position)
    .fetch_optional(pool)
    .await?;

    Ok(inserted.is_some())
}

/// Inserts each complete fitment that is not already stored.
///
/// Incomplete entries and existing keys both count as skipped.
///
/// # Errors
///
/// Returns the first [`DbError::Sqlx`] from the database; entries before it
/// stay written.
pub async fn store_fitments(
    pool: &PgPool,
    entries: &[FitmentEntry],
) -> Result<StoreSummary, DbError> {
    let mut summary = StoreSummary::default();
    for entry in entries {
        if !entry.is_complete() {
            summary.skipped += 1;
            continue;
        }
        if insert_fitment_if_absent(pool, entry).await? {
            summary.written += 1;
        } else {
            summary.skipped += 1;
        }
    }
    Ok(summary)
}
