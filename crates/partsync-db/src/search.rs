//! Filtered, paginated read models used by `partsync-server` search endpoints.

use sqlx::PgPool;

use crate::catalog_items::{CatalogItemRow, CATALOG_ITEM_COLUMNS};
use crate::fitments::{FitmentRow, FITMENT_COLUMNS};
use crate::{contains_pattern, page_offset, DbError};

/// One page of results plus the unpaginated match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

/// Catalog search by brand, part number and vehicle.
///
/// `make`, `model` and `year` match through linked fitments: a catalog item
/// matches when at least one fitment with `part_number = sku` satisfies all
/// vehicle filters given. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct CatalogSearch<'a> {
    pub brand: Option<&'a str>,
    pub part: Option<&'a str>,
    pub make: Option<&'a str>,
    pub model: Option<&'a str>,
    pub year: Option<i32>,
    pub page: i64,
    pub limit: i64,
}

impl Default for CatalogSearch<'_> {
    fn default() -> Self {
        Self {
            brand: None,
            part: None,
            make: None,
            model: None,
            year: None,
            page: 1,
            limit: 10,
        }
    }
}

/// Input filters for the plain catalog listing.
///
/// `limit` is `None` to return all items, or `Some(n)` to cap results.
#[derive(Debug, Clone, Default)]
pub struct CatalogListFilters<'a> {
    pub vendor: Option<&'a str>,
    pub keyword: Option<&'a str>,
    pub limit: Option<i64>,
}

/// Fitment search. `sku` is a substring match; the rest are exact.
#[derive(Debug, Clone)]
pub struct FitmentSearch<'a> {
    pub sku: Option<&'a str>,
    pub make_id: Option<&'a str>,
    pub model_id: Option<&'a str>,
    pub year_from: Option<&'a str>,
    pub year_to: Option<&'a str>,
    pub page: i64,
    pub limit: i64,
}

impl Default for FitmentSearch<'_> {
    fn default() -> Self {
        Self {
            sku: None,
            make_id: None,
            model_id: None,
            year_from: None,
            year_to: None,
            page: 1,
            limit: 50,
        }
    }
}

// Stored years that are not 1-4 digits never match a year filter.
const CATALOG_SEARCH_WHERE: &str = "\
     WHERE ($1::TEXT IS NULL OR ci.vendor ILIKE $1) \
       AND ($2::TEXT IS NULL OR ci.sku ILIKE $2) \
       AND (($3::TEXT IS NULL AND $4::TEXT IS NULL AND $5::INT IS NULL) OR EXISTS ( \
             SELECT 1 FROM fitments f \
             WHERE f.part_number = ci.sku \
               AND ($3::TEXT IS NULL OR f.make_id ILIKE $3) \
               AND ($4::TEXT IS NULL OR f.model_id ILIKE $4) \
               AND ($5::INT IS NULL OR $5::INT BETWEEN \
                    (CASE WHEN f.year_from ~ '^[0-9]{1,4}$' THEN f.year_from::INT END) \
                    AND (CASE WHEN f.year_to ~ '^[0-9]{1,4}$' THEN f.year_to::INT END))))";

/// Searches catalog items by brand/part substring and linked vehicle fitment.
///
/// Results are ordered by sku.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn search_catalog_items(
    pool: &PgPool,
    search: CatalogSearch<'_>,
) -> Result<Page<CatalogItemRow>, DbError> {
    let brand = search.brand.map(contains_pattern);
    let part = search.part.map(contains_pattern);
    let make = search.make.map(contains_pattern);
    let model = search.model.map(contains_pattern);

    let columns = CATALOG_ITEM_COLUMNS
        .split(", ")
        .map(|column| format!("ci.{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    let rows_query = format!(
        "SELECT {columns} FROM catalog_items ci {CATALOG_SEARCH_WHERE} \
         ORDER BY ci.sku ASC LIMIT $6 OFFSET $7"
    );
    let rows = sqlx::query_as::<_, CatalogItemRow>(&rows_query)
        .bind(&brand)
        .bind(&part)
        .bind(&make)
        .bind(&model)
        .bind(search.year)
        .bind(search.limit)
        .bind(page_offset(search.page, search.limit))
        .fetch_all(pool)
        .await?;

    let count_query = format!("SELECT COUNT(*) FROM catalog_items ci {CATALOG_SEARCH_WHERE}");
    let total = sqlx::query_scalar::<_, i64>(&count_query)
        .bind(&brand)
        .bind(&part)
        .bind(&make)
        .bind(&model)
        .bind(search.year)
        .fetch_one(pool)
        .await?;

    Ok(Page { rows, total })
}

/// Lists catalog items newest first, filtered by vendor and title keyword.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_catalog_items(
    pool: &PgPool,
    filters: CatalogListFilters<'_>,
) -> Result<Vec<CatalogItemRow>, DbError> {
    let query = format!(
        "SELECT {CATALOG_ITEM_COLUMNS} FROM catalog_items \
         WHERE ($1::TEXT IS NULL OR vendor ILIKE $1) \
           AND ($2::TEXT IS NULL OR title ILIKE $2) \
         ORDER BY created_at DESC, id DESC \
         LIMIT COALESCE($3, 9223372036854775807)"
    );
    let rows = sqlx::query_as::<_, CatalogItemRow>(&query)
        .bind(filters.vendor.map(contains_pattern))
        .bind(filters.keyword.map(contains_pattern))
        .bind(filters.limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

const FITMENT_SEARCH_WHERE: &str = "\
     WHERE ($1::TEXT IS NULL OR part_number ILIKE $1) \
       AND ($2::TEXT IS NULL OR make_id = $2) \
       AND ($3::TEXT IS NULL OR model_id = $3) \
       AND ($4::TEXT IS NULL OR year_from = $4) \
       AND ($5::TEXT IS NULL OR year_to = $5)";

/// Searches stored fitments, ordered by insertion.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn search_fitments(
    pool: &PgPool,
    search: FitmentSearch<'_>,
) -> Result<Page<FitmentRow>, DbError> {
    let sku = search.sku.map(contains_pattern);

    let rows_query = format!(
        "SELECT {FITMENT_COLUMNS} FROM fitments {FITMENT_SEARCH_WHERE} \
         ORDER BY id ASC LIMIT $6 OFFSET $7"
    );
    let rows = sqlx::query_as::<_, FitmentRow>(&rows_query)
        .bind(&sku)
        .bind(search.make_id)
        .bind(search.model_id)
        .bind(search.year_from)
        .bind(search.year_to)
        .bind(search.limit)
        .bind(page_offset(search.page, search.limit))
        .fetch_all(pool)
        .await?;

    let count_query = format!("SELECT COUNT(*) FROM fitments {FITMENT_SEARCH_WHERE}");
    let total = sqlx::query_scalar::<_, i64>(&count_query)
        .bind(&sku)
        .bind(search.make_id)
        .bind(search.model_id)
        .bind(search.year_from)
        .bind(search.year_to)
        .fetch_one(pool)
        .await?;

    Ok(Page { rows, total })
}
