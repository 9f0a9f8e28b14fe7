use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use partsync_db::{CatalogItemRow, FitmentRow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_page, ApiError, ApiResponse, AppState, Paginated,
    ResponseMeta,
};

const CATALOG_SEARCH_DEFAULT_LIMIT: i64 = 10;
const FITMENT_SEARCH_DEFAULT_LIMIT: i64 = 50;
const PRODUCT_LIST_DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub(super) struct CatalogItemView {
    id: i64,
    sku: String,
    title: String,
    vendor: String,
    short_desc: String,
    long_desc: String,
    attributes: Value,
    pricing: Value,
    qty_available: i32,
    weight: String,
    dimensions: String,
    category: String,
    pies_segment: String,
    pies_base: String,
    pies_sub: String,
    images: Vec<String>,
    synced: bool,
    shopify_product_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CatalogItemRow> for CatalogItemView {
    fn from(row: CatalogItemRow) -> Self {
        Self {
            id: row.id,
            sku: row.sku,
            title: row.title,
            vendor: row.vendor,
            short_desc: row.short_desc,
            long_desc: row.long_desc,
            attributes: row.attributes,
            pricing: row.pricing,
            qty_available: row.qty_available,
            weight: row.weight,
            dimensions: row.dimensions,
            category: row.category,
            pies_segment: row.pies_segment,
            pies_base: row.pies_base,
            pies_sub: row.pies_sub,
            images: row.images,
            synced: row.synced,
            shopify_product_id: row.shopify_product_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct FitmentView {
    id: i64,
    part_number: String,
    year_from: String,
    year_to: String,
    make_id: String,
    model_id: String,
    part_type_id: Option<String>,
    position_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<FitmentRow> for FitmentView {
    fn from(row: FitmentRow) -> Self {
        Self {
            id: row.id,
            part_number: row.part_number,
            year_from: row.year_from,
            year_to: row.year_to,
            make_id: row.make_id,
            model_id: row.model_id,
            part_type_id: row.part_type_id,
            position_id: row.position_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CatalogSearchQuery {
    pub brand: Option<String>,
    pub part: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FitmentSearchQuery {
    pub sku: Option<String>,
    pub make_id: Option<String>,
    pub model_id: Option<String>,
    pub year_from: Option<String>,
    pub year_to: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub vendor: Option<String>,
    pub keyword: Option<String>,
    pub limit: Option<i64>,
}

/// Blank query values are treated as absent.
fn term(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(super) async fn search_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CatalogSearchQuery>,
) -> Result<Json<ApiResponse<Paginated<CatalogItemView>>>, ApiError> {
    let page = normalize_page(query.page);
    let limit = normalize_limit(query.limit, CATALOG_SEARCH_DEFAULT_LIMIT);

    let result = partsync_db::search_catalog_items(
        &state.pool,
        partsync_db::CatalogSearch {
            brand: term(query.brand.as_deref()),
            part: term(query.part.as_deref()),
            make: term(query.make.as_deref()),
            model: term(query.model.as_deref()),
            year: query.year,
            page,
            limit,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: Paginated {
            items: result.rows.into_iter().map(CatalogItemView::from).collect(),
            total: result.total,
            page,
            limit,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn search_fitments(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FitmentSearchQuery>,
) -> Result<Json<ApiResponse<Paginated<FitmentView>>>, ApiError> {
    let page = normalize_page(query.page);
    let limit = normalize_limit(query.limit, FITMENT_SEARCH_DEFAULT_LIMIT);

    let result = partsync_db::search_fitments(
        &state.pool,
        partsync_db::FitmentSearch {
            sku: term(query.sku.as_deref()),
            make_id: term(query.make_id.as_deref()),
            model_id: term(query.model_id.as_deref()),
            year_from: term(query.year_from.as_deref()),
            year_to: term(query.year_to.as_deref()),
            page,
            limit,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: Paginated {
            items: result.rows.into_iter().map(FitmentView::from).collect(),
            total: result.total,
            page,
            limit,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<CatalogItemView>>>, ApiError> {
    let rows = partsync_db::list_catalog_items(
        &state.pool,
        partsync_db::CatalogListFilters {
            vendor: term(query.vendor.as_deref()),
            keyword: term(query.keyword.as_deref()),
            limit: Some(normalize_limit(query.limit, PRODUCT_LIST_DEFAULT_LIMIT)),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CatalogItemView::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
