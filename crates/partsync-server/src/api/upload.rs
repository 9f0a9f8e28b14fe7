//! Feed ingestion endpoints: PIES and ACES XML uploads plus the JSON fitment
//! upload.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use partsync_core::{dedup_fitments, CatalogItem, FitmentEntry};
use partsync_feeds::{AcesDocument, FeedError};
use serde::{Deserialize, Deserializer, Serialize};

use crate::middleware::RequestId;

use super::sync::SyncFailureItem;
use super::{map_db_error, map_feed_error, ApiError, ApiResponse, AppState, ResponseMeta};

const PIES_FIELD: &str = "pies";
const ACES_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub(super) struct PiesUploadSummary {
    parsed: usize,
    stored: usize,
    skipped: usize,
    uploaded: usize,
    failed: usize,
    failures: Vec<SyncFailureItem>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct FitmentUploadSummary {
    /// Applications in the request, complete or not.
    parsed: usize,
    /// Complete, distinct applications offered for insert.
    kept: usize,
    inserted: usize,
    /// Kept applications whose key was already stored.
    skipped: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct AcesUpload {
    aces: Vec<AcesJsonEntry>,
}

/// One application as posted by clients. Field names follow the feed's
/// camelCase JSON form; numeric ids are accepted as numbers or strings.
#[derive(Debug, Deserialize)]
pub(super) struct AcesJsonEntry {
    #[serde(alias = "sku", default, deserialize_with = "opt_text")]
    part_number: Option<String>,
    #[serde(alias = "yearFrom", default, deserialize_with = "opt_text")]
    year_from: Option<String>,
    #[serde(alias = "yearTo", default, deserialize_with = "opt_text")]
    year_to: Option<String>,
    #[serde(alias = "makeId", alias = "make_id", default, deserialize_with = "opt_text")]
    make: Option<String>,
    #[serde(alias = "modelId", alias = "model_id", default, deserialize_with = "opt_text")]
    model: Option<String>,
    #[serde(alias = "partTypeId", alias = "part_type_id", default, deserialize_with = "opt_text")]
    part_type: Option<String>,
    #[serde(alias = "positionId", alias = "position_id", default, deserialize_with = "opt_text")]
    position: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Integer(i64),
}

fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<TextOrNumber>::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        let text = match v {
            TextOrNumber::Text(text) => text.trim().to_owned(),
            TextOrNumber::Integer(n) => n.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }))
}

impl AcesJsonEntry {
    fn into_entry(self) -> Option<FitmentEntry> {
        let entry = FitmentEntry {
            part_number: self.part_number?,
            make: self.make?,
            model: self.model?,
            part_type: self.part_type,
            position: self.position,
            year_from: self.year_from?,
            year_to: self.year_to?,
        };
        entry.is_complete().then_some(entry)
    }
}

pub(super) async fn upload_pies(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<PiesUploadSummary>>, ApiError> {
    let bytes = read_field(&mut multipart, PIES_FIELD, &req_id.0).await?;
    let items = parse_off_thread(bytes, partsync_feeds::parse_pies, &req_id.0).await?;
    let parsed = items.len();

    let stored = partsync_db::store_catalog_items(&state.pool, &items)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(
        parsed,
        stored = stored.written,
        skipped = stored.skipped,
        "stored PIES upload"
    );

    let mut summary = PiesUploadSummary {
        parsed,
        stored: stored.written,
        skipped: stored.skipped,
        uploaded: 0,
        failed: 0,
        failures: Vec::new(),
    };

    if state.config.sync_on_upload {
        if let Some(shopify) = &state.shopify {
            let storable: Vec<CatalogItem> =
                items.into_iter().filter(CatalogItem::is_storable).collect();
            let outcome = shopify.push_and_mark(&state.pool, &storable).await;
            summary.uploaded = outcome.synced;
            summary.failed = outcome.failures.len();
            summary.failures = outcome.failures;
        }
    }

    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn upload_aces_xml(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FitmentUploadSummary>>, ApiError> {
    let bytes = read_field(&mut multipart, ACES_FIELD, &req_id.0).await?;
    let document: AcesDocument =
        parse_off_thread(bytes, partsync_feeds::parse_aces_document, &req_id.0).await?;

    if document.applications == 0 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "ACES document contains no App elements",
        ));
    }

    let summary = store_entries(&state, document.applications, document.entries, &req_id.0).await?;
    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn upload_aces_json(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<AcesUpload>, JsonRejection>,
) -> Result<Json<ApiResponse<FitmentUploadSummary>>, ApiError> {
    let Json(body) =
        payload.map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.body_text()))?;
    let parsed = body.aces.len();
    let entries: Vec<FitmentEntry> = body
        .aces
        .into_iter()
        .filter_map(AcesJsonEntry::into_entry)
        .collect();

    let summary = store_entries(&state, parsed, entries, &req_id.0).await?;
    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn store_entries(
    state: &AppState,
    parsed: usize,
    entries: Vec<FitmentEntry>,
    request_id: &str,
) -> Result<FitmentUploadSummary, ApiError> {
    let entries = dedup_fitments(entries);
    let kept = entries.len();
    let stored = partsync_db::store_fitments(&state.pool, &entries)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?;

    tracing::info!(
        parsed,
        kept,
        inserted = stored.written,
        skipped = stored.skipped,
        "stored fitment upload"
    );
    Ok(FitmentUploadSummary {
        parsed,
        kept,
        inserted: stored.written,
        skipped: stored.skipped,
    })
}

/// Returns the bytes of the first multipart field called `name`.
async fn read_field(
    multipart: &mut Multipart,
    name: &str,
    request_id: &str,
) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(request_id, &e))?
    {
        if field.name() == Some(name) {
            return field
                .bytes()
                .await
                .map_err(|e| map_multipart_error(request_id, &e));
        }
    }
    Err(ApiError::new(
        request_id,
        "bad_request",
        format!("missing multipart field `{name}`"),
    ))
}

fn map_multipart_error(request_id: &str, error: &MultipartError) -> ApiError {
    let code = if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        "payload_too_large"
    } else {
        "bad_request"
    };
    ApiError::new(request_id, code, error.body_text())
}

/// Runs a feed parser on the blocking pool so large documents do not stall
/// the runtime.
async fn parse_off_thread<T, F>(bytes: Bytes, parse: F, request_id: &str) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&[u8]) -> Result<T, FeedError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || parse(&bytes))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "feed parser task failed");
            ApiError::new(request_id, "internal_error", "feed parser task failed")
        })?
        .map_err(|e| map_feed_error(request_id.to_owned(), &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_entry_accepts_camel_case_and_numeric_ids() {
        let body: AcesUpload = serde_json::from_str(
            r#"{"aces":[{"sku":"BP-100","yearFrom":2010,"yearTo":"2015","makeId":54,"modelId":"668","partTypeId":1684}]}"#,
        )
        .expect("parse body");

        let entry = body
            .aces
            .into_iter()
            .next()
            .and_then(AcesJsonEntry::into_entry)
            .expect("complete entry");
        assert_eq!(entry.part_number, "BP-100");
        assert_eq!(entry.year_from, "2010");
        assert_eq!(entry.make, "54");
        assert_eq!(entry.part_type.as_deref(), Some("1684"));
        assert_eq!(entry.position, None);
    }

    #[test]
    fn json_entry_accepts_snake_case_names() {
        let entry: AcesJsonEntry = serde_json::from_str(
            r#"{"part_number":"RT-220","year_from":"2001","year_to":"2003","make_id":"12","model_id":"34"}"#,
        )
        .expect("parse entry");
        assert!(entry.into_entry().is_some());
    }

    #[test]
    fn json_entry_missing_or_blank_key_field_is_dropped() {
        let missing: AcesJsonEntry =
            serde_json::from_str(r#"{"sku":"BP-100","yearFrom":"2010","makeId":"54","modelId":"668"}"#)
                .expect("parse entry");
        assert!(missing.into_entry().is_none());

        let blank: AcesJsonEntry = serde_json::from_str(
            r#"{"sku":"  ","yearFrom":"2010","yearTo":"2012","makeId":"54","modelId":"668"}"#,
        )
        .expect("parse entry");
        assert!(blank.into_entry().is_none());
    }

    #[test]
    fn json_entry_null_optional_fields_are_none() {
        let entry: AcesJsonEntry = serde_json::from_str(
            r#"{"sku":"BP-100","yearFrom":"2010","yearTo":"2012","makeId":"54","modelId":"668","positionId":null}"#,
        )
        .expect("parse entry");
        assert_eq!(entry.into_entry().and_then(|e| e.position), None);
    }
}
