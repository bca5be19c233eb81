//! Custody RPC routes.
//!
//! Each operation is a `POST` with a JSON body, mirroring the RPC surface:
//! add, close a period, and query holdings.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use custodian_core::custody::{
    AddCustodyInput, ClosePeriodFilter, ClosePeriodOutcome, CustodyFilter, CustodyRecord,
    PeriodState,
};
use custodian_shared::types::{PageRequest, PageResponse};

use crate::{AppState, error::ApiError};

/// Creates the custody routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/custody/add", post(add_custody_stock))
        .route("/custody/close-period", post(close_period))
        .route("/custody/query", post(get_custody))
        .route("/custody/periods/{period}", get(period_status))
}

/// Optional paging for `/custody/query`.
#[derive(Debug, Default, Deserialize)]
pub struct QueryPaging {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Unpaged query response.
#[derive(Debug, Serialize)]
pub struct CustodyItems {
    /// Matching records.
    pub items: Vec<CustodyRecord>,
}

/// POST `/custody/add` - Accumulate a quantity on a holding.
async fn add_custody_stock(
    State(state): State<AppState>,
    payload: Result<Json<AddCustodyInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(input) = payload?;
    state.custody.add_custody_stock(input).await?;
    Ok(Json(json!({})))
}

/// POST `/custody/close-period` - Close one or more periods.
async fn close_period(
    State(state): State<AppState>,
    payload: Result<Json<ClosePeriodFilter>, JsonRejection>,
) -> Result<Json<ClosePeriodOutcome>, ApiError> {
    let Json(filter) = payload?;
    let outcome = state.custody.close_period(filter).await?;
    Ok(Json(outcome))
}

/// POST `/custody/query` - List holdings matching a filter.
///
/// Without `page` or `per_page` every match is returned under `items`.
async fn get_custody(
    State(state): State<AppState>,
    paging: Result<Query<QueryPaging>, QueryRejection>,
    payload: Result<Json<CustodyFilter>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Query(paging) = paging?;
    let Json(filter) = payload?;

    if paging.page.is_none() && paging.per_page.is_none() {
        let items = state.custody.get_custody(&filter).await?;
        return Ok(Json(CustodyItems { items }).into_response());
    }

    let config = state.custody_config;
    let page = PageRequest::new(
        paging.page.unwrap_or(1),
        paging.per_page.unwrap_or(config.default_page_size),
    )
    .clamped(config.max_page_size);

    let response: PageResponse<CustodyRecord> =
        state.custody.get_custody_page(&filter, page).await?;
    Ok(Json(response).into_response())
}

/// GET `/custody/periods/{period}` - Open or closed state of a period.
async fn period_status(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Json<PeriodState>, ApiError> {
    let state = state.custody.period_status(&period).await?;
    Ok(Json(state))
}
