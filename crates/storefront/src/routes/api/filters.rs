//! Vehicle filter API.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::services::filters::{self, VehicleFilters};
use crate::state::AppState;

/// Make/model/year/part-type filter options for this store.
///
/// Always answers `200`; without a KV store, or when KV fails, the lists are
/// empty.
///
/// # Route
///
/// `GET /api/filters`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<VehicleFilters> {
    let code = state.config().store_prefix.kv_code();
    Json(filters::load(state.kv(), code).await)
}
