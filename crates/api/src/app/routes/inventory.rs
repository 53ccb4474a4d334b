use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockhold_core::VariantId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/records", post(create_record).get(list_records))
        .route("/records/:variant_id", get(get_record))
        .route("/records/:variant_id/restock", post(restock))
}

pub async fn list_records(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let records: Vec<_> = services
        .ledger
        .variant_ids()
        .into_iter()
        .filter_map(|variant_id| services.ledger.snapshot(variant_id).ok())
        .map(|snapshot| dto::snapshot_to_json(&snapshot))
        .collect();
    (StatusCode::OK, Json(records)).into_response()
}

pub async fn create_record(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateRecordRequest>,
) -> axum::response::Response {
    let variant_id: VariantId = match body.variant_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid variant id")
        }
    };

    match services.ledger.create_record(variant_id, body.total_quantity) {
        Ok(snapshot) => {
            (StatusCode::CREATED, Json(dto::snapshot_to_json(&snapshot))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_record(
    Extension(services): Extension<Arc<AppServices>>,
    Path(variant_id): Path<String>,
) -> axum::response::Response {
    let variant_id: VariantId = match variant_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid variant id")
        }
    };

    match services.ledger.snapshot(variant_id) {
        Ok(snapshot) => (StatusCode::OK, Json(dto::snapshot_to_json(&snapshot))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn restock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(variant_id): Path<String>,
    Json(body): Json<dto::RestockRequest>,
) -> axum::response::Response {
    let variant_id: VariantId = match variant_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid variant id")
        }
    };

    let mut guard = match services.ledger.lock_and_get(variant_id) {
        Ok(guard) => guard,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match guard.restock(body.quantity) {
        Ok(()) => (StatusCode::OK, Json(dto::snapshot_to_json(&guard.snapshot()))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
