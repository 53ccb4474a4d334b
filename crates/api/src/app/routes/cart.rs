use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use stockhold_core::{OwnerId, VariantId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/add", post(add_to_cart))
        .route("/checkout", post(checkout))
        .route("/:owner_id", get(get_cart))
}

pub async fn add_to_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddToCartRequest>,
) -> axum::response::Response {
    let owner_id: OwnerId = match body.owner_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid owner id")
        }
    };
    let variant_id: VariantId = match body.variant_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid variant id")
        }
    };

    match services.reservations.reserve(
        owner_id,
        variant_id,
        body.quantity,
        body.unit_price,
        Utc::now(),
    ) {
        Ok(reservation) => (
            StatusCode::OK,
            Json(dto::reservation_added_to_json(&reservation)),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CheckoutRequest>,
) -> axum::response::Response {
    let owner_id: OwnerId = match body.owner_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid owner id")
        }
    };

    match services.checkout.checkout(owner_id) {
        Ok(_receipt) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "checkout successful" })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(owner_id): Path<String>,
) -> axum::response::Response {
    let owner_id: OwnerId = match owner_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid owner id")
        }
    };

    match services.carts.find_by_owner(owner_id) {
        Some(cart) => {
            let lines = services.carts.reservations_for(cart.id);
            (StatusCode::OK, Json(dto::cart_to_json(&cart, &lines))).into_response()
        }
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "cart not found"),
    }
}
