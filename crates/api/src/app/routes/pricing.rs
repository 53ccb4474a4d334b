use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use stockhold_core::{ProductId, VariantId};
use stockhold_pricing::{calculate, PricingRule};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/products/:product_id/price", get(quote_price))
        .route("/rules", post(create_rule).get(list_rules))
}

pub async fn quote_price(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
    Query(query): Query<dto::PriceQuery>,
) -> axum::response::Response {
    let product_id: ProductId = match product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    let product = match services.catalog.get_product(product_id) {
        Some(product) => product,
        None => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
    };
    // Archived products stay visible in the catalog but are not quotable.
    if !product.can_be_sold() {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found");
    }

    let base_price = match query.variant_id.as_deref() {
        Some(raw) => {
            let variant_id: VariantId = match raw.parse() {
                Ok(v) => v,
                Err(_) => {
                    return errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "invalid_id",
                        "invalid variant id",
                    )
                }
            };
            let variant = match services.catalog.get_variant(variant_id) {
                Some(variant) => variant,
                None => {
                    return errors::json_error(
                        StatusCode::NOT_FOUND,
                        "not_found",
                        "variant not found",
                    )
                }
            };
            if variant.product_id != product_id {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    "variant does not belong to this product",
                );
            }
            match services.catalog.effective_price(variant_id) {
                Ok(price) => price,
                Err(e) => return errors::domain_error_to_response(e),
            }
        }
        None => product.base_price,
    };

    let rules = services.pricing_rules.fetch_active();
    let quote = calculate(
        base_price,
        query.quantity,
        query.user_tier.as_deref(),
        &rules,
        Utc::now(),
    );
    (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response()
}

pub async fn create_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateRuleRequest>,
) -> axum::response::Response {
    match PricingRule::new(body.priority, body.active, body.kind) {
        Ok(rule) => {
            let rule = services.pricing_rules.add(rule);
            (StatusCode::CREATED, Json(dto::rule_to_json(&rule))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_rules(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let rules: Vec<_> = services
        .pricing_rules
        .list()
        .iter()
        .map(dto::rule_to_json)
        .collect();
    (StatusCode::OK, Json(rules)).into_response()
}
