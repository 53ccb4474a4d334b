use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use stockhold_carts::{Cart, Reservation};
use stockhold_catalog::{Category, Product, Variant};
use stockhold_inventory::StockSnapshot;
use stockhold_pricing::{PricingRule, Quote, RuleKind};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub owner_id: String,
    pub variant_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub owner_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateVariantRequest {
    pub product_id: String,
    pub sku: String,
    #[serde(default = "empty_object")]
    pub attributes: serde_json::Value,
    #[serde(default)]
    pub price_adjustment: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub variant_id: String,
    pub total_quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(flatten)]
    pub kind: RuleKind,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub user_tier: Option<String>,
    pub variant_id: Option<String>,
}

fn empty_object() -> serde_json::Value {
    json!({})
}

fn default_active() -> bool {
    true
}

fn default_quantity() -> u32 {
    1
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn reservation_added_to_json(reservation: &Reservation) -> serde_json::Value {
    json!({
        "status": "added",
        "reservation_id": reservation.id,
        "expires_at": reservation.expires_at,
    })
}

pub fn cart_to_json(cart: &Cart, lines: &[Reservation]) -> serde_json::Value {
    json!({
        "cart_id": cart.id,
        "owner_id": cart.owner_id,
        "status": cart.status,
        "created_at": cart.created_at,
        "lines": lines.iter().map(|line| json!({
            "reservation_id": line.id,
            "variant_id": line.variant_id,
            "quantity": line.quantity,
            "unit_price": line.unit_price,
            "expires_at": line.expires_at,
        })).collect::<Vec<_>>(),
    })
}

pub fn snapshot_to_json(snapshot: &StockSnapshot) -> serde_json::Value {
    json!({
        "variant_id": snapshot.variant_id,
        "total_quantity": snapshot.total_quantity,
        "reserved_quantity": snapshot.reserved_quantity,
        "available_quantity": snapshot.available_quantity,
    })
}

pub fn category_to_json(category: &Category) -> serde_json::Value {
    json!({
        "id": category.id,
        "name": category.name,
        "created_at": category.created_at,
    })
}

pub fn product_to_json(product: &Product) -> serde_json::Value {
    json!({
        "id": product.id,
        "category_id": product.category_id,
        "name": product.name,
        "description": product.description,
        "base_price": product.base_price,
        "status": product.status,
        "created_at": product.created_at,
    })
}

pub fn variant_to_json(variant: &Variant) -> serde_json::Value {
    json!({
        "id": variant.id,
        "product_id": variant.product_id,
        "sku": variant.sku,
        "attributes": variant.attributes,
        "price_adjustment": variant.price_adjustment,
        "created_at": variant.created_at,
    })
}

/// Rules serialize flat: kind fields and the `type` tag sit next to
/// `id`/`priority`/`active`, matching the request shape.
pub fn rule_to_json(rule: &PricingRule) -> serde_json::Value {
    let mut value = serde_json::to_value(&rule.kind).unwrap_or_else(|_| json!({}));
    if let Some(map) = value.as_object_mut() {
        map.insert("id".to_string(), json!(rule.id));
        map.insert("priority".to_string(), json!(rule.priority));
        map.insert("active".to_string(), json!(rule.active));
    }
    value
}

pub fn quote_to_json(quote: &Quote) -> serde_json::Value {
    json!({
        "final_price": quote.final_price,
        "breakdown": quote.breakdown,
    })
}
