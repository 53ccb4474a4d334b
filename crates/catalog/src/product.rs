use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockhold_core::{CategoryId, DomainError, DomainResult, ProductId, VariantId};

/// Catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        Ok(Self {
            id: CategoryId::new(),
            name,
            created_at: now,
        })
    }
}

/// Product status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Archived,
}

/// A sellable product. `base_price` is the input to pricing quotes; it is not
/// the price a shopper necessarily pays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub base_price: Decimal,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        category_id: CategoryId,
        name: impl Into<String>,
        description: impl Into<String>,
        base_price: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if base_price < Decimal::ZERO {
            return Err(DomainError::validation("base price cannot be negative"));
        }
        Ok(Self {
            id: ProductId::new(),
            category_id,
            name,
            description: description.into(),
            base_price,
            status: ProductStatus::Active,
            created_at: now,
        })
    }

    pub fn can_be_sold(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

/// A concrete purchasable variant of a product (size, colour, ...).
///
/// The variant is the unit of stock keeping: reservations and the ledger key
/// on `VariantId`, never on `ProductId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
    pub attributes: serde_json::Value,
    pub price_adjustment: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Variant {
    pub fn new(
        product_id: ProductId,
        sku: impl Into<String>,
        attributes: serde_json::Value,
        price_adjustment: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        if sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        Ok(Self {
            id: VariantId::new(),
            product_id,
            sku,
            attributes,
            price_adjustment,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn product_rejects_empty_name() {
        let err = Product::new(CategoryId::new(), "   ", "", dec!(10), test_time()).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn product_rejects_negative_base_price() {
        let err =
            Product::new(CategoryId::new(), "Mug", "", dec!(-0.01), test_time()).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn new_products_are_active_and_sellable() {
        let product = Product::new(CategoryId::new(), "Mug", "Ceramic", dec!(12.50), test_time())
            .unwrap();
        assert_eq!(product.status, ProductStatus::Active);
        assert!(product.can_be_sold());
    }

    #[test]
    fn variant_rejects_blank_sku() {
        let err = Variant::new(
            ProductId::new(),
            "  ",
            serde_json::json!({}),
            dec!(0),
            test_time(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
