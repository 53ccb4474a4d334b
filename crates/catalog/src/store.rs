use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use stockhold_core::{CategoryId, DomainError, DomainResult, ProductId, VariantId};

use crate::product::{Category, Product, ProductStatus, Variant};

#[derive(Debug, Default)]
struct Inner {
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    variants: HashMap<VariantId, Variant>,
    // SKU uniqueness index.
    sku_index: HashMap<String, VariantId>,
}

/// In-memory catalog registry.
///
/// Ids are UUIDv7, so sorting by id recovers insertion order for listings.
#[derive(Debug, Default)]
pub struct CatalogStore {
    inner: RwLock<Inner>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(
        &self,
        name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Category> {
        let category = Category::new(name, now)?;
        self.inner
            .write()
            .categories
            .insert(category.id, category.clone());
        Ok(category)
    }

    pub fn list_categories(&self) -> Vec<Category> {
        let inner = self.inner.read();
        let mut all: Vec<Category> = inner.categories.values().cloned().collect();
        all.sort_by_key(|c| c.id);
        all
    }

    pub fn add_product(
        &self,
        category_id: CategoryId,
        name: impl Into<String>,
        description: impl Into<String>,
        base_price: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<Product> {
        let mut inner = self.inner.write();
        if !inner.categories.contains_key(&category_id) {
            return Err(DomainError::not_found(format!("category {category_id}")));
        }
        let product = Product::new(category_id, name, description, base_price, now)?;
        inner.products.insert(product.id, product.clone());
        Ok(product)
    }

    pub fn get_product(&self, product_id: ProductId) -> Option<Product> {
        self.inner.read().products.get(&product_id).cloned()
    }

    pub fn list_products(&self) -> Vec<Product> {
        let inner = self.inner.read();
        let mut all: Vec<Product> = inner.products.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        all
    }

    pub fn archive_product(&self, product_id: ProductId) -> DomainResult<Product> {
        let mut inner = self.inner.write();
        let product = inner
            .products
            .get_mut(&product_id)
            .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;
        product.status = ProductStatus::Archived;
        Ok(product.clone())
    }

    pub fn add_variant(
        &self,
        product_id: ProductId,
        sku: impl Into<String>,
        attributes: serde_json::Value,
        price_adjustment: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<Variant> {
        let mut inner = self.inner.write();
        if !inner.products.contains_key(&product_id) {
            return Err(DomainError::not_found(format!("product {product_id}")));
        }
        let variant = Variant::new(product_id, sku, attributes, price_adjustment, now)?;
        if inner.sku_index.contains_key(&variant.sku) {
            return Err(DomainError::validation(format!(
                "SKU {} is already in use",
                variant.sku
            )));
        }
        inner.sku_index.insert(variant.sku.clone(), variant.id);
        inner.variants.insert(variant.id, variant.clone());
        Ok(variant)
    }

    pub fn get_variant(&self, variant_id: VariantId) -> Option<Variant> {
        self.inner.read().variants.get(&variant_id).cloned()
    }

    pub fn list_variants(&self) -> Vec<Variant> {
        let inner = self.inner.read();
        let mut all: Vec<Variant> = inner.variants.values().cloned().collect();
        all.sort_by_key(|v| v.id);
        all
    }

    /// Base price of the variant's product plus the variant's adjustment.
    pub fn effective_price(&self, variant_id: VariantId) -> DomainResult<Decimal> {
        let inner = self.inner.read();
        let variant = inner
            .variants
            .get(&variant_id)
            .ok_or_else(|| DomainError::not_found(format!("variant {variant_id}")))?;
        let product = inner
            .products
            .get(&variant.product_id)
            .ok_or_else(|| DomainError::not_found(format!("product {}", variant.product_id)))?;
        Ok(product.base_price + variant.price_adjustment)
    }
}
