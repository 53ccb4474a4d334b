//! Catalog domain module: categories, products, variants.
//!
//! Deliberately thin data-wrappers over the catalog store. Stock levels live
//! in the inventory ledger, prices quoted to shoppers in the pricing engine;
//! this crate only answers "what is for sale and at what base price".

pub mod product;
pub mod store;

pub use product::{Category, Product, ProductStatus, Variant};
pub use store::CatalogStore;
