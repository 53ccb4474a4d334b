use axum::Router;

pub mod cart;
pub mod catalog;
pub mod inventory;
pub mod pricing;
pub mod system;

/// Router for all domain endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/cart", cart::router())
        .nest("/catalog", catalog::router())
        .nest("/inventory", inventory::router())
        .nest("/pricing", pricing::router())
}
