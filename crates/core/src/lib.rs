//! Domain foundation for the stockhold services: typed identifiers, the
//! error taxonomy shared by every crate, and money arithmetic. Nothing in
//! here touches infrastructure.

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{CartId, CategoryId, OwnerId, ProductId, ReservationId, RuleId, VariantId};
pub use money::{percent_of, round_money};
