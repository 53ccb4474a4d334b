//! Pricing domain module: discount rules and the quote engine.
//!
//! Rules are data; [`calculate`] is a pure function over them. Callers pass
//! the rule set in (usually [`RuleStore::fetch_active`]) together with the
//! purchase context and get a deterministic quote back.

pub mod engine;
pub mod rules;

pub use engine::{calculate, AppliedRule, Quote};
pub use rules::{PricingRule, RuleKind, RuleStore};
