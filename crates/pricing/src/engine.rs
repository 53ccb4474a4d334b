use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use stockhold_core::{percent_of, round_money};
use tracing::debug;

use crate::rules::PricingRule;

/// One matched rule and the money it took off, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedRule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "discount_amount")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub final_price: Decimal,
    pub breakdown: Vec<AppliedRule>,
}

/// Prices `quantity` units at `base_price` each under the given rules.
///
/// Active rules run in ascending priority order and compound sequentially:
/// each percentage is taken off the running price left by the rules before
/// it, not off the base. A discount never takes the running price below
/// zero. Rounding happens once at the end (and per breakdown entry for
/// display); the running price keeps full precision between rules. A zero
/// quantity is not an error: the quote is 0.00, with matching percent rules
/// contributing 0.00 entries.
pub fn calculate(
    base_price: Decimal,
    quantity: u32,
    user_tier: Option<&str>,
    rules: &[PricingRule],
    now: DateTime<Utc>,
) -> Quote {
    let mut ordered: Vec<&PricingRule> = rules.iter().filter(|rule| rule.active).collect();
    ordered.sort_by_key(|rule| rule.priority);

    let mut price = base_price * Decimal::from(quantity);
    let mut breakdown = Vec::new();
    for rule in ordered {
        if !rule.kind.applies(quantity, user_tier, now) {
            continue;
        }
        let discount = percent_of(price, rule.kind.discount_percent());
        let effective = discount.min(price);
        price -= effective;
        debug!(
            rule_id = %rule.id,
            kind = rule.kind.label(),
            %effective,
            running = %price,
            "pricing rule applied"
        );
        breakdown.push(AppliedRule {
            kind: rule.kind.label().to_string(),
            amount: round_money(effective),
        });
    }

    Quote {
        final_price: round_money(price),
        breakdown,
    }
}
