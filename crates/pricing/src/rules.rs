use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use stockhold_core::{DomainError, DomainResult, RuleId};

/// Discount condition and size, tagged on the wire by rule type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    Bulk {
        min_quantity: u32,
        discount_percent: Decimal,
    },
    UserTier {
        tier: String,
        discount_percent: Decimal,
    },
    Seasonal {
        #[serde(deserialize_with = "datetime_utc_or_naive")]
        starts_at: DateTime<Utc>,
        #[serde(deserialize_with = "datetime_utc_or_naive")]
        ends_at: DateTime<Utc>,
        discount_percent: Decimal,
    },
}

/// Seasonal bounds accept RFC 3339 timestamps as-is; offset-less
/// timestamps are read as UTC so window and clock share a reference.
fn datetime_utc_or_naive<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|_| serde::de::Error::custom(format!("invalid datetime: {raw}")))
}

impl RuleKind {
    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::Bulk { .. } => "BULK",
            RuleKind::UserTier { .. } => "USER_TIER",
            RuleKind::Seasonal { .. } => "SEASONAL",
        }
    }

    pub fn discount_percent(&self) -> Decimal {
        match self {
            RuleKind::Bulk {
                discount_percent, ..
            }
            | RuleKind::UserTier {
                discount_percent, ..
            }
            | RuleKind::Seasonal {
                discount_percent, ..
            } => *discount_percent,
        }
    }

    /// Whether the rule's condition holds for this purchase. Seasonal
    /// windows include both endpoints; tier comparison is exact.
    pub fn applies(&self, quantity: u32, user_tier: Option<&str>, now: DateTime<Utc>) -> bool {
        match self {
            RuleKind::Bulk { min_quantity, .. } => quantity >= *min_quantity,
            RuleKind::UserTier { tier, .. } => user_tier == Some(tier.as_str()),
            RuleKind::Seasonal {
                starts_at, ends_at, ..
            } => *starts_at <= now && now <= *ends_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingRule {
    pub id: RuleId,
    pub priority: i32,
    pub active: bool,
    pub kind: RuleKind,
}

impl PricingRule {
    pub fn new(priority: i32, active: bool, kind: RuleKind) -> DomainResult<Self> {
        if kind.discount_percent() < Decimal::ZERO {
            return Err(DomainError::validation("discount percent cannot be negative"));
        }
        if let RuleKind::Seasonal {
            starts_at, ends_at, ..
        } = &kind
        {
            if ends_at < starts_at {
                return Err(DomainError::validation(
                    "seasonal window cannot end before it starts",
                ));
            }
        }
        Ok(Self {
            id: RuleId::new(),
            priority,
            active,
            kind,
        })
    }
}

/// Rules in insertion order. `fetch_active` is what the engine consumes:
/// active rules sorted by ascending priority, ties keeping insertion order.
#[derive(Debug, Default)]
pub struct RuleStore {
    inner: RwLock<Vec<PricingRule>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, rule: PricingRule) -> PricingRule {
        self.inner.write().push(rule.clone());
        rule
    }

    pub fn list(&self) -> Vec<PricingRule> {
        self.inner.read().clone()
    }

    pub fn fetch_active(&self) -> Vec<PricingRule> {
        let mut active: Vec<PricingRule> = self
            .inner
            .read()
            .iter()
            .filter(|rule| rule.active)
            .cloned()
            .collect();
        active.sort_by_key(|rule| rule.priority);
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn bulk(min_quantity: u32, discount_percent: Decimal) -> RuleKind {
        RuleKind::Bulk {
            min_quantity,
            discount_percent,
        }
    }

    #[test]
    fn negative_discount_is_rejected() {
        let err = PricingRule::new(1, true, bulk(10, dec!(-5))).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn seasonal_window_must_be_ordered() {
        let now = Utc::now();
        let err = PricingRule::new(
            1,
            true,
            RuleKind::Seasonal {
                starts_at: now,
                ends_at: now - chrono::Duration::days(1),
                discount_percent: dec!(10),
            },
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn seasonal_window_includes_both_endpoints() {
        let starts_at = Utc::now();
        let ends_at = starts_at + chrono::Duration::days(7);
        let kind = RuleKind::Seasonal {
            starts_at,
            ends_at,
            discount_percent: dec!(10),
        };

        assert!(kind.applies(1, None, starts_at));
        assert!(kind.applies(1, None, ends_at));
        assert!(!kind.applies(1, None, starts_at - chrono::Duration::seconds(1)));
        assert!(!kind.applies(1, None, ends_at + chrono::Duration::seconds(1)));
    }

    #[test]
    fn tier_comparison_is_exact() {
        let kind = RuleKind::UserTier {
            tier: "gold".to_string(),
            discount_percent: dec!(10),
        };

        assert!(kind.applies(1, Some("gold"), Utc::now()));
        assert!(!kind.applies(1, Some("GOLD"), Utc::now()));
        assert!(!kind.applies(1, None, Utc::now()));
    }

    #[test]
    fn rule_kind_wire_format_is_type_tagged() {
        let kind = bulk(10, dec!(12.5));

        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "BULK");
        assert_eq!(json["min_quantity"], 10);

        let parsed: RuleKind = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, kind);
        assert_eq!(parsed.label(), "BULK");
    }

    #[test]
    fn seasonal_bounds_without_offset_are_read_as_utc() {
        let kind: RuleKind = serde_json::from_value(serde_json::json!({
            "type": "SEASONAL",
            "starts_at": "2026-06-01T00:00:00",
            "ends_at": "2026-08-31T23:59:59",
            "discount_percent": "20",
        }))
        .unwrap();

        match kind {
            RuleKind::Seasonal {
                starts_at, ends_at, ..
            } => {
                assert_eq!(starts_at, Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap());
                assert_eq!(ends_at, Utc.with_ymd_and_hms(2026, 8, 31, 23, 59, 59).unwrap());
            }
            other => panic!("Expected Seasonal, got {other:?}"),
        }
    }

    #[test]
    fn seasonal_bounds_with_offsets_convert_to_utc() {
        let kind: RuleKind = serde_json::from_value(serde_json::json!({
            "type": "SEASONAL",
            "starts_at": "2026-06-01T05:00:00+05:00",
            "ends_at": "2026-08-31T23:59:59Z",
            "discount_percent": "20",
        }))
        .unwrap();

        match kind {
            RuleKind::Seasonal { starts_at, .. } => {
                assert_eq!(starts_at, Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap());
            }
            other => panic!("Expected Seasonal, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_seasonal_bounds_are_rejected() {
        let err = serde_json::from_value::<RuleKind>(serde_json::json!({
            "type": "SEASONAL",
            "starts_at": "June 1st",
            "ends_at": "2026-08-31T23:59:59",
            "discount_percent": "20",
        }))
        .unwrap_err();

        assert!(err.to_string().contains("invalid datetime"));
    }

    #[test]
    fn fetch_active_sorts_by_priority_and_keeps_ties_stable() {
        let store = RuleStore::new();
        let low = store.add(PricingRule::new(5, true, bulk(10, dec!(1))).unwrap());
        let first_tie = store.add(PricingRule::new(1, true, bulk(20, dec!(2))).unwrap());
        let inactive = store.add(PricingRule::new(0, false, bulk(30, dec!(3))).unwrap());
        let second_tie = store.add(PricingRule::new(1, true, bulk(40, dec!(4))).unwrap());

        let active: Vec<RuleId> = store.fetch_active().iter().map(|rule| rule.id).collect();

        assert_eq!(active, vec![first_tie.id, second_tie.id, low.id]);
        assert!(!active.contains(&inactive.id));
        assert_eq!(store.list().len(), 4);
    }
}
