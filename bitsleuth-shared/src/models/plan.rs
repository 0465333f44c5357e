/// Purchasable plan tiers
///
/// A plan is the unit a user buys: a fixed USDT price in exchange for a
/// fixed calendar duration of premium access. The wire representation is
/// the lowercase tier name (`"1week"`, `"1month"`, `"3months"`), which is
/// also what invoices and payments store.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plan {
    /// 7 days of access
    #[serde(rename = "1week")]
    OneWeek,

    /// 30 days of access
    #[serde(rename = "1month")]
    OneMonth,

    /// 90 days of access
    #[serde(rename = "3months")]
    ThreeMonths,
}

impl Plan {
    /// All purchasable tiers
    pub const ALL: [Plan; 3] = [Plan::OneWeek, Plan::OneMonth, Plan::ThreeMonths];

    /// Wire/storage representation of the tier
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::OneWeek => "1week",
            Plan::OneMonth => "1month",
            Plan::ThreeMonths => "3months",
        }
    }

    /// Parses a tier name; `None` for unknown plans
    pub fn parse(s: &str) -> Option<Plan> {
        match s {
            "1week" => Some(Plan::OneWeek),
            "1month" => Some(Plan::OneMonth),
            "3months" => Some(Plan::ThreeMonths),
            _ => None,
        }
    }

    /// Price in USDT
    pub fn price_usdt(&self) -> f64 {
        match self {
            Plan::OneWeek => 10.0,
            Plan::OneMonth => 30.0,
            Plan::ThreeMonths => 75.0,
        }
    }

    /// Calendar duration granted on settlement
    pub fn grant_duration(&self) -> Duration {
        match self {
            Plan::OneWeek => Duration::days(7),
            Plan::OneMonth => Duration::days(30),
            Plan::ThreeMonths => Duration::days(90),
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for plan in Plan::ALL {
            assert_eq!(Plan::parse(plan.as_str()), Some(plan));
        }
    }

    #[test]
    fn test_unknown_plan_rejected() {
        assert_eq!(Plan::parse("1year"), None);
        assert_eq!(Plan::parse(""), None);
        assert_eq!(Plan::parse("1Week"), None);
    }

    #[test]
    fn test_prices() {
        assert_eq!(Plan::OneWeek.price_usdt(), 10.0);
        assert_eq!(Plan::OneMonth.price_usdt(), 30.0);
        assert_eq!(Plan::ThreeMonths.price_usdt(), 75.0);
    }

    #[test]
    fn test_durations() {
        assert_eq!(Plan::OneWeek.grant_duration(), Duration::days(7));
        assert_eq!(Plan::OneMonth.grant_duration(), Duration::days(30));
        assert_eq!(Plan::ThreeMonths.grant_duration(), Duration::days(90));
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Plan::ThreeMonths).unwrap();
        assert_eq!(json, "\"3months\"");
        let parsed: Plan = serde_json::from_str("\"1week\"").unwrap();
        assert_eq!(parsed, Plan::OneWeek);
    }
}
