use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The reserved account key under which the upstream producer publishes the
/// aggregate across all accounts.
pub const AGGREGATE_ACCOUNT_KEY: &str = "All";

const DEFAULT_CURRENCY: &str = "USD";

/// Coerces a JSON scalar into a finite `f64`.
///
/// Numbers are taken as-is, strings are parsed after trimming. Everything else,
/// including NaN and infinities, yields `None`.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_f64(&value).unwrap_or(0.0))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_f64(&value))
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// The metrics published for one account, keyed by metric name
/// (`NetLiquidation`, `TotalCashValue`, ...).
///
/// Each entry is usually `{ "value": ..., "currency": ... }` but bare scalars
/// are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountMetrics(BTreeMap<String, Value>);

impl AccountMetrics {
    /// Returns the named metric coerced to a number, or 0 when absent or
    /// non-numeric.
    pub fn metric(&self, name: &str) -> f64 {
        self.0
            .get(name)
            .and_then(|entry| match entry {
                Value::Object(fields) => fields.get("value").and_then(coerce_f64),
                other => coerce_f64(other),
            })
            .unwrap_or(0.0)
    }

    pub fn net_liquidation(&self) -> f64 {
        self.metric("NetLiquidation")
    }

    pub fn unrealized_pnl(&self) -> f64 {
        self.metric("UnrealizedPnL")
    }

    pub fn realized_pnl(&self) -> f64 {
        self.metric("RealizedPnL")
    }

    pub fn total_cash_value(&self) -> f64 {
        self.metric("TotalCashValue")
    }

    pub fn buying_power(&self) -> f64 {
        self.metric("BuyingPower")
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Accounts of a snapshot, with the aggregate held apart from the
/// per-account entries.
///
/// The aggregate is always present; when the producer omitted it the metrics
/// are simply empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountMap {
    aggregate: AccountMetrics,
    accounts: BTreeMap<String, AccountMetrics>,
}

impl AccountMap {
    pub fn new(aggregate: AccountMetrics, accounts: BTreeMap<String, AccountMetrics>) -> Self {
        Self { aggregate, accounts }
    }

    pub fn aggregate(&self) -> &AccountMetrics {
        &self.aggregate
    }

    /// The first individual account in key order. The producer's insertion
    /// order is not kept.
    pub fn primary(&self) -> Option<(&str, &AccountMetrics)> {
        self.accounts.iter().next().map(|(id, metrics)| (id.as_str(), metrics))
    }

    pub fn get(&self, account_id: &str) -> Option<&AccountMetrics> {
        self.accounts.get(account_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AccountMetrics)> {
        self.accounts.iter().map(|(id, metrics)| (id.as_str(), metrics))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl<'de> Deserialize<'de> for AccountMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut accounts = BTreeMap::<String, AccountMetrics>::deserialize(deserializer)?;
        let aggregate = accounts.remove(AGGREGATE_ACCOUNT_KEY).unwrap_or_default();
        Ok(Self { aggregate, accounts })
    }
}

/// One open position as reported by the upstream producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub symbol: String,
    #[serde(rename = "secType", default)]
    pub sec_type: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub position: f64,
    #[serde(rename = "avgPrice", default, deserialize_with = "lenient_f64")]
    pub avg_price: f64,
    #[serde(rename = "lastPrice", default, deserialize_with = "lenient_opt_f64")]
    pub last_price: Option<f64>,
    #[serde(rename = "pctChange", default, deserialize_with = "lenient_opt_f64")]
    pub pct_change: Option<f64>,
    #[serde(rename = "unrealizedPnL", default, deserialize_with = "lenient_opt_f64")]
    pub unrealized_pnl: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub expiry: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub strike: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub right: Option<String>,
}

impl Position {
    /// True for option contracts, which carry strike and right.
    pub fn is_option(&self) -> bool {
        self.strike.is_some() && self.right.is_some()
    }

    /// Human-readable contract label, e.g. `SPY 20240621 450C`.
    pub fn label(&self) -> String {
        match (&self.expiry, self.strike, &self.right) {
            (Some(expiry), Some(strike), Some(right)) => {
                format!("{} {} {}{}", self.symbol, expiry, strike, right)
            }
            _ => self.symbol.clone(),
        }
    }
}

/// Typed, lenient view of a snapshot record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotRecord {
    pub as_of_utc: Option<String>,
    pub currency: String,
    pub accounts: AccountMap,
    pub positions: Vec<Position>,
}

impl SnapshotRecord {
    /// Builds the typed record from a parsed snapshot document.
    ///
    /// The body is read from `payload` when present, otherwise from the top
    /// level. Malformed sections degrade to empty values and malformed
    /// positions are skipped.
    pub fn from_value(value: &Value) -> Self {
        let body = value.get("payload").filter(|p| p.is_object()).unwrap_or(value);

        let accounts = body
            .get("accounts")
            .and_then(|a| AccountMap::deserialize(a).ok())
            .unwrap_or_default();

        let positions = body
            .get("positions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| Position::deserialize(item).ok())
                    .collect()
            })
            .unwrap_or_default();

        let currency = [value, body]
            .iter()
            .find_map(|section| {
                section
                    .get("account_base_ccy")
                    .and_then(Value::as_str)
                    .or_else(|| section.pointer("/meta/currency").and_then(Value::as_str))
            })
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string();

        Self {
            as_of_utc: value.get("as_of_utc").and_then(Value::as_str).map(str::to_string),
            currency,
            accounts,
            positions,
        }
    }

    /// Net liquidation of the primary individual account, 0 if unavailable.
    ///
    /// "Primary" is the first non-`All` account id in sorted (`BTreeMap`)
    /// order, so with several accounts the lexicographically smallest id wins
    /// regardless of where it appears in the document.
    pub fn equity(&self) -> f64 {
        self.accounts
            .primary()
            .map(|(_, metrics)| metrics.net_liquidation())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "sha256": "00",
            "as_of_utc": "2024-02-01T21:05:00Z",
            "account_base_ccy": "EUR",
            "payload": {
                "accounts": {
                    "All": { "NetLiquidation": { "value": "250000" }, "UnrealizedPnL": { "value": -120.5 } },
                    "U1234567": {
                        "NetLiquidation": { "value": "125000.50", "currency": "EUR" },
                        "TotalCashValue": { "value": 5000 },
                        "BuyingPower": { "value": "n/a" }
                    }
                },
                "positions": [
                    { "symbol": "SPY", "secType": "OPT", "position": "2", "avgPrice": 3.1,
                      "lastPrice": null, "expiry": "20240621", "strike": 450, "right": "C" },
                    { "symbol": "AAPL", "secType": "STK", "position": 10, "avgPrice": "180.25" },
                    "not a position"
                ]
            }
        })
    }

    #[test]
    fn aggregate_is_separated_from_accounts() {
        let record = SnapshotRecord::from_value(&sample());
        assert_eq!(record.accounts.len(), 1);
        assert_eq!(record.accounts.aggregate().net_liquidation(), 250000.0);
        assert_eq!(record.accounts.aggregate().unrealized_pnl(), -120.5);

        let (id, metrics) = record.accounts.primary().unwrap();
        assert_eq!(id, "U1234567");
        assert_eq!(metrics.net_liquidation(), 125000.5);
        assert_eq!(metrics.total_cash_value(), 5000.0);
        assert_eq!(metrics.buying_power(), 0.0);
        assert_eq!(record.equity(), 125000.5);
    }

    #[test]
    fn positions_are_parsed_leniently() {
        let record = SnapshotRecord::from_value(&sample());
        assert_eq!(record.positions.len(), 2);

        let option = &record.positions[0];
        assert!(option.is_option());
        assert_eq!(option.position, 2.0);
        assert_eq!(option.last_price, None);
        assert_eq!(option.label(), "SPY 20240621 450C");

        let stock = &record.positions[1];
        assert!(!stock.is_option());
        assert_eq!(stock.avg_price, 180.25);
        assert_eq!(stock.label(), "AAPL");
    }

    #[test]
    fn currency_falls_back_to_meta_then_usd() {
        assert_eq!(SnapshotRecord::from_value(&sample()).currency, "EUR");

        let meta = json!({ "meta": { "currency": "CHF" }, "payload": { "accounts": {} } });
        assert_eq!(SnapshotRecord::from_value(&meta).currency, "CHF");

        assert_eq!(SnapshotRecord::from_value(&json!({})).currency, "USD");
    }

    #[test]
    fn missing_aggregate_and_accounts_yield_zero_equity() {
        let only_aggregate = json!({ "payload": { "accounts": { "All": { "NetLiquidation": { "value": 10 } } } } });
        let record = SnapshotRecord::from_value(&only_aggregate);
        assert!(record.accounts.is_empty());
        assert_eq!(record.equity(), 0.0);

        let no_aggregate = json!({ "accounts": { "DU1": { "NetLiquidation": 42 } } });
        let record = SnapshotRecord::from_value(&no_aggregate);
        assert!(record.accounts.aggregate().is_empty());
        assert_eq!(record.equity(), 42.0);
    }

    #[test]
    fn primary_account_is_smallest_id_not_first_listed() {
        let doc: Value = serde_json::from_str(
            r#"{ "accounts": {
                "U2": { "NetLiquidation": 200 },
                "All": { "NetLiquidation": 300 },
                "U1": { "NetLiquidation": 100 }
            } }"#,
        )
        .unwrap();
        let record = SnapshotRecord::from_value(&doc);

        assert_eq!(record.accounts.len(), 2);
        assert_eq!(record.accounts.primary().map(|(id, _)| id), Some("U1"));
        assert_eq!(record.equity(), 100.0);
    }

    #[test]
    fn coercion_rejects_non_numeric_values() {
        assert_eq!(coerce_f64(&json!("  12.5 ")), Some(12.5));
        assert_eq!(coerce_f64(&json!("abc")), None);
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&Value::Null), None);
    }
}
