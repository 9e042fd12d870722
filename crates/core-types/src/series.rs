use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Account equity on one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

impl EquityPoint {
    pub fn new(date: NaiveDate, equity: f64) -> Self {
        Self { date, equity }
    }
}

/// Simple daily return, `equity[i] / equity[i-1] - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Value of the compounding wealth index (VAMI).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WealthIndexPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Shortfall from the running peak, always `<= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub value: f64,
}
