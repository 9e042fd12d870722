use chrono::NaiveDate;
use core_types::{DrawdownPoint, EquityPoint, ReturnPoint, WealthIndexPoint};
use serde::Serialize;

/// Scalar summary of an equity curve.
///
/// All return figures are fractions (`-0.1` is a 10% loss).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub since_inception: f64,
    pub annualized_return: f64,
    /// Population standard deviation of daily returns, annualized.
    pub annualized_vol: f64,
    pub sharpe: f64, // risk-free rate of 0
    pub mean_daily_return: f64,
    pub max_drawdown: f64,
    pub max_drawdown_date: NaiveDate,
    /// `None` when no point falls in the current calendar year.
    pub ytd: Option<f64>,
    /// Number of daily returns the statistics are computed from.
    pub observed_days: usize,
}

/// The output of the `AnalyticsEngine`: the parallel, date-aligned series and
/// their summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub series: Vec<EquityPoint>,
    pub returns: Vec<ReturnPoint>,
    pub wealth_index: Vec<WealthIndexPoint>,
    pub drawdown: Vec<DrawdownPoint>,
    /// `None` for an empty equity curve.
    pub stats: Option<PerformanceStats>,
}

impl PerformanceReport {
    /// Creates an empty report, the result for an empty equity curve.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
