use crate::report::{PerformanceReport, PerformanceStats};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use core_types::{DrawdownPoint, EquityPoint, ReturnPoint, WealthIndexPoint};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Starting value of the wealth index on the first observed day.
pub const WEALTH_INDEX_BASE: f64 = 1000.0;

/// Annualized volatility below this is treated as zero. Equal daily returns
/// still leave rounding noise in the variance.
const VOLATILITY_EPSILON: f64 = 1e-12;

/// A stateless calculator for deriving performance metrics from an equity curve.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    timezone: Tz,
}

impl AnalyticsEngine {
    /// `timezone` decides which calendar year is "current" for the YTD figure.
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// The main entry point for calculating performance metrics, as of today.
    pub fn compute(&self, series: &[EquityPoint]) -> PerformanceReport {
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        self.compute_as_of(series, today)
    }

    /// Calculates the report with `today` fixing the current calendar year.
    ///
    /// Points whose equity is not positive and finite are dropped; an empty
    /// curve yields an empty report. The input is sorted by date before use.
    pub fn compute_as_of(&self, series: &[EquityPoint], today: NaiveDate) -> PerformanceReport {
        let total = series.len();
        let mut series: Vec<EquityPoint> = series
            .iter()
            .copied()
            .filter(|p| p.equity.is_finite() && p.equity > 0.0)
            .collect();

        if series.len() < total {
            tracing::warn!(dropped = total - series.len(), total, "Ignoring equity points that are not positive");
        }
        if series.is_empty() {
            return PerformanceReport::new();
        }
        series.sort_by_key(|p| p.date);

        let returns = Self::daily_returns(&series);
        let wealth_index = Self::wealth_index(&returns);
        let (drawdown, max_drawdown, max_drawdown_date) = Self::drawdown(&wealth_index);
        let stats = Self::statistics(&series, &returns, max_drawdown, max_drawdown_date, today);

        tracing::debug!(
            days = series.len(),
            since_inception = stats.since_inception,
            max_drawdown,
            "Performance computed"
        );

        PerformanceReport {
            series,
            returns,
            wealth_index,
            drawdown,
            stats: Some(stats),
        }
    }

    /// Day-over-day returns; the first day has no prior observation and is 0.
    fn daily_returns(series: &[EquityPoint]) -> Vec<ReturnPoint> {
        let first = ReturnPoint {
            date: series[0].date,
            value: 0.0,
        };
        std::iter::once(first)
            .chain(series.windows(2).map(|w| ReturnPoint {
                date: w[1].date,
                value: w[1].equity / w[0].equity - 1.0,
            }))
            .collect()
    }

    fn wealth_index(returns: &[ReturnPoint]) -> Vec<WealthIndexPoint> {
        let mut index = Vec::with_capacity(returns.len());
        let mut value = WEALTH_INDEX_BASE;
        for (i, r) in returns.iter().enumerate() {
            if i > 0 {
                value *= 1.0 + r.value;
            }
            index.push(WealthIndexPoint { date: r.date, value });
        }
        index
    }

    /// Drawdown from the running peak (current point included), with the
    /// deepest value and its first date.
    fn drawdown(wealth_index: &[WealthIndexPoint]) -> (Vec<DrawdownPoint>, f64, NaiveDate) {
        let mut peak = f64::MIN;
        let mut deepest = 0.0;
        let mut deepest_date = wealth_index[0].date;

        let drawdown = wealth_index
            .iter()
            .map(|w| {
                peak = peak.max(w.value);
                let value = w.value / peak - 1.0;
                if value < deepest {
                    deepest = value;
                    deepest_date = w.date;
                }
                DrawdownPoint { date: w.date, value }
            })
            .collect();

        (drawdown, deepest, deepest_date)
    }

    fn statistics(
        series: &[EquityPoint],
        returns: &[ReturnPoint],
        max_drawdown: f64,
        max_drawdown_date: NaiveDate,
        today: NaiveDate,
    ) -> PerformanceStats {
        // The synthetic zero of the first day is not an observation.
        let daily: Vec<f64> = returns.iter().skip(1).map(|r| r.value).collect();
        let n = daily.len();

        let first = series[0].equity;
        let last = series[series.len() - 1].equity;
        let growth = last / first;

        let (mean, std_dev) = if n > 0 {
            let mean = daily.iter().sum::<f64>() / n as f64;
            let variance = daily.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n as f64;
            (mean, variance.sqrt())
        } else {
            (0.0, 0.0)
        };

        let annualized_vol = std_dev * TRADING_DAYS_PER_YEAR.sqrt();
        let annualized_return = if n > 0 {
            growth.powf(TRADING_DAYS_PER_YEAR / n as f64) - 1.0
        } else {
            0.0
        };
        let sharpe = if annualized_vol > VOLATILITY_EPSILON {
            (mean * TRADING_DAYS_PER_YEAR) / annualized_vol
        } else {
            0.0
        };

        PerformanceStats {
            since_inception: growth - 1.0,
            annualized_return,
            annualized_vol: if annualized_vol > VOLATILITY_EPSILON { annualized_vol } else { 0.0 },
            sharpe,
            mean_daily_return: mean,
            max_drawdown,
            max_drawdown_date,
            ytd: Self::year_to_date(series, today.year()),
            observed_days: n,
        }
    }

    /// Return since the last close before the first point of `year`.
    fn year_to_date(series: &[EquityPoint], year: i32) -> Option<f64> {
        let first_in_year = series.iter().position(|p| p.date.year() == year)?;
        let base = if first_in_year == 0 {
            series[0].equity
        } else {
            series[first_in_year - 1].equity
        };
        let last = series[series.len() - 1].equity;
        Some(last / base - 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn curve(points: &[(&str, f64)]) -> Vec<EquityPoint> {
        points.iter().map(|(d, e)| EquityPoint::new(day(d), *e)).collect()
    }

    fn engine() -> AnalyticsEngine {
        AnalyticsEngine::new(chrono_tz::America::New_York)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < EPS, "expected {expected}, got {actual}");
    }

    #[test]
    fn three_day_scenario() {
        let series = curve(&[("2024-01-01", 100000.0), ("2024-01-02", 110000.0), ("2024-01-03", 99000.0)]);
        let report = engine().compute_as_of(&series, day("2024-06-30"));

        let returns: Vec<f64> = report.returns.iter().map(|r| r.value).collect();
        let wealth: Vec<f64> = report.wealth_index.iter().map(|w| w.value).collect();
        let drawdown: Vec<f64> = report.drawdown.iter().map(|d| d.value).collect();

        for (a, e) in returns.iter().zip([0.0, 0.10, -0.10]) {
            assert_close(*a, e);
        }
        for (a, e) in wealth.iter().zip([1000.0, 1100.0, 990.0]) {
            assert_close(*a, e);
        }
        for (a, e) in drawdown.iter().zip([0.0, 0.0, -0.10]) {
            assert_close(*a, e);
        }

        let stats = report.stats.unwrap();
        assert_close(stats.max_drawdown, -0.10);
        assert_eq!(stats.max_drawdown_date, day("2024-01-03"));
        assert_close(stats.since_inception, -0.01);
        assert_eq!(stats.observed_days, 2);
        assert_close(stats.annualized_return, 0.99f64.powf(126.0) - 1.0);
        assert_close(stats.ytd.unwrap(), -0.01);
    }

    #[test]
    fn empty_series_yields_empty_report() {
        let report = engine().compute_as_of(&[], day("2024-06-30"));
        assert!(report.is_empty());
        assert!(report.returns.is_empty());
        assert!(report.wealth_index.is_empty());
        assert!(report.drawdown.is_empty());
        assert!(report.stats.is_none());
    }

    #[test]
    fn single_point_has_zeroed_statistics() {
        let report = engine()
            .compute_as_of(&curve(&[("2024-03-01", 5000.0)]), day("2024-06-30"));
        assert_eq!(report.wealth_index[0].value, WEALTH_INDEX_BASE);

        let stats = report.stats.unwrap();
        assert_eq!(stats.observed_days, 0);
        assert_eq!(stats.annualized_return, 0.0);
        assert_eq!(stats.annualized_vol, 0.0);
        assert_eq!(stats.sharpe, 0.0);
        assert_eq!(stats.since_inception, 0.0);
        assert_eq!(stats.max_drawdown, 0.0);
        assert_eq!(stats.ytd, Some(0.0));
    }

    #[test]
    fn wealth_index_compounds_daily_returns() {
        let series = curve(&[
            ("2024-01-02", 100.0),
            ("2024-01-03", 103.0),
            ("2024-01-04", 98.5),
            ("2024-01-05", 120.25),
            ("2024-01-08", 119.0),
        ]);
        let report = engine().compute_as_of(&series, day("2024-06-30"));

        assert_eq!(report.wealth_index[0].value, 1000.0);
        for i in 1..report.wealth_index.len() {
            let expected = report.wealth_index[i - 1].value * (1.0 + report.returns[i].value);
            assert_close(report.wealth_index[i].value, expected);
        }
        assert_close(report.wealth_index[4].value, 1190.0);
    }

    #[test]
    fn drawdown_is_never_positive_and_max_is_its_minimum() {
        let series = curve(&[
            ("2024-01-02", 100.0),
            ("2024-01-03", 90.0),
            ("2024-01-04", 120.0),
            ("2024-01-05", 96.0),
            ("2024-01-08", 125.0),
            ("2024-01-09", 100.0),
        ]);
        let report = engine().compute_as_of(&series, day("2024-06-30"));

        assert!(report.drawdown.iter().all(|d| d.value <= 0.0));
        let min = report.drawdown.iter().map(|d| d.value).fold(f64::INFINITY, f64::min);
        let stats = report.stats.unwrap();
        assert_eq!(stats.max_drawdown, min);
        assert_close(stats.max_drawdown, -0.2);
        // -0.2 is reached on the 5th and again on the 9th; the first wins.
        assert_eq!(stats.max_drawdown_date, day("2024-01-05"));
    }

    #[test]
    fn volatility_uses_population_standard_deviation() {
        let series = curve(&[
            ("2024-01-02", 100.0),
            ("2024-01-03", 110.0),
            ("2024-01-04", 99.0),
            ("2024-01-05", 108.9),
        ]);
        let stats = engine()
            .compute_as_of(&series, day("2024-06-30"))
            .stats
            .unwrap();

        let daily = [0.1, -0.1, 0.1];
        let mean = daily.iter().sum::<f64>() / 3.0;
        let population = (daily.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 3.0).sqrt();

        assert_close(stats.mean_daily_return, mean);
        assert_close(stats.annualized_vol, population * 252f64.sqrt());
        assert_close(stats.sharpe, mean * 252.0 / (population * 252f64.sqrt()));
    }

    #[test]
    fn constant_returns_have_zero_sharpe() {
        let series = curve(&[
            ("2024-01-02", 100.0),
            ("2024-01-03", 110.0),
            ("2024-01-04", 121.0),
            ("2024-01-05", 133.1),
        ]);
        let stats = engine()
            .compute_as_of(&series, day("2024-06-30"))
            .stats
            .unwrap();
        assert_eq!(stats.annualized_vol, 0.0);
        assert_eq!(stats.sharpe, 0.0);

        let flat = curve(&[("2024-01-02", 50.0), ("2024-01-03", 50.0), ("2024-01-04", 50.0)]);
        let stats = engine().compute_as_of(&flat, day("2024-06-30")).stats.unwrap();
        assert_eq!(stats.sharpe, 0.0);
        assert_eq!(stats.annualized_return, 0.0);
    }

    #[test]
    fn ytd_uses_the_last_close_of_the_prior_year() {
        let series = curve(&[
            ("2023-12-28", 100.0),
            ("2023-12-29", 110.0),
            ("2024-01-02", 115.0),
            ("2024-01-03", 121.0),
        ]);
        let stats = engine().compute_as_of(&series, day("2024-02-15")).stats.unwrap();
        assert_close(stats.ytd.unwrap(), 0.1);
    }

    #[test]
    fn ytd_starts_at_the_first_point_when_the_series_begins_this_year() {
        let series = curve(&[("2024-01-02", 200.0), ("2024-01-03", 150.0)]);
        let stats = engine().compute_as_of(&series, day("2024-02-15")).stats.unwrap();
        assert_close(stats.ytd.unwrap(), -0.25);
    }

    #[test]
    fn ytd_is_absent_without_points_this_year() {
        let series = curve(&[("2023-12-28", 100.0), ("2023-12-29", 110.0)]);
        let stats = engine().compute_as_of(&series, day("2024-02-15")).stats.unwrap();
        assert_eq!(stats.ytd, None);
    }

    #[test]
    fn unsorted_input_is_sorted_and_output_is_idempotent() {
        let shuffled = curve(&[("2024-01-03", 99000.0), ("2024-01-01", 100000.0), ("2024-01-02", 110000.0)]);
        let first = engine().compute_as_of(&shuffled, day("2024-06-30"));
        assert_eq!(first.series[0].date, day("2024-01-01"));
        assert_close(first.stats.as_ref().unwrap().since_inception, -0.01);

        let second = engine().compute_as_of(&first.series, day("2024-06-30"));
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_equity_points_are_dropped() {
        let series = curve(&[
            ("2024-01-02", 100.0),
            ("2024-01-03", 0.0),
            ("2024-01-04", 110.0),
            ("2024-01-05", -5.0),
            ("2024-01-08", f64::NAN),
        ]);
        let report = engine().compute_as_of(&series, day("2024-06-30"));

        let dates: Vec<NaiveDate> = report.series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day("2024-01-02"), day("2024-01-04")]);
        assert_close(report.returns[1].value, 0.1);
        assert_eq!(report.stats.unwrap().observed_days, 1);
    }

    #[test]
    fn all_invalid_equity_yields_empty_report() {
        let report = engine().compute_as_of(&curve(&[("2024-01-02", 0.0), ("2024-01-03", -1.0)]), day("2024-06-30"));
        assert!(report.is_empty());
        assert!(report.stats.is_none());
    }

    #[test]
    fn report_serializes_dates_as_calendar_days() {
        let report = engine()
            .compute_as_of(&curve(&[("2024-01-02", 100.0), ("2024-01-03", 101.0)]), day("2024-06-30"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["series"][1]["date"], "2024-01-03");
        assert_eq!(json["stats"]["observed_days"], 1);
    }
}
