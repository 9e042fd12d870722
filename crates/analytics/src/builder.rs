use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use core_types::{EquityPoint, VerifiedSnapshot};
use std::collections::BTreeMap;

/// Maps snapshots onto a daily equity curve.
///
/// The trading day of a snapshot is the calendar day of its as-of instant in
/// the reporting time zone. A snapshot taken after the close reports on that
/// session, which in UTC often already falls on the next calendar day.
#[derive(Debug, Clone)]
pub struct EquitySeriesBuilder {
    timezone: Tz,
    verified_only: bool,
}

impl EquitySeriesBuilder {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            verified_only: false,
        }
    }

    /// Ignore snapshots whose verification failed.
    pub fn verified_only(mut self, verified_only: bool) -> Self {
        self.verified_only = verified_only;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn trading_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// The equity point a snapshot contributes, if any.
    ///
    /// Snapshots without a usable as-of instant or with non-positive equity
    /// contribute nothing.
    pub fn point(&self, snapshot: &VerifiedSnapshot) -> Option<EquityPoint> {
        if self.verified_only && !snapshot.is_verified() {
            return None;
        }
        let date = self.trading_day(snapshot.as_of()?);
        let equity = snapshot.record().equity();
        (equity > 0.0).then(|| EquityPoint::new(date, equity))
    }

    /// Builds the curve: one point per trading day, ascending.
    ///
    /// When several snapshots share a day the one later in `snapshots` wins,
    /// regardless of its timestamp or value.
    pub fn build(&self, snapshots: &[VerifiedSnapshot]) -> Vec<EquityPoint> {
        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut dropped = 0usize;

        for snapshot in snapshots {
            match self.point(snapshot) {
                Some(point) => {
                    by_day.insert(point.date, point.equity);
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!(dropped, total = snapshots.len(), "Snapshots without a usable equity point");
        }

        by_day
            .into_iter()
            .map(|(date, equity)| EquityPoint::new(date, equity))
            .collect()
    }
}
