use analytics::PerformanceReport;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use core_types::{AccountMetrics, SnapshotRecord, VerifiedSnapshot, AGGREGATE_ACCOUNT_KEY};
use verifier::VerificationResult;

/// Rows of the equity curve shown under the summary.
const RECENT_DAYS: usize = 10;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn pct(value: f64) -> String {
    format!("{:+.2}%", value * 100.0)
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn optional(value: Option<f64>, format: fn(f64) -> String) -> String {
    value.map(format).unwrap_or_else(|| "-".to_string())
}

pub fn print_verification(snapshot: &VerifiedSnapshot, verification: &VerificationResult, attempts: u32) {
    let mut table = table(vec!["Field", "Value"]);
    let as_of = snapshot
        .as_of()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    let expected = snapshot
        .expected_hash()
        .map(ToString::to_string)
        .unwrap_or_else(|| "(not anchored)".to_string());

    table.add_row(vec!["Pointer", snapshot.content_pointer()]);
    table.add_row(vec!["Source", verification.source_url.as_deref().unwrap_or("-")]);
    table.add_row(vec!["As of", as_of.as_str()]);
    table.add_row(vec!["Verified", if verification.ok { "yes" } else { "NO" }]);
    table.add_row(vec!["Mode".to_string(), verification.mode.to_string()]);
    table.add_row(vec!["Expected digest", expected.as_str()]);
    table.add_row(vec!["Raw digest".to_string(), verification.raw_digest.to_string()]);
    table.add_row(vec!["Canonical digest".to_string(), verification.canonical_digest.to_string()]);
    table.add_row(vec!["Attempts".to_string(), attempts.to_string()]);

    println!("\nSnapshot Verification");
    println!("{table}");
}

fn account_row(name: &str, metrics: &AccountMetrics) -> Vec<String> {
    vec![
        name.to_string(),
        money(metrics.net_liquidation()),
        money(metrics.total_cash_value()),
        money(metrics.buying_power()),
        money(metrics.unrealized_pnl()),
        money(metrics.realized_pnl()),
    ]
}

pub fn print_record(record: &SnapshotRecord) {
    let mut accounts = table(vec!["Account", "Net Liq", "Cash", "Buying Power", "Unrealized", "Realized"]);
    accounts.add_row(account_row(AGGREGATE_ACCOUNT_KEY, record.accounts.aggregate()));
    for (id, metrics) in record.accounts.iter() {
        accounts.add_row(account_row(id, metrics));
    }

    println!("\nAccounts ({})", record.currency);
    println!("{accounts}");

    if record.positions.is_empty() {
        println!("\nNo open positions.");
        return;
    }

    let mut positions = table(vec!["Contract", "Type", "Qty", "Avg Price", "Last", "Change", "Unrealized"]);
    for position in &record.positions {
        positions.add_row(vec![
            position.label(),
            position.sec_type.clone(),
            position.position.to_string(),
            money(position.avg_price),
            optional(position.last_price, money),
            optional(position.pct_change, |v| format!("{:+.2}%", v)),
            optional(position.unrealized_pnl, money),
        ]);
    }

    println!("\nPositions");
    println!("{positions}");
}

pub fn print_report(report: &PerformanceReport, loaded: usize, unverified: usize) {
    let Some(stats) = &report.stats else {
        println!("\nNo equity observations; nothing to report.");
        return;
    };

    let mut summary = table(vec!["Metric", "Value"]);
    summary.add_row(vec!["Snapshots loaded".to_string(), loaded.to_string()]);
    summary.add_row(vec!["Unverified snapshots".to_string(), unverified.to_string()]);
    summary.add_row(vec!["Trading days".to_string(), report.series.len().to_string()]);
    summary.add_row(vec!["Return observations".to_string(), stats.observed_days.to_string()]);
    summary.add_row(vec!["Since inception".to_string(), pct(stats.since_inception)]);
    summary.add_row(vec!["Year to date".to_string(), optional(stats.ytd, pct)]);
    summary.add_row(vec!["Annualized return".to_string(), pct(stats.annualized_return)]);
    summary.add_row(vec!["Annualized volatility".to_string(), pct(stats.annualized_vol)]);
    summary.add_row(vec!["Sharpe (rf = 0)".to_string(), format!("{:.2}", stats.sharpe)]);
    summary.add_row(vec![
        "Max drawdown".to_string(),
        format!("{} on {}", pct(stats.max_drawdown), stats.max_drawdown_date),
    ]);

    println!("\nPerformance Summary");
    println!("{summary}");

    let mut curve = table(vec!["Date", "Equity", "Return", "Wealth Index", "Drawdown"]);
    let start = report.series.len().saturating_sub(RECENT_DAYS);
    for i in start..report.series.len() {
        curve.add_row(vec![
            report.series[i].date.to_string(),
            money(report.series[i].equity),
            pct(report.returns[i].value),
            format!("{:.2}", report.wealth_index[i].value),
            pct(report.drawdown[i].value),
        ]);
    }

    println!("\nRecent Trading Days");
    println!("{curve}");
}
