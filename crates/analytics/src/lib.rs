//! # Navproof Analytics Engine
//!
//! This crate turns a batch of verified snapshots into performance analytics.
//! It acts as the "unbiased judge" of the account's history.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** This crate has no knowledge of the network or the registry.
//!   It depends only on `core-types`.
//! - **Stateless Calculation:** Both the `EquitySeriesBuilder` and the
//!   `AnalyticsEngine` are stateless calculators configured only with the
//!   reporting time zone. This makes them highly reliable and easy to test.
//!
//! ## Public API
//!
//! - `EquitySeriesBuilder`: snapshots to a deduplicated daily equity curve.
//! - `AnalyticsEngine`: equity curve to returns, wealth index, drawdown and statistics.
//! - `PerformanceReport` / `PerformanceStats`: the standardized outputs.

// Declare the modules that constitute this crate.
pub mod builder;
pub mod engine;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use builder::EquitySeriesBuilder;
pub use engine::{AnalyticsEngine, TRADING_DAYS_PER_YEAR, WEALTH_INDEX_BASE};
pub use report::{PerformanceReport, PerformanceStats};
