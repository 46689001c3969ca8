//! garmin-daily - aggregate Garmin Connect data into a Google Sheet
//!
//! One day of raw Garmin activity (steps, heart rate, sleep, VO2max,
//! exercise sessions) becomes one normalized [`DaySummary`], which is then
//! projected onto spreadsheet rows.
//!
//! The aggregation core ([`sport`], [`activity`], [`day`]) is pure and
//! in-memory. Projection ([`rows`], [`columns`], [`mappers`]) turns a day
//! into sink-ready rows with deferred spreadsheet formulas. The collaborator
//! modules ([`garmin`], [`sheets`], [`pacer`], [`sync`]) cover the upstream
//! API, the destination sheet and the batch loop between them.

pub mod activity;
pub mod columns;
pub mod day;
pub mod error;
pub mod garmin;
pub mod mappers;
pub mod pacer;
pub mod rows;
pub mod sheets;
pub mod sport;
pub mod sync;

pub use activity::Activity;
pub use day::{DaySummary, HeartRateSummary, SleepSummary};
pub use error::DailyError;
pub use garmin::{DailySource, GarminClient};
pub use rows::{GymPlan, RowProjector};
pub use sheets::SheetsClient;
pub use sport::classify;

/// Crate version reported by `--version`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
