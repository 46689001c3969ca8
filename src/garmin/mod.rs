//! Garmin Connect data source
//!
//! The aggregation core only sees the [`DailySource`] trait; the HTTP client
//! lives behind it so tests can feed canned days.

mod client;
mod models;

pub use client::{GarminClient, RetryConfig};
pub use models::GarminActivity;

use chrono::NaiveDate;

use crate::activity::Activity;
use crate::day::{HeartRateSummary, SleepSummary};
use crate::error::DailyError;

/// Everything the day aggregation needs from the upstream source
pub trait DailySource {
    /// Exercise sessions recorded on the date
    fn activities(&self, date: NaiveDate) -> Result<Vec<Activity>, DailyError>;

    /// Total pedometer reading for the date, all intervals summed
    fn step_total(&self, date: NaiveDate) -> Result<i64, DailyError>;

    /// Heart rate extremes plus an average over the day's samples
    fn heart_rate(&self, date: NaiveDate) -> Result<HeartRateSummary, DailyError>;

    /// Sleep stage breakdown; `None` when Garmin has no data for the night
    fn sleep(&self, date: NaiveDate) -> Result<Option<SleepSummary>, DailyError>;

    fn vo2max(&self, date: NaiveDate) -> Result<Option<f64>, DailyError>;
}
