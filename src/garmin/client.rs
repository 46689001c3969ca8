//! Garmin Connect HTTP client
//!
//! Thin blocking wrapper over the Connect REST endpoints. Handles login from
//! environment credentials and bounded exponential-backoff retries for the
//! rate-limit statuses Garmin is known to throw (403/429). Auth failures are
//! fatal and never retried.

use std::env;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::models::{GarminActivity, HeartRates, SleepData, StepsInterval, TrainingStatus};
use super::DailySource;
use crate::activity::Activity;
use crate::day::{HeartRateSummary, SleepSummary};
use crate::error::DailyError;

const CONNECT_BASE: &str = "https://connect.garmin.com/modern/proxy";
const SSO_SIGNIN: &str = "https://sso.garmin.com/sso/signin";

/// Bounded exponential backoff applied to retryable Garmin statuses
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub retryable: Vec<StatusCode>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(3),
            retryable: vec![StatusCode::FORBIDDEN, StatusCode::TOO_MANY_REQUESTS],
        }
    }
}

pub struct GarminClient {
    http: Client,
    retry: RetryConfig,
    session_token: Option<String>,
}

impl GarminClient {
    /// Build a client; credentials are read at [`GarminClient::login`] time
    pub fn new(retry: RetryConfig) -> Result<Self, DailyError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            retry,
            session_token: None,
        })
    }

    /// Sign in with `GARMIN_EMAIL` / `GARMIN_PASSWORD`.
    ///
    /// Any sign-in failure is terminal: retrying a bad password only gets
    /// the account locked.
    pub fn login(&mut self) -> Result<(), DailyError> {
        let email = env::var("GARMIN_EMAIL")
            .map_err(|_| DailyError::Auth("GARMIN_EMAIL is not set".to_string()))?;
        let password = env::var("GARMIN_PASSWORD")
            .map_err(|_| DailyError::Auth("GARMIN_PASSWORD is not set".to_string()))?;

        debug!("logging in to Garmin Connect as {email}");
        let response = self
            .http
            .post(SSO_SIGNIN)
            .form(&[("username", email.as_str()), ("password", password.as_str())])
            .send()?;

        if !response.status().is_success() {
            return Err(DailyError::Auth(format!(
                "sign-in rejected with status {}",
                response.status()
            )));
        }
        let body: serde_json::Value = response.json()?;
        let token = body
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| DailyError::Auth("sign-in response carried no token".to_string()))?;
        self.session_token = Some(token.to_string());
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DailyError> {
        let token = self
            .session_token
            .as_deref()
            .ok_or_else(|| DailyError::Auth("not logged in".to_string()))?;
        let url = format!("{CONNECT_BASE}{path}");

        let mut attempt = 0;
        loop {
            debug!("GET {url}");
            let response = self
                .http
                .get(&url)
                .bearer_auth(token)
                .send()?;
            let status = response.status();

            if self.retry.retryable.contains(&status) {
                attempt += 1;
                if attempt >= self.retry.max_retries {
                    warn!("Garmin rate limit ({status}): max retries reached");
                    return Err(DailyError::RetriesExhausted {
                        service: "Garmin Connect".to_string(),
                        attempts: attempt,
                    });
                }
                let backoff = self.retry.initial_backoff * 2_u32.pow(attempt - 1);
                warn!(
                    "Garmin rate limit ({status}): retry {attempt}/{} after {backoff:?}",
                    self.retry.max_retries
                );
                std::thread::sleep(backoff);
                continue;
            }

            if status == StatusCode::UNAUTHORIZED {
                return Err(DailyError::Auth("session expired".to_string()));
            }
            let response = response.error_for_status()?;
            return Ok(response.json()?);
        }
    }
}

impl DailySource for GarminClient {
    fn activities(&self, date: NaiveDate) -> Result<Vec<Activity>, DailyError> {
        let day = date.format("%Y-%m-%d");
        let raw: Vec<GarminActivity> = self.get_json(&format!(
            "/activitylist-service/activities/search/activities?startDate={day}&endDate={day}"
        ))?;
        Ok(raw.into_iter().map(Activity::from).collect())
    }

    fn step_total(&self, date: NaiveDate) -> Result<i64, DailyError> {
        let day = date.format("%Y-%m-%d");
        let intervals: Vec<StepsInterval> = self.get_json(&format!(
            "/wellness-service/wellness/dailySummaryChart?date={day}"
        ))?;
        Ok(intervals.iter().filter_map(|i| i.steps).sum())
    }

    fn heart_rate(&self, date: NaiveDate) -> Result<HeartRateSummary, DailyError> {
        let day = date.format("%Y-%m-%d");
        let rates: HeartRates = self.get_json(&format!(
            "/wellness-service/wellness/dailyHeartRate?date={day}"
        ))?;
        Ok(rates.summarize())
    }

    fn sleep(&self, date: NaiveDate) -> Result<Option<SleepSummary>, DailyError> {
        let day = date.format("%Y-%m-%d");
        let sleep: SleepData = self.get_json(&format!(
            "/wellness-service/wellness/dailySleepData?date={day}"
        ))?;
        Ok(sleep.summarize())
    }

    fn vo2max(&self, date: NaiveDate) -> Result<Option<f64>, DailyError> {
        let day = date.format("%Y-%m-%d");
        let status: TrainingStatus = self.get_json(&format!(
            "/metrics-service/metrics/trainingstatus/aggregated/{day}"
        ))?;
        Ok(status.vo2max())
    }
}
