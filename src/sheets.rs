//! Google Sheets destination
//!
//! Blocking wrapper over the Sheets REST API with service-account JWT auth.
//! The sheet is the only durable store: its first data row holds the most
//! recent date already written, which is the sole resumption checkpoint.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::columns::{CellValue, Column, ColumnsMapper};
use crate::error::DailyError;

const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Service account key file, the fields the token exchange needs
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct TokenClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<serde_json::Value>>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
}

/// Cell reads, split out so resume detection can be tested without a network
pub trait SheetCells {
    /// Formatted value of one cell, `None` when empty
    fn read_cell(&self, a1: &str) -> Result<Option<String>, DailyError>;
}

pub struct SheetsClient {
    http: Client,
    token: String,
    spreadsheet_id: String,
    sheet_id: i64,
    header: Vec<String>,
    /// Existing date -> steps content, loaded at most once per run and only
    /// when legacy backfill actually needs it
    legacy_steps: Option<HashMap<NaiveDate, i64>>,
}

impl SheetsClient {
    /// Authenticate and open the spreadsheet's first sheet.
    ///
    /// The service account key is read from the file named by
    /// `GOOGLE_APPLICATION_CREDENTIALS`.
    pub fn open(spreadsheet_id: &str) -> Result<Self, DailyError> {
        let key_path = std::env::var("GOOGLE_APPLICATION_CREDENTIALS").map_err(|_| {
            DailyError::Config(
                "GOOGLE_APPLICATION_CREDENTIALS is not set; \
                 point it at a Google service account key file"
                    .to_string(),
            )
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&std::fs::read_to_string(&key_path)?)?;

        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;
        let token = fetch_access_token(&http, &key)?;

        let mut client = Self {
            http,
            token,
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_id: 0,
            header: Vec::new(),
            legacy_steps: None,
        };
        client.sheet_id = client.first_sheet_id()?;
        client.header = client.fetch_header_row()?;
        Ok(client)
    }

    pub fn header_row(&self) -> &[String] {
        &self.header
    }

    fn first_sheet_id(&self) -> Result<i64, DailyError> {
        let url = format!(
            "{SHEETS_BASE}/{}?fields=sheets.properties.sheetId",
            self.spreadsheet_id
        );
        let meta: SpreadsheetMeta = self.get(&url)?;
        meta.sheets
            .first()
            .map(|sheet| sheet.properties.sheet_id)
            .ok_or_else(|| DailyError::Sheet("spreadsheet has no sheets".to_string()))
    }

    fn fetch_header_row(&self) -> Result<Vec<String>, DailyError> {
        let rows = self.read_range("1:1")?;
        let header = rows
            .into_iter()
            .next()
            .ok_or_else(|| DailyError::Sheet("spreadsheet header row is empty".to_string()))?;
        Ok(header.iter().map(cell_to_string).collect())
    }

    fn read_range(&self, range: &str) -> Result<Vec<Vec<serde_json::Value>>, DailyError> {
        let url = format!("{SHEETS_BASE}/{}/values/{range}", self.spreadsheet_id);
        let range: ValueRange = self.get(&url)?;
        Ok(range.values.unwrap_or_default())
    }

    fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, DailyError> {
        debug!("GET {url}");
        let response = self.http.get(url).bearer_auth(&self.token).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DailyError::Sheet(format!(
                "spreadsheet '{}' not found",
                self.spreadsheet_id
            )));
        }
        Ok(response.error_for_status()?.json()?)
    }

    /// Insert `count` empty rows so they start at 1-based row `start_row`
    pub fn insert_rows(&self, start_row: usize, count: usize) -> Result<(), DailyError> {
        let url = format!("{SHEETS_BASE}/{}:batchUpdate", self.spreadsheet_id);
        let body = serde_json::json!({
            "requests": [{
                "insertDimension": {
                    "range": {
                        "sheetId": self.sheet_id,
                        "dimension": "ROWS",
                        "startIndex": start_row - 1,
                        "endIndex": start_row - 1 + count,
                    },
                    "inheritFromBefore": false,
                }
            }]
        });
        debug!("POST {url}");
        self.http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()?
            .error_for_status()?;
        Ok(())
    }

    /// Write rows starting at 1-based `start_row`. `USER_ENTERED` keeps the
    /// deferred formulas live in the sheet.
    pub fn write_rows(&self, start_row: usize, rows: &[Vec<CellValue>]) -> Result<(), DailyError> {
        if rows.is_empty() {
            return Ok(());
        }
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let range = format!(
            "A{start_row}:{}{}",
            crate::columns::column_letter(width.saturating_sub(1)),
            start_row + rows.len() - 1
        );
        let url = format!(
            "{SHEETS_BASE}/{}/values/{range}?valueInputOption=USER_ENTERED",
            self.spreadsheet_id
        );
        let values: Vec<Vec<serde_json::Value>> = rows
            .iter()
            .map(|row| row.iter().map(CellValue::to_json).collect())
            .collect();
        let body = serde_json::json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        debug!("PUT {url}");
        self.http
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()?
            .error_for_status()?;
        Ok(())
    }

    /// Steps recorded in the sheet for the date, for days old enough that
    /// Garmin no longer returns them. Loads the whole date/steps columns on
    /// first use, then serves from memory.
    pub fn legacy_steps(
        &mut self,
        mapper: &ColumnsMapper,
        date: NaiveDate,
    ) -> Result<Option<i64>, DailyError> {
        if self.legacy_steps.is_none() {
            let date_col = mapper.a1(Column::Date)?;
            let steps_col = mapper.a1(Column::Steps)?;
            let dates = self.read_range(&format!("{date_col}2:{date_col}"))?;
            let steps = self.read_range(&format!("{steps_col}2:{steps_col}"))?;

            let mut cache = HashMap::new();
            for (date_row, steps_row) in dates.iter().zip(steps.iter()) {
                let parsed = date_row
                    .first()
                    .map(cell_to_string)
                    .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok());
                let steps = steps_row.first().and_then(cell_to_i64);
                if let (Some(date), Some(steps)) = (parsed, steps) {
                    cache.insert(date, steps);
                }
            }
            debug!("loaded {} legacy step entries from the sheet", cache.len());
            self.legacy_steps = Some(cache);
        }
        Ok(self
            .legacy_steps
            .as_ref()
            .and_then(|cache| cache.get(&date).copied()))
    }
}

impl SheetCells for SheetsClient {
    fn read_cell(&self, a1: &str) -> Result<Option<String>, DailyError> {
        let rows = self.read_range(a1)?;
        Ok(rows
            .first()
            .and_then(|row| row.first())
            .map(cell_to_string)
            .filter(|s| !s.is_empty()))
    }
}

fn cell_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell_to_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn fetch_access_token(http: &Client, key: &ServiceAccountKey) -> Result<String, DailyError> {
    let now = Local::now().timestamp();
    let claims = TokenClaims {
        iss: &key.client_email,
        scope: SHEETS_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + 3600,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| DailyError::Config(format!("invalid service account private key: {e}")))?;
    let assertion = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| DailyError::Sheet(format!("failed to sign auth token: {e}")))?;

    let response: TokenResponse = http
        .post(&key.token_uri)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ])
        .send()?
        .error_for_status()?
        .json()?;
    Ok(response.access_token)
}

/// Find where to resume: the first data row holds the most recent date
/// already written; fill from the next day up to yesterday.
pub fn detect_days_to_add<S: SheetCells>(
    sheet: &S,
    mapper: &ColumnsMapper,
) -> Result<(NaiveDate, i64), DailyError> {
    let date_ref = format!("{}2", mapper.a1(Column::Date)?);
    let raw = sheet.read_cell(&date_ref)?.ok_or_else(|| {
        DailyError::DateParse(format!("no date found in the first data row ({date_ref})"))
    })?;
    let last = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
        DailyError::DateParse(format!("cannot parse date '{raw}' in cell {date_ref}"))
    })?;
    let today = Local::now().date_naive();
    let start = last + chrono::Duration::days(1);
    let days = (today - last).num_days() - 1;
    Ok((start, days.max(0)))
}
