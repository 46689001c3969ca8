//! Spreadsheet columns and cell values
//!
//! The column set is closed: a Rust enum with an explicit header-name table,
//! so a renamed or missing sheet column fails loudly instead of silently
//! landing values in the wrong place. Column order in the sheet is not fixed,
//! the mapper reads it from the header row.

use std::collections::HashMap;

use crate::error::DailyError;

/// Columns of the fitness spreadsheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Activity date
    Date,
    /// Distance in km, if it makes sense for the activity
    Distance,
    /// Steps, only filled for the Walking row
    Steps,
    /// Location as in Garmin or rewritten by a pattern
    Location,
    /// Canonical sport name
    Sport,
    /// Duration in whole minutes
    Duration,
    /// HR and speed details / HR and sleep details for Walking
    Comment,
    /// Week number counted from a fixed epoch Monday
    Week,
    /// Duration in hours
    Hours,
    /// 1 = Monday .. 7 = Sunday
    Weekday,
    /// Resting heart rate
    HrRest,
    /// Sleep duration in hours
    SleepTime,
    /// VO2 max
    Vo2Max,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::Date,
        Column::Distance,
        Column::Steps,
        Column::Location,
        Column::Sport,
        Column::Duration,
        Column::Comment,
        Column::Week,
        Column::Hours,
        Column::Weekday,
        Column::HrRest,
        Column::SleepTime,
        Column::Vo2Max,
    ];

    /// Sheet header names recognized for this column, lowercase
    pub fn header_names(self) -> &'static [&'static str] {
        match self {
            Column::Date => &["date"],
            Column::Distance => &["distance"],
            Column::Steps => &["steps"],
            Column::Location => &["location"],
            Column::Sport => &["sport"],
            Column::Duration => &["duration"],
            Column::Comment => &["comment"],
            Column::Week => &["week"],
            Column::Hours => &["hours"],
            Column::Weekday => &["week day", "day"],
            Column::HrRest => &["hr rest"],
            Column::SleepTime => &["sleep time"],
            Column::Vo2Max => &["vo2 max"],
        }
    }

    fn from_header(header: &str) -> Option<Column> {
        let canonical = header.trim().to_lowercase();
        Column::ALL
            .into_iter()
            .find(|col| col.header_names().contains(&canonical.as_str()))
    }

    fn name(self) -> &'static str {
        match self {
            Column::Date => "DATE",
            Column::Distance => "DISTANCE",
            Column::Steps => "STEPS",
            Column::Location => "LOCATION",
            Column::Sport => "SPORT",
            Column::Duration => "DURATION",
            Column::Comment => "COMMENT",
            Column::Week => "WEEK",
            Column::Hours => "HOURS",
            Column::Weekday => "WEEKDAY",
            Column::HrRest => "HR_REST",
            Column::SleepTime => "SLEEP_TIME",
            Column::Vo2Max => "VO2_MAX",
        }
    }
}

/// One spreadsheet cell.
///
/// `Formula` is an opaque `=`-expression the sheet recomputes live; the crate
/// never evaluates it locally.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Integer(i64),
    Formula(String),
    Blank,
}

impl CellValue {
    /// JSON value for the Sheets API with `USER_ENTERED` input option
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::Number(n) => serde_json::json!(n),
            CellValue::Integer(n) => serde_json::json!(n),
            CellValue::Formula(f) => serde_json::Value::String(f.clone()),
            CellValue::Blank => serde_json::Value::String(String::new()),
        }
    }
}

/// Field-to-cell mapping for one row
pub type RowFields = HashMap<Column, CellValue>;

/// Maps columns to sheet positions based on the header row
pub struct ColumnsMapper {
    layout: Vec<Option<Column>>,
}

impl ColumnsMapper {
    pub fn from_header_row(header_row: &[String]) -> Self {
        Self {
            layout: header_row
                .iter()
                .map(|header| Column::from_header(header))
                .collect(),
        }
    }

    fn missing_column_error(&self, column: Column) -> DailyError {
        let missing: Vec<Column> = Column::ALL
            .into_iter()
            .filter(|col| !self.layout.contains(&Some(*col)))
            .collect();
        DailyError::MissingColumn {
            column: column.name().to_string(),
            missing: missing.iter().map(|col| col.name().to_string()).collect(),
            expected: missing
                .iter()
                .flat_map(|col| col.header_names().iter().map(|name| name.to_string()))
                .collect(),
        }
    }

    /// Zero-based sheet index of the column
    pub fn idx(&self, column: Column) -> Result<usize, DailyError> {
        self.layout
            .iter()
            .position(|col| *col == Some(column))
            .ok_or_else(|| self.missing_column_error(column))
    }

    /// A1-style column reference ("A", "B", ...)
    pub fn a1(&self, column: Column) -> Result<String, DailyError> {
        let idx = self.idx(column)?;
        Ok(column_letter(idx))
    }

    /// Number of columns in the sheet header
    pub fn width(&self) -> usize {
        self.layout.len()
    }

    /// Lay out row fields in sheet column order. Unknown sheet columns and
    /// unset fields become blank cells.
    pub fn map_row(&self, fields: &RowFields) -> Vec<CellValue> {
        self.layout
            .iter()
            .map(|col| {
                col.and_then(|col| fields.get(&col).cloned())
                    .unwrap_or(CellValue::Blank)
            })
            .collect()
    }
}

/// A1 letter(s) for a zero-based column index
pub fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
