//! Day-by-day synchronization into the sheet
//!
//! Pulls each missing day from the source, aggregates it, and inserts its
//! rows at the top of the sheet. Days run strictly chronologically so newer
//! days end up above older ones. Row construction is all-or-nothing per day:
//! a day that fails to aggregate aborts the run before anything is written.

use chrono::{Duration as ChronoDuration, NaiveDate};
use tracing::info;

use crate::columns::{CellValue, ColumnsMapper};
use crate::day::DaySummary;
use crate::error::DailyError;
use crate::garmin::DailySource;
use crate::pacer::BatchPacer;
use crate::rows::{GymPlan, RowProjector};
use crate::sheets::SheetsClient;

/// 1-based sheet row where new rows are inserted, right under the header
const INSERT_AT_ROW: usize = 2;

/// Row writes the sync loop needs from the destination
pub trait RowSink {
    fn insert_rows(&self, start_row: usize, count: usize) -> Result<(), DailyError>;
    fn write_rows(&self, start_row: usize, rows: &[Vec<CellValue>]) -> Result<(), DailyError>;
    /// Steps recorded in the sheet itself, for days Garmin no longer serves
    fn legacy_steps(
        &mut self,
        mapper: &ColumnsMapper,
        date: NaiveDate,
    ) -> Result<Option<i64>, DailyError>;
}

impl RowSink for SheetsClient {
    fn insert_rows(&self, start_row: usize, count: usize) -> Result<(), DailyError> {
        SheetsClient::insert_rows(self, start_row, count)
    }

    fn write_rows(&self, start_row: usize, rows: &[Vec<CellValue>]) -> Result<(), DailyError> {
        SheetsClient::write_rows(self, start_row, rows)
    }

    fn legacy_steps(
        &mut self,
        mapper: &ColumnsMapper,
        date: NaiveDate,
    ) -> Result<Option<i64>, DailyError> {
        SheetsClient::legacy_steps(self, mapper, date)
    }
}

/// Add `days` consecutive days starting at `start`. Returns the number of
/// rows written.
#[allow(clippy::too_many_arguments)]
pub fn add_days<S: RowSink>(
    source: &dyn DailySource,
    sink: &mut S,
    mapper: &ColumnsMapper,
    projector: &RowProjector<'_>,
    start: NaiveDate,
    days: i64,
    gym: Option<&GymPlan>,
    pacer: &mut BatchPacer,
) -> Result<usize, DailyError> {
    let mut rows_written = 0;

    for offset in 0..days {
        let date = start + ChronoDuration::days(offset);
        let day = fetch_day_with_backfill(source, sink, mapper, date)?;

        let rows = projector.day_rows(&day, gym);
        let sheet_rows: Vec<Vec<CellValue>> =
            rows.iter().map(|fields| mapper.map_row(fields)).collect();

        info!("{date}: {} rows", sheet_rows.len());
        if !sheet_rows.is_empty() {
            sink.insert_rows(INSERT_AT_ROW, sheet_rows.len())?;
            sink.write_rows(INSERT_AT_ROW, &sheet_rows)?;
            rows_written += sheet_rows.len();
        }

        let remaining = (days - offset - 1) as usize;
        pacer.pause(remaining);
    }

    Ok(rows_written)
}

/// Aggregate one day, taking the step total from the sheet when Garmin
/// returns zero (data older than its retention window)
fn fetch_day_with_backfill<S: RowSink>(
    source: &dyn DailySource,
    sink: &mut S,
    mapper: &ColumnsMapper,
    date: NaiveDate,
) -> Result<DaySummary, DailyError> {
    let mut total_steps = source.step_total(date)?;
    if total_steps == 0 {
        if let Some(legacy) = sink.legacy_steps(mapper, date)? {
            info!("{date}: backfilling {legacy} steps from the sheet");
            total_steps = legacy;
        }
    }
    let raw = source.activities(date)?;
    let heart_rate = source.heart_rate(date)?;
    let sleep = source.sleep(date)?;
    let vo2max = source.vo2max(date)?;
    Ok(DaySummary::assemble(
        date, total_steps, heart_rate, sleep, vo2max, raw,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::day::{HeartRateSummary, SleepSummary};
    use crate::mappers::{ActivityMapper, LocationMapper};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FakeSource {
        steps_by_date: HashMap<NaiveDate, i64>,
    }

    impl DailySource for FakeSource {
        fn activities(&self, _date: NaiveDate) -> Result<Vec<Activity>, DailyError> {
            let mut run = Activity::new("running");
            run.duration = Some(1800.0);
            run.distance = Some(5000.0);
            run.steps = Some(4000);
            run.start_time = Some("2023-01-01T09:00:00".to_string());
            Ok(vec![run])
        }

        fn step_total(&self, date: NaiveDate) -> Result<i64, DailyError> {
            Ok(self.steps_by_date.get(&date).copied().unwrap_or(0))
        }

        fn heart_rate(&self, _date: NaiveDate) -> Result<HeartRateSummary, DailyError> {
            Ok(HeartRateSummary::default())
        }

        fn sleep(&self, _date: NaiveDate) -> Result<Option<SleepSummary>, DailyError> {
            Ok(None)
        }

        fn vo2max(&self, _date: NaiveDate) -> Result<Option<f64>, DailyError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct FakeSink {
        // (start_row, rows) per write, in call order
        writes: RefCell<Vec<(usize, Vec<Vec<CellValue>>)>>,
        inserts: RefCell<Vec<(usize, usize)>>,
        legacy: HashMap<NaiveDate, i64>,
    }

    impl RowSink for FakeSink {
        fn insert_rows(&self, start_row: usize, count: usize) -> Result<(), DailyError> {
            self.inserts.borrow_mut().push((start_row, count));
            Ok(())
        }

        fn write_rows(
            &self,
            start_row: usize,
            rows: &[Vec<CellValue>],
        ) -> Result<(), DailyError> {
            self.writes.borrow_mut().push((start_row, rows.to_vec()));
            Ok(())
        }

        fn legacy_steps(
            &mut self,
            _mapper: &ColumnsMapper,
            date: NaiveDate,
        ) -> Result<Option<i64>, DailyError> {
            Ok(self.legacy.get(&date).copied())
        }
    }

    fn mapper() -> ColumnsMapper {
        ColumnsMapper::from_header_row(
            &["Date", "Sport", "Steps", "Distance", "Duration"]
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn writes_each_day_at_the_top() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        let source = FakeSource {
            steps_by_date: HashMap::from([
                (start, 6000),
                (start + ChronoDuration::days(1), 7000),
            ]),
        };
        let mut sink = FakeSink::default();
        let locations = LocationMapper::new(Vec::new(), "No Limit Gym", true).expect("mapper");
        let renames = ActivityMapper::new(Vec::new()).expect("mapper");
        let projector = RowProjector::new(&locations, &renames);
        let mapper = mapper();
        let mut pacer = BatchPacer::new(100, Duration::from_millis(0));

        let written = add_days(
            &source,
            &mut sink,
            &mapper,
            &projector,
            start,
            2,
            None,
            &mut pacer,
        )
        .expect("sync");

        // running + walking rows for each of the two days
        assert_eq!(written, 4);
        let inserts = sink.inserts.borrow();
        assert_eq!(*inserts, vec![(2, 2), (2, 2)]);
        let writes = sink.writes.borrow();
        assert_eq!(writes.len(), 2);
        // chronological processing: first write is the older day
        assert_eq!(
            writes[0].1[0][0],
            CellValue::Text("2023-01-01".to_string())
        );
        assert_eq!(
            writes[1].1[0][0],
            CellValue::Text("2023-01-02".to_string())
        );
    }

    #[test]
    fn zero_step_days_backfill_from_the_sheet() {
        let date = NaiveDate::from_ymd_opt(2021, 6, 1).expect("valid date");
        let source = FakeSource {
            steps_by_date: HashMap::new(),
        };
        let mut sink = FakeSink {
            legacy: HashMap::from([(date, 4492)]),
            ..FakeSink::default()
        };
        let mapper = mapper();

        let day = fetch_day_with_backfill(&source, &mut sink, &mapper, date).expect("day");
        assert_eq!(day.total_steps, 4492);
        let walking = day.activities.last().expect("walking");
        assert_eq!(walking.steps, Some(4492));
    }

    #[test]
    fn nonzero_step_days_ignore_the_sheet_cache() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        let source = FakeSource {
            steps_by_date: HashMap::from([(date, 6000)]),
        };
        let mut sink = FakeSink {
            legacy: HashMap::from([(date, 4492)]),
            ..FakeSink::default()
        };
        let mapper = mapper();

        let day = fetch_day_with_backfill(&source, &mut sink, &mapper, date).expect("day");
        assert_eq!(day.total_steps, 6000);
    }
}
