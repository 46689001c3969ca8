//! Row projection
//!
//! Converts a [`DaySummary`] into sink-ready row field mappings: unit
//! conversions, conditional blanks, and deferred spreadsheet formulas for
//! values the sheet recomputes live (walking distance and steps).

use chrono::{Datelike, NaiveDate, Weekday};

use crate::activity::{step_length_km, Activity, WALKING_SPORT};
use crate::columns::{CellValue, Column, RowFields};
use crate::day::DaySummary;
use crate::mappers::{ActivityMapper, LocationMapper};

/// First Monday of the spreadsheet's week numbering
const WEEK_EPOCH: (i32, u32, u32) = (2013, 1, 14);

/// Auto-injected gym training configuration
pub struct GymPlan {
    pub weekdays: Vec<Weekday>,
    pub duration_minutes: u32,
}

/// Week number for a date, counted from the epoch Monday
pub fn week_num(date: NaiveDate) -> i64 {
    let (y, m, d) = WEEK_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    ((date - epoch).num_days() as f64 / 7.0).round() as i64
}

/// Projects day summaries onto spreadsheet rows
pub struct RowProjector<'a> {
    locations: &'a LocationMapper,
    renames: &'a ActivityMapper,
}

impl<'a> RowProjector<'a> {
    pub fn new(locations: &'a LocationMapper, renames: &'a ActivityMapper) -> Self {
        Self { locations, renames }
    }

    /// Rows for one day, in the order they appear in the sheet.
    ///
    /// When the day's weekday is a configured gym day, one extra Gym record
    /// with fixed duration and the configured location is appended before
    /// projection. It never passes through classification.
    pub fn day_rows(&self, day: &DaySummary, gym: Option<&GymPlan>) -> Vec<RowFields> {
        let mut activities: Vec<&Activity> = day.activities.iter().collect();

        let gym_record = gym
            .filter(|plan| plan.weekdays.contains(&day.date.weekday()))
            .map(|plan| {
                let mut record = Activity::new("gym");
                record.sport = Some("Gym".to_string());
                record.duration = Some(f64::from(plan.duration_minutes) * 60.0);
                record.location_name = Some(self.locations.gym_location().to_string());
                record
            });
        if let Some(ref record) = gym_record {
            activities.push(record);
        }

        activities
            .iter()
            .map(|activity| self.project_activity(activity, day))
            .collect()
    }

    fn project_activity(&self, activity: &Activity, day: &DaySummary) -> RowFields {
        let mut fields = RowFields::new();

        let sport = activity.sport.as_deref().unwrap_or(&activity.activity_type);
        let sport = self.renames.get_activity_name(sport).to_string();
        let is_walking = sport == WALKING_SPORT;

        if let Some(location) = self
            .locations
            .get_location(&sport, activity.location_name.as_deref())
        {
            fields.insert(Column::Location, CellValue::Text(location));
        }
        fields.insert(
            Column::Date,
            CellValue::Text(day.date.format("%Y-%m-%d").to_string()),
        );

        if let Some(duration) = activity.duration {
            fields.insert(
                Column::Duration,
                CellValue::Integer((duration / 60.0).round() as i64),
            );
            fields.insert(
                Column::Hours,
                CellValue::Number((duration / 3600.0 * 10.0).round() / 10.0),
            );
        } else {
            fields.insert(Column::Hours, CellValue::Integer(0));
        }

        fields.insert(Column::Distance, self.distance_cell(activity, &sport));
        fields.insert(Column::Steps, steps_cell(activity));

        if let Some(comment) = &activity.comment {
            fields.insert(Column::Comment, CellValue::Text(comment.clone()));
        }

        fields.insert(Column::Week, CellValue::Integer(week_num(day.date)));
        fields.insert(
            Column::Weekday,
            CellValue::Integer(i64::from(day.date.weekday().number_from_monday())),
        );

        // day-level health numbers live only on the Walking row
        if is_walking {
            if let Some(resting) = day.heart_rate.resting {
                fields.insert(Column::HrRest, CellValue::Number(resting));
            }
            if let Some(sleep) = &day.sleep {
                fields.insert(Column::SleepTime, CellValue::Number(sleep.total_hours));
            }
            if let Some(vo2max) = day.vo2max {
                fields.insert(Column::Vo2Max, CellValue::Number(vo2max));
            }
        }

        fields.insert(Column::Sport, CellValue::Text(sport));
        fields
    }

    /// Distance in km, or a formula recomputing it from steps when Garmin
    /// gave none and the sport has a calibrated step length
    fn distance_cell(&self, activity: &Activity, sport: &str) -> CellValue {
        if let Some(meters) = activity.distance {
            return CellValue::Number((meters / 1000.0 * 100.0).round() / 100.0);
        }
        match (step_length_km(sport), activity.steps) {
            (Some(km_per_step), Some(steps)) => {
                let steps_expr = match activity.non_walking_steps {
                    Some(non_walking) => format!("({steps}-{non_walking})"),
                    None => steps.to_string(),
                };
                CellValue::Formula(format!("={steps_expr}*{km_per_step}"))
            }
            _ => CellValue::Blank,
        }
    }
}

/// Steps as a deferred subtraction on the Walking row, a plain number for
/// sports that really counted steps, blank otherwise
fn steps_cell(activity: &Activity) -> CellValue {
    match (activity.steps, activity.non_walking_steps) {
        (Some(steps), Some(non_walking)) => {
            CellValue::Formula(format!("={steps}-{non_walking}"))
        }
        (Some(steps), None) if steps > 0 => CellValue::Integer(steps),
        _ => CellValue::Blank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day::{HeartRateSummary, SleepSummary};
    use pretty_assertions::assert_eq;

    fn mappers() -> (LocationMapper, ActivityMapper) {
        (
            LocationMapper::new(Vec::new(), "No Limit Gym", true).expect("mapper"),
            ActivityMapper::new(Vec::new()).expect("mapper"),
        )
    }

    fn summary(date: NaiveDate, activities: Vec<Activity>) -> DaySummary {
        DaySummary {
            date,
            total_steps: 6969,
            heart_rate: HeartRateSummary {
                min: Some(48.0),
                max: Some(152.0),
                average: Some(72.0),
                resting: Some(52.0),
            },
            sleep: Some(SleepSummary {
                total_hours: 7.5,
                deep_hours: 1.2,
                light_hours: 4.4,
                rem_hours: 1.9,
            }),
            vo2max: Some(49.0),
            activities,
        }
    }

    fn sunday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date")
    }

    #[test]
    fn week_number_counts_from_epoch_monday() {
        assert_eq!(week_num(sunday()), 520);
    }

    #[test]
    fn projects_sport_row() {
        let (locations, renames) = mappers();
        let projector = RowProjector::new(&locations, &renames);

        let mut run = Activity::new("running");
        run.sport = Some("Running".to_string());
        run.duration = Some(1100.0);
        run.distance = Some(100.0);
        run.location_name = Some("Novi Sad".to_string());

        let rows = projector.day_rows(&summary(sunday(), vec![run]), None);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row[&Column::Sport], CellValue::Text("Running".to_string()));
        assert_eq!(
            row[&Column::Location],
            CellValue::Text("Novi Sad".to_string())
        );
        assert_eq!(row[&Column::Duration], CellValue::Integer(18));
        assert_eq!(row[&Column::Hours], CellValue::Number(0.3));
        assert_eq!(row[&Column::Distance], CellValue::Number(0.1));
        assert_eq!(
            row[&Column::Date],
            CellValue::Text("2023-01-01".to_string())
        );
        assert_eq!(row[&Column::Week], CellValue::Integer(520));
        assert_eq!(row[&Column::Weekday], CellValue::Integer(7));
        // day-level numbers do not leak onto sport rows
        assert!(!row.contains_key(&Column::HrRest));
        assert!(!row.contains_key(&Column::Vo2Max));
    }

    #[test]
    fn walking_row_defers_steps_and_distance_to_the_sheet() {
        let (locations, renames) = mappers();
        let projector = RowProjector::new(&locations, &renames);

        let mut walking = Activity::new("walking");
        walking.sport = Some(WALKING_SPORT.to_string());
        walking.steps = Some(6969);
        walking.non_walking_steps = Some(2477);

        let rows = projector.day_rows(&summary(sunday(), vec![walking]), None);
        let row = &rows[0];
        assert_eq!(
            row[&Column::Steps],
            CellValue::Formula("=6969-2477".to_string())
        );
        assert_eq!(
            row[&Column::Distance],
            CellValue::Formula("=(6969-2477)*0.00085".to_string())
        );
        assert_eq!(row[&Column::Hours], CellValue::Integer(0));
        assert_eq!(row[&Column::HrRest], CellValue::Number(52.0));
        assert_eq!(row[&Column::SleepTime], CellValue::Number(7.5));
        assert_eq!(row[&Column::Vo2Max], CellValue::Number(49.0));
    }

    #[test]
    fn gym_day_appends_configured_training() {
        let (locations, renames) = mappers();
        let projector = RowProjector::new(&locations, &renames);

        let plan = GymPlan {
            weekdays: vec![Weekday::Sun],
            duration_minutes: 30,
        };
        let rows = projector.day_rows(&summary(sunday(), Vec::new()), Some(&plan));
        assert_eq!(rows.len(), 1);
        let gym = &rows[0];
        assert_eq!(gym[&Column::Sport], CellValue::Text("Gym".to_string()));
        assert_eq!(
            gym[&Column::Location],
            CellValue::Text("No Limit Gym".to_string())
        );
        assert_eq!(gym[&Column::Duration], CellValue::Integer(30));
        assert_eq!(gym[&Column::Hours], CellValue::Number(0.5));
        assert_eq!(gym[&Column::Distance], CellValue::Blank);
    }

    #[test]
    fn gym_skipped_on_other_weekdays() {
        let (locations, renames) = mappers();
        let projector = RowProjector::new(&locations, &renames);
        let plan = GymPlan {
            weekdays: vec![Weekday::Mon],
            duration_minutes: 30,
        };
        let rows = projector.day_rows(&summary(sunday(), Vec::new()), Some(&plan));
        assert!(rows.is_empty());
    }

    #[test]
    fn renames_apply_before_location_patterns() {
        let locations = LocationMapper::new(
            vec![("roller".to_string(), "Bulevar".to_string())],
            "No Limit Gym",
            true,
        )
        .expect("mapper");
        let renames = ActivityMapper::new(vec![(
            "trail".to_string(),
            "Roller skiing".to_string(),
        )])
        .expect("mapper");
        let projector = RowProjector::new(&locations, &renames);

        let mut trail = Activity::new("running");
        trail.sport = Some("Trail Running".to_string());
        trail.distance = Some(5000.0);

        let rows = projector.day_rows(&summary(sunday(), vec![trail]), None);
        let row = &rows[0];
        assert_eq!(
            row[&Column::Sport],
            CellValue::Text("Roller skiing".to_string())
        );
        assert_eq!(
            row[&Column::Location],
            CellValue::Text("Bulevar".to_string())
        );
    }
}
