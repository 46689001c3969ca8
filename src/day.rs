//! Day aggregation
//!
//! Groups a day's raw Garmin sessions by classified sport, merges each group,
//! reconciles pedometer double counting and assembles the immutable
//! [`DaySummary`]. No partially built summary is ever observable: all inputs
//! are fetched first and combined in one constructor call.

use chrono::NaiveDate;

use crate::activity::{merge_group, Activity, WALKING_SPORT};
use crate::sport::classify;

/// Separator inside grouping keys for must-keep-separate sessions.
///
/// Unit separator: guaranteed absent from sport names and Garmin timestamps,
/// so a key never collides with a mergeable sport key.
const GROUP_KEY_SEPARATOR: char = '\u{1f}';

/// Day-level heart rate extremes and averages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeartRateSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub average: Option<f64>,
    pub resting: Option<f64>,
}

/// Sleep stage breakdown, hours. All-or-nothing: either Garmin reported a
/// full night or the day has no sleep data at all.
#[derive(Debug, Clone, PartialEq)]
pub struct SleepSummary {
    pub total_hours: f64,
    pub deep_hours: f64,
    pub light_hours: f64,
    pub rem_hours: f64,
}

/// One fully aggregated day
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Total pedometer reading for the day, all sources
    pub total_steps: i64,
    pub heart_rate: HeartRateSummary,
    pub sleep: Option<SleepSummary>,
    pub vo2max: Option<f64>,
    /// One record per distinct sport session, the synthesized Walking
    /// record appended last
    pub activities: Vec<Activity>,
}

impl DaySummary {
    /// Combine a day's raw inputs into the final summary.
    ///
    /// Raw sessions are classified, grouped and merged; the Walking record is
    /// synthesized so that the sum of all non-walking steps equals its
    /// `non_walking_steps` field exactly.
    pub fn assemble(
        date: NaiveDate,
        total_steps: i64,
        heart_rate: HeartRateSummary,
        sleep: Option<SleepSummary>,
        vo2max: Option<f64>,
        raw: Vec<Activity>,
    ) -> Self {
        let mut activities = aggregate_activities(raw);

        let non_walking_steps: i64 = activities.iter().map(|a| a.steps.unwrap_or(0)).sum();

        let mut walking = Activity::new("walking");
        walking.sport = Some(WALKING_SPORT.to_string());
        // total unmodified; duration and distance stay absent: ambient
        // walking has no single session duration
        walking.steps = Some(total_steps);
        walking.non_walking_steps = Some(non_walking_steps);
        walking.comment = walking_comment(&heart_rate, sleep.as_ref());
        activities.push(walking);

        Self {
            date,
            total_steps,
            heart_rate,
            sleep,
            vo2max,
            activities,
        }
    }
}

/// Classify, group and merge one day's raw sessions.
///
/// Groups keep the order in which their sport was first seen. Each merged
/// record gets its bare sport name, an estimated step count when Garmin
/// provided none, and a derived comment.
pub fn aggregate_activities(raw: Vec<Activity>) -> Vec<Activity> {
    let mut groups: Vec<(String, Vec<Activity>)> = Vec::new();

    for activity in raw {
        let (sport, separate) = classify(
            &activity.activity_type,
            activity.distance,
            activity.start_time.as_deref(),
        );
        let key = if separate {
            format!(
                "{sport}{GROUP_KEY_SEPARATOR}{}",
                activity.start_time.as_deref().unwrap_or("")
            )
        } else {
            sport
        };
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(activity),
            None => groups.push((key, vec![activity])),
        }
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let mut merged = merge_group(&members);
            let sport = key
                .split(GROUP_KEY_SEPARATOR)
                .next()
                .unwrap_or(&key)
                .to_string();
            merged.sport = Some(sport);
            if merged.steps.unwrap_or(0) == 0 {
                merged.steps = Some(merged.estimated_steps());
            }
            merged.comment = activity_comment(&merged);
            merged
        })
        .collect()
}

/// Speed and heart rate details for a sport row
fn activity_comment(activity: &Activity) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(speed) = activity.max_speed.filter(|v| *v > 0.0) {
        parts.push(format!("max speed {:.1} km/h", speed * 3.6));
    }
    if let Some(avg) = activity.average_hr.filter(|v| *v > 0.0) {
        parts.push(format!("HR avg {avg:.0}"));
    }
    if let Some(max) = activity.max_hr.filter(|v| *v > 0.0) {
        parts.push(format!("HR max {max:.0}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Heart rate and sleep details for the Walking row
fn walking_comment(
    heart_rate: &HeartRateSummary,
    sleep: Option<&SleepSummary>,
) -> Option<String> {
    let mut parts = Vec::new();
    if let (Some(min), Some(max)) = (heart_rate.min, heart_rate.max) {
        parts.push(format!("HR {min:.0}-{max:.0}"));
    }
    if let Some(avg) = heart_rate.average {
        parts.push(format!("HR avg {avg:.0}"));
    }
    if let Some(sleep) = sleep {
        parts.push(format!(
            "sleep {:.1}h (deep {:.1}, light {:.1}, rem {:.1})",
            sleep.total_hours, sleep.deep_hours, sleep.light_hours, sleep.rem_hours
        ));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}
