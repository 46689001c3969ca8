//! Garmin Connect API response structures

use serde::Deserialize;

use crate::activity::Activity;
use crate::day::{HeartRateSummary, SleepSummary};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminActivity {
    pub activity_type: Option<GarminActivityType>,
    pub location_name: Option<String>,
    pub duration: Option<f64>,
    pub moving_duration: Option<f64>,
    #[serde(rename = "averageHR")]
    pub average_hr: Option<f64>,
    #[serde(rename = "maxHR")]
    pub max_hr: Option<f64>,
    pub calories: Option<f64>,
    pub distance: Option<f64>,
    pub elevation_gain: Option<f64>,
    pub max_speed: Option<f64>,
    pub average_speed: Option<f64>,
    pub start_time_local: Option<String>,
    pub steps: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarminActivityType {
    pub type_key: Option<String>,
}

impl From<GarminActivity> for Activity {
    fn from(garmin: GarminActivity) -> Self {
        let type_key = garmin
            .activity_type
            .and_then(|t| t.type_key)
            .unwrap_or_default();
        Activity {
            activity_type: type_key,
            location_name: garmin.location_name,
            duration: garmin.duration,
            moving_duration: garmin.moving_duration,
            average_hr: garmin.average_hr,
            max_hr: garmin.max_hr,
            calories: garmin.calories,
            distance: garmin.distance,
            elevation_gain: garmin.elevation_gain,
            max_speed: garmin.max_speed,
            average_speed: garmin.average_speed,
            start_time: garmin.start_time_local,
            steps: garmin.steps,
            non_walking_steps: None,
            sport: None,
            comment: None,
        }
    }
}

/// One interval of the daily steps chart
#[derive(Debug, Deserialize)]
pub struct StepsInterval {
    pub steps: Option<i64>,
}

/// Daily heart rate endpoint payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRates {
    pub max_heart_rate: Option<f64>,
    pub min_heart_rate: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    /// (unix millis, bpm) samples; bpm is null for gaps
    #[serde(default)]
    pub heart_rate_values: Option<Vec<(i64, Option<f64>)>>,
}

impl HeartRates {
    /// Summary with the average over non-null samples
    pub fn summarize(self) -> HeartRateSummary {
        let samples: Vec<f64> = self
            .heart_rate_values
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(_, bpm)| bpm)
            .collect();
        let average = if samples.is_empty() {
            None
        } else {
            Some(samples.iter().sum::<f64>() / samples.len() as f64)
        };
        HeartRateSummary {
            min: self.min_heart_rate,
            max: self.max_heart_rate,
            average,
            resting: self.resting_heart_rate,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepData {
    #[serde(rename = "dailySleepDTO")]
    pub daily_sleep_dto: Option<DailySleep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySleep {
    pub sleep_time_seconds: Option<i64>,
    pub deep_sleep_seconds: Option<i64>,
    pub light_sleep_seconds: Option<i64>,
    pub rem_sleep_seconds: Option<i64>,
}

impl SleepData {
    /// All-or-nothing: a summary only when every stage is reported
    pub fn summarize(self) -> Option<SleepSummary> {
        let dto = self.daily_sleep_dto?;
        Some(SleepSummary {
            total_hours: seconds_to_hours(dto.sleep_time_seconds?),
            deep_hours: seconds_to_hours(dto.deep_sleep_seconds?),
            light_hours: seconds_to_hours(dto.light_sleep_seconds?),
            rem_hours: seconds_to_hours(dto.rem_sleep_seconds?),
        })
    }
}

/// Whole minutes first, then hours: matches the sheet's historical rounding
fn seconds_to_hours(seconds: i64) -> f64 {
    (seconds / 60) as f64 / 60.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingStatus {
    pub most_recent_v_o2_max: Option<Vo2MaxWrapper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vo2MaxWrapper {
    pub generic: Option<Vo2MaxValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vo2MaxValue {
    pub vo2_max_value: Option<f64>,
}

impl TrainingStatus {
    pub fn vo2max(self) -> Option<f64> {
        self.most_recent_v_o2_max?.generic?.vo2_max_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_garmin_activity() {
        let json = r#"{
            "activityType": {"typeKey": "running"},
            "duration": 3600,
            "calories": 250,
            "distance": 10000,
            "elevationGain": 50,
            "maxHR": 170,
            "averageHR": 150,
            "startTimeLocal": "2022-01-01T09:00:00",
            "steps": 5000,
            "movingDuration": 3500,
            "locationName": "Novi Sad"
        }"#;
        let parsed: GarminActivity = serde_json::from_str(json).expect("valid payload");
        let activity: Activity = parsed.into();
        assert_eq!(activity.activity_type, "running");
        assert_eq!(activity.duration, Some(3600.0));
        assert_eq!(activity.max_hr, Some(170.0));
        assert_eq!(activity.average_hr, Some(150.0));
        assert_eq!(activity.steps, Some(5000));
        assert_eq!(activity.moving_duration, Some(3500.0));
        assert_eq!(activity.location_name.as_deref(), Some("Novi Sad"));
        assert_eq!(activity.sport, None);
    }

    #[test]
    fn heart_rate_average_skips_null_samples() {
        let json = r#"{
            "maxHeartRate": 150,
            "minHeartRate": 50,
            "restingHeartRate": 70,
            "heartRateValues": [
                [1595304800, 60],
                [1595308000, null],
                [1595311200, 70],
                [1595314400, 75],
                [1595317600, 80],
                [1595320800, 65]
            ]
        }"#;
        let rates: HeartRates = serde_json::from_str(json).expect("valid payload");
        let summary = rates.summarize();
        assert_eq!(summary.max, Some(150.0));
        assert_eq!(summary.min, Some(50.0));
        assert_eq!(summary.resting, Some(70.0));
        assert_eq!(summary.average, Some(70.0));
    }

    #[test]
    fn sleep_summary_is_all_or_nothing() {
        let full = r#"{"dailySleepDTO": {
            "sleepTimeSeconds": 27000,
            "deepSleepSeconds": 4320,
            "lightSleepSeconds": 15840,
            "remSleepSeconds": 6840
        }}"#;
        let sleep: SleepData = serde_json::from_str(full).expect("valid payload");
        let summary = sleep.summarize().expect("full night");
        assert_eq!(summary.total_hours, 7.5);
        assert_eq!(summary.deep_hours, 1.2);

        let partial = r#"{"dailySleepDTO": {"sleepTimeSeconds": 27000}}"#;
        let sleep: SleepData = serde_json::from_str(partial).expect("valid payload");
        assert_eq!(sleep.summarize(), None);

        let missing = r#"{"dailySleepDTO": null}"#;
        let sleep: SleepData = serde_json::from_str(missing).expect("valid payload");
        assert_eq!(sleep.summarize(), None);
    }

    #[test]
    fn vo2max_survives_the_nested_payload() {
        let json = r#"{"mostRecentVO2Max": {"generic": {"vo2MaxValue": 49.0}}}"#;
        let status: TrainingStatus = serde_json::from_str(json).expect("valid payload");
        assert_eq!(status.vo2max(), Some(49.0));

        let empty = r#"{"mostRecentVO2Max": null}"#;
        let status: TrainingStatus = serde_json::from_str(empty).expect("valid payload");
        assert_eq!(status.vo2max(), None);
    }
}
