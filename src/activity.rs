//! Activity record and the per-field merge strategies
//!
//! One `Activity` is a single exercise session as reported by Garmin Connect,
//! or the result of merging several same-sport sessions of one day.
//! Merging uses a static field/strategy table instead of the per-call
//! decisions: each field is aggregated the same way everywhere.

/// Kilometers covered by one step, per sport.
///
/// Used both to estimate steps from distance (sessions where Garmin reports
/// distance but no steps, or fabricates steps as in roller skiing) and to
/// reconstruct walking distance from steps.
pub const SPORT_STEP_LENGTH_KM: &[(&str, f64)] = &[
    ("Roller skiing", 0.0015),
    ("Skiing", 0.0015),
    ("Running", 0.00089),
];

/// Step length for ambient walking, km per step
pub const WALKING_STEP_LENGTH_KM: f64 = 0.00085;

/// Sport name of the synthesized day-level walking record
pub const WALKING_SPORT: &str = "Walking";

/// Step length constant for a sport, if one is calibrated
pub fn step_length_km(sport: &str) -> Option<f64> {
    if sport == WALKING_SPORT {
        return Some(WALKING_STEP_LENGTH_KM);
    }
    SPORT_STEP_LENGTH_KM
        .iter()
        .find(|(name, _)| *name == sport)
        .map(|(_, km)| *km)
}

/// One exercise session, raw or merged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Activity {
    /// Garmin activity type key, e.g. "running" or "skate_skiing_ws"
    pub activity_type: String,
    pub location_name: Option<String>,
    /// Total duration, seconds. Always absent on the Walking record.
    pub duration: Option<f64>,
    pub moving_duration: Option<f64>,
    pub average_hr: Option<f64>,
    pub max_hr: Option<f64>,
    pub calories: Option<f64>,
    /// Distance in meters. Absent on the Walking record: it is reconstructed
    /// in the spreadsheet from steps instead.
    pub distance: Option<f64>,
    pub elevation_gain: Option<f64>,
    /// Max speed, m/s
    pub max_speed: Option<f64>,
    /// Average speed, m/s
    pub average_speed: Option<f64>,
    /// Session start in local time, ISO-like string from Garmin
    pub start_time: Option<String>,
    pub steps: Option<i64>,
    /// Only meaningful on the Walking record: steps already counted by
    /// other sports of the same day
    pub non_walking_steps: Option<i64>,
    /// Canonical sport name, set exactly once after classification
    pub sport: Option<String>,
    /// Human-readable summary shown in the spreadsheet comment column
    pub comment: Option<String>,
}

impl Activity {
    pub fn new(activity_type: impl Into<String>) -> Self {
        Self {
            activity_type: activity_type.into(),
            ..Self::default()
        }
    }

    /// Estimate steps from distance using the sport's step length constant.
    ///
    /// Returns 0 when the sport has no calibrated constant or distance is
    /// absent.
    pub fn estimated_steps(&self) -> i64 {
        let Some(sport) = self.sport.as_deref() else {
            return 0;
        };
        let Some(km_per_step) = step_length_km(sport) else {
            return 0;
        };
        match self.distance {
            Some(meters) if meters > 0.0 => ((meters / 1000.0) / km_per_step).floor() as i64,
            _ => 0,
        }
    }
}

/// Aggregation strategy applied to a numeric field when merging a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggStrategy {
    /// Sum across the group, absent counted as zero
    Sum,
    /// Maximum across the group, absent counted as zero
    Max,
    /// Minimum across the group, absent counted as zero
    Min,
    /// Mean over records where the field is present and non-zero;
    /// absent when no record has it
    Average,
    /// Value of the first record in original order
    First,
}

struct FloatField {
    get: fn(&Activity) -> Option<f64>,
    set: fn(&mut Activity, Option<f64>),
    strategy: AggStrategy,
}

/// The strategy table: declared once, iterated during every merge.
///
/// Note the intentional zero-as-absent conflation for Sum/Max/Min: a field
/// legitimately measured at zero is indistinguishable from a missing one.
/// This mirrors the observed source behavior and is kept as a known
/// approximation.
const FLOAT_FIELDS: &[FloatField] = &[
    FloatField {
        get: |a| a.duration,
        set: |a, v| a.duration = v,
        strategy: AggStrategy::Sum,
    },
    FloatField {
        get: |a| a.moving_duration,
        set: |a, v| a.moving_duration = v,
        strategy: AggStrategy::Sum,
    },
    FloatField {
        get: |a| a.calories,
        set: |a, v| a.calories = v,
        strategy: AggStrategy::Sum,
    },
    FloatField {
        get: |a| a.distance,
        set: |a, v| a.distance = v,
        strategy: AggStrategy::Sum,
    },
    FloatField {
        get: |a| a.elevation_gain,
        set: |a, v| a.elevation_gain = v,
        strategy: AggStrategy::Sum,
    },
    FloatField {
        get: |a| a.average_hr,
        set: |a, v| a.average_hr = v,
        strategy: AggStrategy::Average,
    },
    FloatField {
        get: |a| a.average_speed,
        set: |a, v| a.average_speed = v,
        strategy: AggStrategy::Average,
    },
    FloatField {
        get: |a| a.max_hr,
        set: |a, v| a.max_hr = v,
        strategy: AggStrategy::Max,
    },
    FloatField {
        get: |a| a.max_speed,
        set: |a, v| a.max_speed = v,
        strategy: AggStrategy::Max,
    },
];

/// Merge a group of same-sport sessions into a single record.
///
/// Numeric fields follow [`FLOAT_FIELDS`]; steps are summed absent-as-zero;
/// `activity_type` and `location_name` come from the first record,
/// `start_time` is the earliest present one. `sport` and `comment` stay
/// unset, the caller assigns them.
pub fn merge_group(group: &[Activity]) -> Activity {
    debug_assert!(!group.is_empty());
    let first = &group[0];
    let mut merged = Activity::new(first.activity_type.clone());

    for field in FLOAT_FIELDS {
        let value = match field.strategy {
            AggStrategy::Sum => Some(group.iter().map(|a| (field.get)(a).unwrap_or(0.0)).sum()),
            AggStrategy::Max => group
                .iter()
                .map(|a| (field.get)(a).unwrap_or(0.0))
                .fold(None, |acc: Option<f64>, v| {
                    Some(acc.map_or(v, |m| m.max(v)))
                }),
            AggStrategy::Min => group
                .iter()
                .map(|a| (field.get)(a).unwrap_or(0.0))
                .fold(None, |acc: Option<f64>, v| {
                    Some(acc.map_or(v, |m| m.min(v)))
                }),
            AggStrategy::Average => {
                let present: Vec<f64> = group
                    .iter()
                    .filter_map(|a| (field.get)(a))
                    .filter(|v| *v != 0.0)
                    .collect();
                if present.is_empty() {
                    None
                } else {
                    Some(present.iter().sum::<f64>() / present.len() as f64)
                }
            }
            AggStrategy::First => (field.get)(first),
        };
        (field.set)(&mut merged, value);
    }

    merged.steps = Some(group.iter().map(|a| a.steps.unwrap_or(0)).sum());
    merged.location_name = first.location_name.clone();
    merged.start_time = group.iter().filter_map(|a| a.start_time.clone()).min();
    merged
}
