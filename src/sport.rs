//! Sport classification
//!
//! Maps a Garmin activity type key to a canonical sport name and decides
//! whether the session must stay separate from same-day peers. The table is
//! static; one entry (`skate_skiing_ws`) is time-sensitive because the same
//! type key meant roller skiing during the snowless season.

use chrono::{Datelike, NaiveDate};

/// Sport assigned to activity types missing from the table
pub const UNKNOWN_SPORT: &str = "Unknown";

/// Cycling sessions longer than this stay as individual rows, meters
const CYCLING_SEPARATE_DISTANCE: f64 = 8000.0;

/// Calendar date as (year, month, day), ordered lexicographically
type Ymd = (i32, u32, u32);

/// Date interval (inclusive) during which a sport name applies
struct DateRule {
    from: Ymd,
    to: Ymd,
    sport: &'static str,
}

/// Classification rule for one activity type key
enum SportRule {
    /// The type key always means this sport
    Literal(&'static str),
    /// The sport depends on the session's start date; first matching
    /// interval wins, otherwise the default applies
    ByInterval {
        rules: &'static [DateRule],
        default: &'static str,
    },
}

fn sport_rule(type_key: &str) -> Option<SportRule> {
    match type_key {
        "running" => Some(SportRule::Literal("Running")),
        "elliptical" => Some(SportRule::Literal("Ellipse")),
        "cycling" => Some(SportRule::Literal("Bicycle")),
        "skate_skiing_ws" => Some(SportRule::ByInterval {
            rules: &[DateRule {
                // the only roller skiing season logged under this key
                from: (2021, 4, 17),
                to: (2021, 11, 16),
                sport: "Roller skiing",
            }],
            default: "Skiing",
        }),
        _ => None,
    }
}

/// Calendar date of an ISO-like local timestamp such as "2021-06-10T09:00:00"
fn start_date(start_time: &str) -> Option<Ymd> {
    let date_part = start_time.split(['T', ' ']).next()?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    Some((date.year(), date.month(), date.day()))
}

/// Classify an activity type key into (sport, keep_separate).
///
/// Pure function of its arguments. Separate sessions are never merged with
/// same-day peers: unknown activity types (their semantics are unverified)
/// and long bike rides (a big ride should remain individually visible while
/// short hops collapse into one row).
pub fn classify(
    type_key: &str,
    distance_meters: Option<f64>,
    start_time: Option<&str>,
) -> (String, bool) {
    let Some(rule) = sport_rule(type_key) else {
        return (UNKNOWN_SPORT.to_string(), true);
    };

    let sport = match rule {
        SportRule::Literal(name) => name,
        SportRule::ByInterval { rules, default } => {
            match start_time.and_then(start_date) {
                Some(date) => rules
                    .iter()
                    .find(|r| date >= r.from && date <= r.to)
                    .map_or(default, |r| r.sport),
                // no start time: never fail, fall back to the default
                None => default,
            }
        }
    };

    let separate =
        type_key == "cycling" && distance_meters.unwrap_or(0.0) > CYCLING_SEPARATE_DISTANCE;
    (sport.to_string(), separate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_sports() {
        assert_eq!(
            classify("running", Some(10000.0), Some("2022-01-01T09:00:00")),
            ("Running".to_string(), false)
        );
        assert_eq!(
            classify("elliptical", None, None),
            ("Ellipse".to_string(), false)
        );
    }

    #[test]
    fn long_bike_rides_stay_separate() {
        assert_eq!(
            classify("cycling", Some(9000.0), None),
            ("Bicycle".to_string(), true)
        );
        assert_eq!(
            classify("cycling", Some(5000.0), None),
            ("Bicycle".to_string(), false)
        );
    }

    #[test]
    fn unknown_type_is_always_separate() {
        assert_eq!(
            classify("-fake_fake-", Some(100000.0), None),
            (UNKNOWN_SPORT.to_string(), true)
        );
    }

    #[test]
    fn skate_skiing_depends_on_season() {
        let (summer, _) = classify("skate_skiing_ws", None, Some("2021-06-10T09:00:00"));
        assert_eq!(summer, "Roller skiing");

        let (winter, _) = classify("skate_skiing_ws", None, Some("2022-01-27T09:00:00"));
        assert_eq!(winter, "Skiing");

        // interval bounds are inclusive
        let (first_day, _) = classify("skate_skiing_ws", None, Some("2021-04-17T08:00:00"));
        assert_eq!(first_day, "Roller skiing");
        let (last_day, _) = classify("skate_skiing_ws", None, Some("2021-11-16T20:00:00"));
        assert_eq!(last_day, "Roller skiing");
    }

    #[test]
    fn missing_start_time_uses_default() {
        let (sport, separate) = classify("skate_skiing_ws", None, None);
        assert_eq!(sport, "Skiing");
        assert!(!separate);
    }

    #[test]
    fn classification_is_pure() {
        let first = classify("cycling", Some(9000.0), Some("2022-01-01T09:00:00"));
        let second = classify("cycling", Some(9000.0), Some("2022-01-01T09:00:00"));
        assert_eq!(first, second);
    }
}
