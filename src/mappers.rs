//! Pattern-based location and sport renaming
//!
//! Free-form CLI rules like `running=Park` rewrite row values: the pattern is
//! a case-insensitive regex matched against the sport name, first match wins.
//! The reserved pattern word "gym" doubles as the gym location definition, so
//! it may be given at most once across the flag and the pattern list.

use regex::{Regex, RegexBuilder};

use crate::error::DailyError;

/// Reserved pattern keyword that defines the gym location
pub const GYM_PATTERN: &str = "gym";

/// Split `pattern=replacement` pairs, rejecting malformed ones
pub fn parse_pairs(pairs: &[String], what: &str) -> Result<Vec<(String, String)>, DailyError> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(pattern, replacement)| (pattern.to_string(), replacement.to_string()))
                .ok_or_else(|| {
                    DailyError::Config(format!(
                        "Invalid {what} format '{pair}'. Use: pattern1=value1,pattern2=value2"
                    ))
                })
        })
        .collect()
}

fn compile(pattern: &str) -> Result<Regex, DailyError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| DailyError::Config(format!("Invalid pattern '{pattern}': {e}")))
}

/// Rewrites activity locations and owns the unique gym location
pub struct LocationMapper {
    mappings: Vec<(Regex, String)>,
    gym_location: String,
}

impl LocationMapper {
    /// Build from `(pattern, location)` pairs plus the `--gym-location` value.
    ///
    /// `is_default_gym_location` tells whether the flag was left at its
    /// default; an explicit flag and a "gym" pattern together are ambiguous
    /// and rejected before any I/O happens.
    pub fn new(
        mappings: Vec<(String, String)>,
        gym_location: &str,
        is_default_gym_location: bool,
    ) -> Result<Self, DailyError> {
        let mut gym_definitions: Vec<(String, String)> = Vec::new();
        if !is_default_gym_location {
            gym_definitions.push(("--gym-location parameter".to_string(), gym_location.to_string()));
        }
        for (pattern, location) in &mappings {
            if pattern.to_lowercase().contains(GYM_PATTERN) {
                gym_definitions.push((format!("locations pattern '{pattern}'"), location.clone()));
            }
        }
        if gym_definitions.len() > 1 {
            let sources = gym_definitions
                .iter()
                .map(|(source, location)| format!("  - {source}: {location}"))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(DailyError::Config(format!(
                "Gym location defined multiple times:\n{sources}\n\
                 Please use either --gym-location or define gym in --locations parameter, not both."
            )));
        }

        let gym_location = gym_definitions
            .into_iter()
            .next()
            .map_or_else(|| gym_location.to_string(), |(_, location)| location);

        let mappings = mappings
            .into_iter()
            .map(|(pattern, location)| Ok((compile(&pattern)?, location)))
            .collect::<Result<Vec<_>, DailyError>>()?;

        Ok(Self {
            mappings,
            gym_location,
        })
    }

    /// Location for an activity: first matching pattern, else the default
    pub fn get_location(&self, activity_name: &str, default: Option<&str>) -> Option<String> {
        for (pattern, location) in &self.mappings {
            if pattern.is_match(activity_name) {
                return Some(location.clone());
            }
        }
        default.map(str::to_string)
    }

    pub fn gym_location(&self) -> &str {
        &self.gym_location
    }
}

/// Renames sports shown in the spreadsheet, e.g. `trail=Roller skiing`
pub struct ActivityMapper {
    mappings: Vec<(Regex, String)>,
}

impl ActivityMapper {
    pub fn new(mappings: Vec<(String, String)>) -> Result<Self, DailyError> {
        let mappings = mappings
            .into_iter()
            .map(|(pattern, name)| Ok((compile(&pattern)?, name)))
            .collect::<Result<Vec<_>, DailyError>>()?;
        Ok(Self { mappings })
    }

    /// Mapped name if any pattern matches, otherwise the original
    pub fn get_activity_name<'a>(&'a self, activity: &'a str) -> &'a str {
        for (pattern, new_name) in &self.mappings {
            if pattern.is_match(activity) {
                return new_name;
            }
        }
        activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn parses_pattern_pairs() {
        let parsed = parse_pairs(&["running=Park".to_string()], "locations").expect("valid pair");
        assert_eq!(parsed, pairs(&[("running", "Park")]));

        assert!(parse_pairs(&["no-separator".to_string()], "locations").is_err());
    }

    #[test]
    fn location_first_match_wins_case_insensitive() {
        let mapper = LocationMapper::new(
            pairs(&[("run", "Park"), ("r", "Elsewhere")]),
            "No Limit Gym",
            true,
        )
        .expect("valid mapper");
        assert_eq!(
            mapper.get_location("Running", Some("Novi Sad")),
            Some("Park".to_string())
        );
        assert_eq!(
            mapper.get_location("Skiing", Some("Novi Sad")),
            Some("Novi Sad".to_string())
        );
        assert_eq!(mapper.get_location("Skiing", None), None);
    }

    #[test]
    fn gym_location_from_pattern() {
        let mapper = LocationMapper::new(
            pairs(&[("gym", "Iron Temple")]),
            "No Limit Gym",
            true,
        )
        .expect("valid mapper");
        assert_eq!(mapper.gym_location(), "Iron Temple");
    }

    #[test]
    fn duplicate_gym_definition_is_fatal() {
        let result = LocationMapper::new(
            pairs(&[("gym", "Iron Temple")]),
            "Explicit Gym",
            false,
        );
        assert!(matches!(result, Err(DailyError::Config(_))));
    }

    #[test]
    fn explicit_flag_alone_is_fine() {
        let mapper =
            LocationMapper::new(Vec::new(), "Explicit Gym", false).expect("valid mapper");
        assert_eq!(mapper.gym_location(), "Explicit Gym");
    }

    #[test]
    fn renames_activities() {
        let mapper =
            ActivityMapper::new(pairs(&[("trail", "Roller skiing")])).expect("valid mapper");
        assert_eq!(mapper.get_activity_name("Trail Running"), "Roller skiing");
        assert_eq!(mapper.get_activity_name("Running"), "Running");
    }

    #[test]
    fn bad_regex_is_a_config_error() {
        assert!(ActivityMapper::new(pairs(&[("(", "x")])).is_err());
    }
}
