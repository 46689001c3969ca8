//! garmin-daily CLI - fill a Google Sheet with data from Garmin Connect
//!
//! Detects the last filled day in the sheet, then adds every missing full
//! day up to yesterday. Configuration errors exit with code 1 before any
//! request leaves the process.

use std::process::ExitCode;

use chrono::Weekday;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use garmin_daily::columns::{Column, ColumnsMapper};
use garmin_daily::error::DailyError;
use garmin_daily::garmin::RetryConfig;
use garmin_daily::mappers::{parse_pairs, ActivityMapper, LocationMapper};
use garmin_daily::pacer::BatchPacer;
use garmin_daily::sheets::detect_days_to_add;
use garmin_daily::sync::add_days;
use garmin_daily::{GarminClient, GymPlan, RowProjector, SheetsClient, VERSION};

/// Safety cap: adding more days than this needs an explicit --force
const DAYS_TO_ADD_WITHOUT_FORCE: i64 = 7;

const GYM_LOCATION_DEFAULT: &str = "No Limit Gym";

/// Fill a Google Sheet with data from Garmin Connect
#[derive(Parser)]
#[command(name = "garmin-daily")]
#[command(version = VERSION)]
#[command(about = "Add Garmin daily activities to a Google Sheet", long_about = None)]
struct Cli {
    /// Google spreadsheet to add activities to
    #[arg(short, long, default_value = "05 Fitness")]
    sheet: String,

    /// Week days to add gym trainings on. Pass an empty value to disable.
    #[arg(
        short = 'g',
        long = "gym-day",
        value_name = "WEEKDAY",
        default_values_t = [String::from("mon"), String::from("tue"), String::from("fri")]
    )]
    gym_days: Vec<String>,

    /// Gym training duration, minutes
    #[arg(short = 'd', long = "gym-duration", default_value_t = 30)]
    gym_duration: u32,

    /// Gym location
    #[arg(short = 'y', long = "gym-location")]
    gym_location: Option<String>,

    /// Map activity locations using case-insensitive pattern=location pairs,
    /// e.g. 'running=Park'
    #[arg(short = 'l', long = "locations", value_name = "PATTERN=LOCATION")]
    locations: Vec<String>,

    /// Rename activities using pattern=new_name pairs,
    /// e.g. 'trail=Roller skiing'
    #[arg(short = 'r', long = "rename", value_name = "PATTERN=NAME")]
    renames: Vec<String>,

    /// Allow adding more than the safety cap of days
    #[arg(short, long)]
    force: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<(), DailyError> {
    let location_pairs = parse_pairs(&cli.locations, "locations")?;
    let rename_pairs = parse_pairs(&cli.renames, "rename")?;

    let gym_location = cli.gym_location.as_deref().unwrap_or(GYM_LOCATION_DEFAULT);
    let locations = LocationMapper::new(
        location_pairs.clone(),
        gym_location,
        cli.gym_location.is_none(),
    )?;
    let renames = ActivityMapper::new(rename_pairs.clone())?;
    let gym = gym_plan(&cli)?;

    println!(
        "garmin-daily {VERSION} is going to add Garmin activities to Google Sheet '{}'",
        cli.sheet
    );
    if !location_pairs.is_empty() {
        println!("Activity location mappings:");
        for (pattern, location) in &location_pairs {
            println!("  {pattern} -> {location}");
        }
    }
    if !rename_pairs.is_empty() {
        println!("Activity rename mappings:");
        for (pattern, new_name) in &rename_pairs {
            println!("  {pattern} -> {new_name}");
        }
    }
    if let Some(plan) = &gym {
        println!(
            "Auto create '{}' gym {} minutes training on {:?}",
            locations.gym_location(),
            plan.duration_minutes,
            plan.weekdays
        );
    }

    let mut sheet = SheetsClient::open(&cli.sheet)?;
    let mapper = ColumnsMapper::from_header_row(sheet.header_row());
    // fail on a renamed or missing column before anything is fetched
    for column in Column::ALL {
        mapper.idx(column)?;
    }

    let (start_date, days_to_add) = detect_days_to_add(&sheet, &mapper)?;
    if days_to_add == 0 {
        println!(
            "Last filled day {}. Nothing to add. Add only full days - up to yesterday.",
            start_date - chrono::Duration::days(1)
        );
        return Ok(());
    }
    if days_to_add > DAYS_TO_ADD_WITHOUT_FORCE && !cli.force {
        return Err(DailyError::Config(format!(
            "Too many days to add ({days_to_add}). Use --force to confirm."
        )));
    }

    let mut garmin = GarminClient::new(RetryConfig::default())?;
    garmin.login()?;

    let projector = RowProjector::new(&locations, &renames);
    let mut pacer = BatchPacer::default();
    let rows = add_days(
        &garmin,
        &mut sheet,
        &mapper,
        &projector,
        start_date,
        days_to_add,
        gym.as_ref(),
        &mut pacer,
    )?;
    println!("Added {rows} rows for {days_to_add} day(s) starting {start_date}");
    Ok(())
}

fn gym_plan(cli: &Cli) -> Result<Option<GymPlan>, DailyError> {
    let mut weekdays = Vec::new();
    for day in cli.gym_days.iter().filter(|day| !day.is_empty()) {
        weekdays.push(parse_weekday(day)?);
    }
    if weekdays.is_empty() {
        return Ok(None);
    }
    Ok(Some(GymPlan {
        weekdays,
        duration_minutes: cli.gym_duration,
    }))
}

fn parse_weekday(day: &str) -> Result<Weekday, DailyError> {
    match day.to_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        other => Err(DailyError::Config(format!(
            "Unknown week day '{other}'. Use mon, tue, wed, thu, fri, sat or sun."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn weekday_names_parse_case_insensitively() {
        assert_eq!(parse_weekday("Mon").expect("weekday"), Weekday::Mon);
        assert_eq!(parse_weekday("friday").expect("weekday"), Weekday::Fri);
        assert!(parse_weekday("noday").is_err());
    }

    #[test]
    fn default_gym_days() {
        let cli = Cli::parse_from(["garmin-daily"]);
        let plan = gym_plan(&cli).expect("plan").expect("enabled by default");
        assert_eq!(
            plan.weekdays,
            vec![Weekday::Mon, Weekday::Tue, Weekday::Fri]
        );
        assert_eq!(plan.duration_minutes, 30);
    }

    #[test]
    fn empty_gym_day_disables_injection() {
        let cli = Cli::parse_from(["garmin-daily", "--gym-day", ""]);
        assert!(gym_plan(&cli).expect("plan").is_none());
    }
}
