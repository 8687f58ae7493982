//! Build schedule calculation
//!
//! Turns a "builds per day" count into a cron expression. The first build of
//! the day always runs at 06:00; the others follow at a fixed interval of
//! `24 / builds_per_day` hours, wrapping past midnight. Hours are emitted in
//! generation order, so four builds a day yield `6,12,18,0`.

use crate::error::ScheduleError;
use serde_yaml::Value;

/// Builds per day when `project.yaml` does not say otherwise
pub const DEFAULT_BUILDS_PER_DAY: u8 = 1;

/// Upper bound accepted for the `schedule` parameter
pub const MAX_BUILDS_PER_DAY: u8 = 4;

const FIRST_BUILD_HOUR: u32 = 6;
const HOURS_PER_DAY: u32 = 24;

/// Validated number of builds per day, in `[1, MAX_BUILDS_PER_DAY]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildsPerDay(u8);

impl BuildsPerDay {
    /// Validate a raw count
    pub fn new(value: i64) -> Result<Self, ScheduleError> {
        match u8::try_from(value) {
            Ok(v) if (1..=MAX_BUILDS_PER_DAY).contains(&v) => Ok(Self(v)),
            _ => Err(ScheduleError::OutOfRange {
                value,
                max: MAX_BUILDS_PER_DAY,
            }),
        }
    }

    /// Validate the `schedule` value read from `project.yaml`
    ///
    /// Only plain integers are accepted. Booleans, floats, strings and null
    /// are rejected even when they look numeric.
    pub fn from_yaml(value: &Value) -> Result<Self, ScheduleError> {
        match value {
            Value::Number(n) if n.is_f64() => Err(ScheduleError::NotAnInteger(n.to_string())),
            Value::Number(n) => match n.as_i64() {
                Some(value) => Self::new(value),
                None => Err(ScheduleError::TooLarge {
                    value: n.to_string(),
                    max: MAX_BUILDS_PER_DAY,
                }),
            },
            other => Err(ScheduleError::NotAnInteger(describe(other))),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Build hours in generation order
    pub fn hours(self) -> Vec<u32> {
        let interval = HOURS_PER_DAY / u32::from(self.0);
        (FIRST_BUILD_HOUR..FIRST_BUILD_HOUR + HOURS_PER_DAY)
            .step_by(interval as usize)
            .map(|hour| hour % HOURS_PER_DAY)
            .collect()
    }

    /// Cron expression of the form `0 H1,...,Hk * * *`
    pub fn cron_expression(self) -> String {
        let hours: Vec<String> = self.hours().iter().map(ToString::to_string).collect();
        format!("0 {} * * *", hours.join(","))
    }
}

impl Default for BuildsPerDay {
    fn default() -> Self {
        Self(DEFAULT_BUILDS_PER_DAY)
    }
}

impl TryFrom<i64> for BuildsPerDay {
    type Error = ScheduleError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Cron expression for a raw builds-per-day count
pub fn cron_schedule(builds_per_day: i64) -> Result<String, ScheduleError> {
    BuildsPerDay::new(builds_per_day).map(BuildsPerDay::cron_expression)
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(_) => "a sequence".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => format!("a value tagged {}", tagged.tag),
    }
}
