//! Ride context: time-of-day bands, congestion, demand and surge.
//!
//! Everything here is a pure function of (hour, weekday, holiday). The rules are
//! fixed tables rather than learned values so the same timestamp always yields
//! the same fare inputs.
//!
//! Weekday indices follow `chrono`: 0 = Monday .. 6 = Sunday.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::geo::round2;

pub const MIN_DEMAND_FACTOR: f64 = 0.7;
pub const MAX_DEMAND_FACTOR: f64 = 2.0;

const PEAK_DEMAND_BONUS: f64 = 0.3;
const NIGHT_DEMAND_PENALTY: f64 = 0.2;
const WEEKEND_DEMAND_BONUS: f64 = 0.15;
const HOLIDAY_DEMAND_BONUS: f64 = 0.25;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Coarse part of the day used as a categorical model input.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Three-level traffic estimate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CongestionLevel {
    Low,
    Medium,
    High,
}

impl CongestionLevel {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Additive surge surcharge for this level.
    pub fn surge_surcharge(&self) -> f64 {
        match self {
            CongestionLevel::High => 0.2,
            CongestionLevel::Medium => 0.1,
            CongestionLevel::Low => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Band rules
// ---------------------------------------------------------------------------

/// Morning [5,12), afternoon [12,17), evening [17,21), night otherwise.
pub fn time_of_day(hour: u32) -> TimeOfDay {
    match hour {
        5..=11 => TimeOfDay::Morning,
        12..=16 => TimeOfDay::Afternoon,
        17..=20 => TimeOfDay::Evening,
        _ => TimeOfDay::Night,
    }
}

fn is_weekend(weekday: u32) -> bool {
    weekday >= 5
}

/// Morning {8,9,10} and evening {17..=20} rush hours.
fn is_peak_hour(hour: u32) -> bool {
    matches!(hour, 8..=10 | 17..=20)
}

fn is_night_hour(hour: u32) -> bool {
    hour >= 22 || hour <= 6
}

/// Congestion from hour and weekday.
///
/// The rush-hour and shoulder bands only apply Monday to Friday; every weekend
/// hour is [`CongestionLevel::Low`].
pub fn congestion_level(hour: u32, weekday: u32) -> CongestionLevel {
    if is_weekend(weekday) {
        return CongestionLevel::Low;
    }
    if is_peak_hour(hour) {
        CongestionLevel::High
    } else if matches!(hour, 6..=8 | 10..=17 | 20..=22) {
        CongestionLevel::Medium
    } else {
        CongestionLevel::Low
    }
}

/// Demand factor in `[0.7, 2.0]`, rounded to two decimals.
///
/// The adjustments are independent checks and stack: a holiday weekend night
/// takes the night penalty and both bonuses.
pub fn demand_factor(hour: u32, weekday: u32, is_holiday: bool) -> f64 {
    let mut demand = 1.0;
    if is_peak_hour(hour) {
        demand += PEAK_DEMAND_BONUS;
    }
    if is_night_hour(hour) {
        demand -= NIGHT_DEMAND_PENALTY;
    }
    if is_weekend(weekday) {
        demand += WEEKEND_DEMAND_BONUS;
    }
    if is_holiday {
        demand += HOLIDAY_DEMAND_BONUS;
    }
    round2(demand.clamp(MIN_DEMAND_FACTOR, MAX_DEMAND_FACTOR))
}

/// Step function of demand plus an additive congestion surcharge.
pub fn surge_multiplier(demand_factor: f64, congestion: CongestionLevel) -> f64 {
    let base = if demand_factor > 1.4 {
        1.5
    } else if demand_factor > 1.2 {
        1.3
    } else if demand_factor > 1.0 {
        1.1
    } else {
        1.0
    };
    round2(base + congestion.surge_surcharge())
}

// ---------------------------------------------------------------------------
// Holidays
// ---------------------------------------------------------------------------

/// Dates treated as public holidays. Empty unless configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Bundled context
// ---------------------------------------------------------------------------

/// All time-derived signals for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RideContext {
    pub hour: u32,
    pub weekday: u32,
    pub is_holiday: bool,
    pub time_of_day: TimeOfDay,
    pub congestion: CongestionLevel,
    pub demand_factor: f64,
    pub surge_multiplier: f64,
}

impl RideContext {
    pub fn derive(hour: u32, weekday: u32, is_holiday: bool) -> Self {
        let congestion = congestion_level(hour, weekday);
        let demand_factor = demand_factor(hour, weekday, is_holiday);
        Self {
            hour,
            weekday,
            is_holiday,
            time_of_day: time_of_day(hour),
            congestion,
            demand_factor,
            surge_multiplier: surge_multiplier(demand_factor, congestion),
        }
    }

    /// Context for a wall-clock timestamp.
    pub fn at(timestamp: NaiveDateTime, holidays: &HolidayCalendar) -> Self {
        Self::derive(
            timestamp.hour(),
            timestamp.weekday().num_days_from_monday(),
            holidays.is_holiday(timestamp.date()),
        )
    }
}
