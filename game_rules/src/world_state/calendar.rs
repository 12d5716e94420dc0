//! Day / season / year calendar.
//!
//! A season is four seven-day weeks; a year is four seasons. Days are
//! 1-based, seasons are 0-based indices into the world's season list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mechanics::{DAYS_PER_SEASON, DAYS_PER_WEEK, DAYS_PER_YEAR, SEASONS_PER_YEAR};

/// A calendar date. Orders lexicographically by (year, season, day).
///
/// Serialized as `[day, season, year]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "DateTriple", into = "DateTriple")]
pub struct GameDate {
    pub year: i32,
    pub season: u32,
    pub day: u32,
}

#[derive(Serialize, Deserialize)]
struct DateTriple(u32, u32, i32);

impl From<DateTriple> for GameDate {
    fn from(DateTriple(day, season, year): DateTriple) -> Self {
        Self { year, season, day }
    }
}

impl From<GameDate> for DateTriple {
    fn from(date: GameDate) -> Self {
        DateTriple(date.day, date.season, date.year)
    }
}

impl GameDate {
    pub fn new(day: u32, season: u32, year: i32) -> Self {
        Self { year, season, day }
    }

    /// Days since an arbitrary fixed origin; differences are meaningful.
    pub fn ordinal(&self) -> i64 {
        i64::from(self.year) * i64::from(DAYS_PER_YEAR)
            + i64::from(self.season) * i64::from(DAYS_PER_SEASON)
            + i64::from(self.day)
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.day, self.season, self.year)
    }
}

/// Which boundaries a single day advance crossed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBoundary {
    pub week_end: bool,
    pub season_end: bool,
    /// Index of the season that just ended, when `season_end` is set.
    pub ended_season: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub day: u32,
    pub season: u32,
    pub year: i32,
    /// Days advanced since the session began, across lives.
    pub turn: u64,
    pub start: GameDate,
}

impl Calendar {
    pub fn new(year: i32) -> Self {
        Self::starting_at(GameDate::new(1, 0, year))
    }

    pub fn starting_at(start: GameDate) -> Self {
        Self {
            day: start.day,
            season: start.season,
            year: start.year,
            turn: 0,
            start,
        }
    }

    pub fn today(&self) -> GameDate {
        GameDate::new(self.day, self.season, self.year)
    }

    pub fn advance_day(&mut self) -> DayBoundary {
        self.day += 1;
        self.turn += 1;

        let mut boundary = DayBoundary::default();
        if self.day > DAYS_PER_SEASON {
            boundary.season_end = true;
            boundary.ended_season = Some(self.season);
            self.day = 1;
            self.roll_season();
        }
        boundary.week_end = (self.day - 1) % DAYS_PER_WEEK == 0;
        boundary
    }

    /// Skips the rest of the current season and lands on its successor's
    /// first day.
    pub fn advance_to_next_season(&mut self) {
        self.day = 1;
        self.roll_season();
    }

    fn roll_season(&mut self) {
        self.season = (self.season + 1) % SEASONS_PER_YEAR;
        if self.season == 0 {
            self.year += 1;
        }
    }

    /// 1-based week within the current season.
    pub fn week_in_season(&self) -> u32 {
        (self.day.saturating_sub(1)) / DAYS_PER_WEEK + 1
    }

    pub fn elapsed_days(&self) -> i64 {
        self.today().ordinal() - self.start.ordinal()
    }

    /// e.g. `Day 5, Spring, Year 2`. Falls back to `Season N` when the
    /// season has no name.
    pub fn date_display(&self, season_name: Option<&str>) -> String {
        match season_name {
            Some(name) => format!("Day {}, {}, Year {}", self.day, name, self.year),
            None => format!(
                "Day {}, Season {}, Year {}",
                self.day,
                self.season + 1,
                self.year
            ),
        }
    }

    /// Compact elapsed time, e.g. `1y 2s 3d` or `5d`.
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed_days().max(0);
        let years = elapsed / i64::from(DAYS_PER_YEAR);
        let rest = elapsed % i64::from(DAYS_PER_YEAR);
        let seasons = rest / i64::from(DAYS_PER_SEASON);
        let days = rest % i64::from(DAYS_PER_SEASON);

        let mut parts = Vec::new();
        if years > 0 {
            parts.push(format!("{}y", years));
        }
        if seasons > 0 {
            parts.push(format!("{}s", seasons));
        }
        parts.push(format!("{}d", days));
        parts.join(" ")
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(1)
    }
}
