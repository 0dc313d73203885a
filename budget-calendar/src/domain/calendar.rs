//! Calendar domain logic for the budget calendar.
//!
//! This module contains the date arithmetic behind the month view: laying a
//! month out as six Sunday-first weeks, attaching expense events to each day,
//! and moving between months. The UI should only handle presentation
//! concerns; every calendar computation happens here.

use chrono::{Datelike, Days, NaiveDate};
use shared::{parse_calendar_date, CalendarMonth, CurrentDateResponse, Event, GridCell};
use tracing::debug;

/// Number of cells in a month view (six weeks of seven days)
pub const GRID_CELLS: usize = 42;

/// Calendar service that handles all calendar-related business logic
#[derive(Debug, Clone, Default)]
pub struct CalendarService;

impl CalendarService {
    /// Create a new CalendarService instance
    pub fn new() -> Self {
        Self
    }

    /// Build the 42-cell grid for the month containing `reference_date`.
    ///
    /// The grid starts on the Sunday on or before the 1st, so it opens with
    /// the tail of the previous month and is padded with the start of the
    /// next month. Only days of the target month carry events and the
    /// `is_today` flag.
    pub fn build_month_grid(
        &self,
        reference_date: NaiveDate,
        today: NaiveDate,
        events: &[Event],
    ) -> CalendarMonth {
        let reference_date = self.clamp_to_grid_range(reference_date);
        let year = reference_date.year();
        let month = reference_date.month();
        let days_in_month = self.days_in_month(year, month);
        let first_day = self.first_day_of_month(year, month);

        debug!(
            "Building calendar grid for {}/{}: {} days, first weekday {}, {} events",
            month,
            year,
            days_in_month,
            first_day,
            events.len()
        );

        let first_of_month = reference_date.with_day(1).unwrap_or(reference_date);
        let grid_start = first_of_month
            .checked_sub_days(Days::new(u64::from(first_day)))
            .unwrap_or(first_of_month);

        let cells: Vec<GridCell> = grid_start
            .iter_days()
            .take(GRID_CELLS)
            .map(|iso_date| {
                let belongs_to_current_month =
                    iso_date.year() == year && iso_date.month() == month;
                let events_on_this_date = if belongs_to_current_month {
                    self.events_on_date(events, iso_date)
                } else {
                    Vec::new()
                };
                GridCell {
                    day_number: iso_date.day(),
                    belongs_to_current_month,
                    iso_date,
                    is_today: belongs_to_current_month && iso_date == today,
                    events_on_this_date,
                }
            })
            .collect();

        CalendarMonth {
            year,
            month,
            month_name: self.month_name(month).to_string(),
            first_day_of_week: first_day,
            cells,
        }
    }

    /// Keep `date` inside the months whose full six-week grid chrono can represent.
    ///
    /// The first month of `NaiveDate::MIN` has no leading days and the last
    /// month of `NaiveDate::MAX` has no trailing ones, so both fall back to
    /// their neighbour.
    pub fn clamp_to_grid_range(&self, date: NaiveDate) -> NaiveDate {
        let earliest = self.shift_month(NaiveDate::MIN, 1);
        let earliest = earliest.with_day(1).unwrap_or(earliest);
        let latest = self.shift_month(NaiveDate::MAX, -1);
        let clamped = date.clamp(earliest, latest);
        if clamped != date {
            debug!("Reference date {} is outside the grid range, using {}", date, clamped);
        }
        clamped
    }

    /// Events shown on a given day, in their original order
    pub fn events_on_date(&self, events: &[Event], date: NaiveDate) -> Vec<Event> {
        events
            .iter()
            .filter(|event| event.occurs_on(date))
            .cloned()
            .collect()
    }

    /// Get the number of days in a given month and year
    pub fn days_in_month(&self, year: i32, month: u32) -> u32 {
        match month {
            2 => {
                if self.is_leap_year(year) {
                    29
                } else {
                    28
                }
            }
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Check if a year is a leap year
    pub fn is_leap_year(&self, year: i32) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Get the first day of month (0 = Sunday, 1 = Monday, etc.)
    pub fn first_day_of_month(&self, year: i32, month: u32) -> u32 {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|date| date.weekday().num_days_from_sunday())
            .unwrap_or(0)
    }

    /// Get the human-readable name for a month number
    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January", 2 => "February", 3 => "March", 4 => "April",
            5 => "May", 6 => "June", 7 => "July", 8 => "August",
            9 => "September", 10 => "October", 11 => "November", 12 => "December",
            _ => "Invalid Month",
        }
    }

    /// Month header such as "June 2024"
    pub fn format_month_header(&self, date: NaiveDate) -> String {
        format!("{} {}", self.month_name(date.month()), date.year())
    }

    /// Format a date for human-readable display
    pub fn format_date_for_display(&self, date: NaiveDate) -> String {
        format!("{} {}, {}", self.month_name(date.month()), date.day(), date.year())
    }

    /// Parse a date coming from a form field or the store
    pub fn parse_event_date(&self, input: &str) -> Option<NaiveDate> {
        parse_calendar_date(input)
    }

    /// The (year, month) before the given one
    pub fn previous_month(&self, year: i32, month: u32) -> (i32, u32) {
        if month == 1 {
            (year - 1, 12)
        } else {
            (year, month - 1)
        }
    }

    /// The (year, month) after the given one
    pub fn next_month(&self, year: i32, month: u32) -> (i32, u32) {
        if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        }
    }

    /// Move `date` by `delta` months.
    ///
    /// The day of month is clamped to the length of the target month, so
    /// January 31st plus one month is the last day of February.
    pub fn shift_month(&self, date: NaiveDate, delta: i32) -> NaiveDate {
        let month_index = date.year() * 12 + date.month0() as i32 + delta;
        let year = month_index.div_euclid(12);
        let month = month_index.rem_euclid(12) as u32 + 1;
        let day = date.day().min(self.days_in_month(year, month));
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
    }

    /// Get current date information
    pub fn current_date(&self, today: NaiveDate) -> CurrentDateResponse {
        CurrentDateResponse {
            month: today.month(),
            year: today.year(),
            day: today.day(),
            formatted_date: self.format_date_for_display(today),
            iso_date: today.format("%Y-%m-%d").to_string(),
        }
    }
}
