//! ISO-week identifiers and the ordering-window calculator.
//!
//! Everything in this module is pure: functions over `(now, config)` with no
//! I/O and no hidden clock, so window behavior can be tested with arbitrary
//! instants. The hot-reloadable wrapper lives in [`crate::gate`].
//!
//! Window semantics: the opening and closing instants are anchored to the
//! Monday-start calendar week containing `now`, both bounds inclusive. A
//! closing weekday that falls earlier in the week than the opening weekday
//! denotes a window that crosses the week boundary (e.g. Friday → Tuesday),
//! in which case the previous week's window may still be open on Monday.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::OrderingWindowConfig;

/// A calendar-week partition key, rendered as `YYYY-Www` (e.g. `2026-W08`).
///
/// Ordering and the string form are both sortable. Derived from a point in
/// time, never stored as an entity of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekId {
    year: i32,
    week: u8,
}

/// Error returned when a week token does not parse as `YYYY-Www`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekIdError(pub String);

impl std::fmt::Display for WeekIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid week identifier: {}", self.0)
    }
}

impl std::error::Error for WeekIdError {}

impl WeekId {
    pub fn new(year: i32, week: u8) -> Result<Self, WeekIdError> {
        if !(1..=53).contains(&week) || !(2000..=9999).contains(&year) {
            return Err(WeekIdError(format!("{year}-W{week:02}")));
        }
        Ok(Self { year, week })
    }

    /// The ISO week containing the given instant, in that instant's timezone.
    pub fn for_datetime<Z: TimeZone>(dt: &DateTime<Z>) -> Self {
        let iso = dt.iso_week();
        Self {
            year: iso.year(),
            week: iso.week() as u8,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u8 {
        self.week
    }
}

impl std::fmt::Display for WeekId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl From<WeekId> for String {
    fn from(id: WeekId) -> Self {
        id.to_string()
    }
}

impl std::str::FromStr for WeekId {
    type Err = WeekIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, week) = s
            .split_once("-W")
            .ok_or_else(|| WeekIdError(s.to_string()))?;
        let year: i32 = year.parse().map_err(|_| WeekIdError(s.to_string()))?;
        let week: u8 = week.parse().map_err(|_| WeekIdError(s.to_string()))?;
        Self::new(year, week).map_err(|_| WeekIdError(s.to_string()))
    }
}

impl TryFrom<String> for WeekId {
    type Error = WeekIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Countdown to the next opening, for the storefront banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningCountdown {
    pub is_open: bool,
    /// Next future opening instant; absent when open or ordering is disabled.
    pub next_opening: Option<DateTime<Utc>>,
    pub remaining_ms: Option<i64>,
}

/// Countdown to the end of the current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingCountdown {
    pub is_open: bool,
    /// Closing instant of the window containing `now`; absent when closed.
    pub closes_at: Option<DateTime<Utc>>,
    pub remaining_ms: Option<i64>,
}

/// The week identifier for `now` evaluated in the configured timezone.
pub fn week_id_at(now: DateTime<Utc>, cfg: &OrderingWindowConfig) -> WeekId {
    WeekId::for_datetime(&now.with_timezone(&cfg.timezone))
}

/// Whether ordering is permitted at `now`. Both window bounds are inclusive.
pub fn is_open_at(now: DateTime<Utc>, cfg: &OrderingWindowConfig) -> bool {
    if !cfg.enabled {
        return false;
    }
    let local = now.with_timezone(&cfg.timezone);
    let monday = week_monday(local.date_naive());
    if let Some((open, close)) = window_bounds(monday, cfg) {
        if open <= now && now <= close {
            return true;
        }
    }
    // A window wrapping past the week boundary can still be open early in
    // the following week.
    match window_bounds(monday - Duration::days(7), cfg) {
        Some((open, close)) => open <= now && now <= close,
        None => false,
    }
}

/// Countdown to the next opening instant.
///
/// When the current week's opening has already passed (the window closed
/// earlier this week), the result advances by exactly one week.
pub fn opening_countdown_at(now: DateTime<Utc>, cfg: &OrderingWindowConfig) -> OpeningCountdown {
    if is_open_at(now, cfg) {
        return OpeningCountdown {
            is_open: true,
            next_opening: None,
            remaining_ms: None,
        };
    }
    if !cfg.enabled {
        return OpeningCountdown {
            is_open: false,
            next_opening: None,
            remaining_ms: None,
        };
    }
    let local = now.with_timezone(&cfg.timezone);
    let monday = week_monday(local.date_naive());
    let next = [monday, monday + Duration::days(7)]
        .into_iter()
        .filter_map(|wk| window_bounds(wk, cfg))
        .map(|(open, _)| open)
        .find(|open| *open > now);
    OpeningCountdown {
        is_open: false,
        remaining_ms: next.map(|open| (open - now).num_milliseconds()),
        next_opening: next,
    }
}

/// Countdown to the closing of the window containing `now`.
pub fn closing_countdown_at(now: DateTime<Utc>, cfg: &OrderingWindowConfig) -> ClosingCountdown {
    if !is_open_at(now, cfg) {
        return ClosingCountdown {
            is_open: false,
            closes_at: None,
            remaining_ms: None,
        };
    }
    let local = now.with_timezone(&cfg.timezone);
    let monday = week_monday(local.date_naive());
    let close = [monday, monday - Duration::days(7)]
        .into_iter()
        .filter_map(|wk| window_bounds(wk, cfg))
        .filter(|(open, close)| *open <= now && now <= *close)
        .map(|(_, close)| close)
        .next();
    ClosingCountdown {
        is_open: true,
        remaining_ms: close.map(|c| (c - now).num_milliseconds()),
        closes_at: close,
    }
}

/// The Monday of the calendar week containing `date`.
fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Opening and closing instants for the window anchored at `monday`, in UTC.
///
/// Returns `None` only when the anchor date falls outside chrono's
/// representable range.
fn window_bounds(monday: NaiveDate, cfg: &OrderingWindowConfig) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let open_off = i64::from(cfg.opening_day.num_days_from_monday());
    let mut close_off = i64::from(cfg.closing_day.num_days_from_monday());
    if close_off < open_off {
        close_off += 7;
    }
    let open = local_instant(
        cfg.timezone,
        monday.checked_add_signed(Duration::days(open_off))?,
        cfg.opening_hour,
        cfg.opening_minute,
    );
    let close = local_instant(
        cfg.timezone,
        monday.checked_add_signed(Duration::days(close_off))?,
        cfg.closing_hour,
        cfg.closing_minute,
    );
    Some((open.with_timezone(&Utc), close.with_timezone(&Utc)))
}

/// Resolves a wall-clock time in `tz`, handling DST folds and gaps.
///
/// Ambiguous times take the earlier offset; times skipped by a forward
/// transition are shifted one hour later.
fn local_instant(tz: Tz, date: NaiveDate, hour: u8, minute: u8) -> DateTime<Tz> {
    let time = NaiveTime::from_hms_opt(u32::from(hour.min(23)), u32::from(minute.min(59)), 0)
        .unwrap_or(NaiveTime::MIN);
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earlier, _) => earlier,
        LocalResult::None => match tz.from_local_datetime(&(naive + Duration::hours(1))) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earlier, _) => earlier,
            LocalResult::None => tz.from_utc_datetime(&naive),
        },
    }
}
