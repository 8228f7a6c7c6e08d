//! Default UTC session calendar.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use tickflow_core::traits::{PeriodBounds, SessionCalendar};
use tickflow_core::types::Timeframe;

/// Calendar with UTC calendar-day periods, Monday-start weeks, and calendar
/// months.
///
/// Weekday sessions only. The monthly period of a timestamp is keyed by the
/// month its week starts in, so weekly bars always nest whole into monthly
/// bars and the combine law holds across all three timeframes. Exchanges
/// with different cutover rules supply their own `SessionCalendar`.
#[derive(Debug, Clone)]
pub struct UtcSessionCalendar {
    session_open: NaiveTime,
    session_close: NaiveTime,
    entry_window_open: NaiveTime,
}

impl UtcSessionCalendar {
    /// Create a calendar with explicit session hours and entry window.
    pub fn new(session_open: NaiveTime, session_close: NaiveTime, entry_window_open: NaiveTime) -> Self {
        Self {
            session_open,
            session_close,
            entry_window_open,
        }
    }

    /// Round-the-clock weekday sessions with entries allowed at any time.
    pub fn all_day() -> Self {
        Self {
            session_open: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            session_close: NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
            entry_window_open: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        }
    }

    fn date_of(ts_millis: i64) -> NaiveDate {
        DateTime::from_timestamp_millis(ts_millis)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
            .date_naive()
    }

    fn day_start_millis(date: NaiveDate) -> i64 {
        Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
            .timestamp_millis()
    }

    fn week_start(date: NaiveDate) -> NaiveDate {
        date - Duration::days(date.weekday().num_days_from_monday() as i64)
    }

    fn month_start(date: NaiveDate) -> NaiveDate {
        NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
    }

    fn next_month_start(date: NaiveDate) -> NaiveDate {
        if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap()
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1).unwrap()
        }
    }
}

impl SessionCalendar for UtcSessionCalendar {
    fn period_bounds(&self, timeframe: Timeframe, ts_millis: i64) -> PeriodBounds {
        let date = Self::date_of(ts_millis);
        match timeframe {
            Timeframe::Daily => {
                let start = Self::day_start_millis(date);
                PeriodBounds {
                    start,
                    end: Self::day_start_millis(date + Duration::days(1)),
                }
            }
            Timeframe::Weekly => {
                let start = Self::week_start(date);
                PeriodBounds {
                    start: Self::day_start_millis(start),
                    end: Self::day_start_millis(start + Duration::days(7)),
                }
            }
            Timeframe::Monthly => {
                // Keyed by the month the containing week starts in, so a week
                // straddling a month boundary stays whole. The period spans
                // the weeks whose Monday falls inside that month.
                let week_start = Self::week_start(date);
                let month_start = Self::month_start(week_start);
                let next = Self::next_month_start(week_start);

                let mut start = Self::week_start(month_start);
                if start < month_start {
                    start = start + Duration::days(7);
                }
                let mut end = Self::week_start(next);
                if end < next {
                    end = end + Duration::days(7);
                }
                PeriodBounds {
                    start: Self::day_start_millis(start),
                    end: Self::day_start_millis(end),
                }
            }
        }
    }

    fn in_session(&self, now: DateTime<Utc>) -> bool {
        let weekday = now.weekday();
        if weekday == Weekday::Sat || weekday == Weekday::Sun {
            return false;
        }
        let time = now.time();
        time >= self.session_open && time <= self.session_close
    }

    fn in_entry_window(&self, now: DateTime<Utc>) -> bool {
        self.in_session(now) && now.time() >= self.entry_window_open
    }
}
