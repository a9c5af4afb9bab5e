//! Pure time-grid math for the day calendar: mapping wall-clock times to
//! percentage offsets on a vertical axis, splitting working windows around
//! breaks, and deciding whether a time is schedulable for a professional.
//!
//! Everything here works in minutes since midnight; the service layer
//! converts to and from `chrono` types and `HH:MM` strings at the edges.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};

use crate::models::{Absence, WorkSchedule};

/// Window applied when a professional has no configured schedule at all.
/// Keeps the calendar usable before setup instead of blocking scheduling.
pub const DEFAULT_DAY_START_MINUTES: i32 = 8 * 60;
pub const DEFAULT_DAY_END_MINUTES: i32 = 18 * 60;

/// Half-open `[start, end)` interval in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSegment {
    pub start: i32,
    pub end: i32,
}

impl TimeSegment {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> i32 {
        (self.end - self.start).max(0)
    }

    pub fn contains(&self, minutes: i32) -> bool {
        minutes >= self.start && minutes < self.end
    }
}

/// Parses `HH:MM` or `HH:MM:SS` into minutes since midnight, truncating
/// seconds. Returns `None` for anything that is not a 24h clock time.
pub fn time_to_minutes(time: &str) -> Option<i32> {
    let mut parts = time.split(':');
    let hours: i32 = parts.next()?.trim().parse().ok()?;
    let minutes: i32 = parts.next()?.trim().parse().ok()?;
    // A third component (seconds) is allowed and ignored; more is not.
    if let Some(seconds) = parts.next() {
        let _: i32 = seconds.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
    }
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Inverse of [`time_to_minutes`], normalized onto the 24h clock.
pub fn minutes_to_time(minutes: i32) -> String {
    let wrapped = minutes.rem_euclid(24 * 60);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

pub fn minutes_of(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}

/// Day of week with the datastore's convention: 0 = Sunday .. 6 = Saturday.
pub fn day_of_week(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Union envelope of all active working windows for a weekday, in minutes.
/// Falls back to the default window when no user is configured for it.
pub fn calendar_time_range(schedules: &[WorkSchedule], day_of_week: i32) -> (i32, i32) {
    let mut start: Option<i32> = None;
    let mut end: Option<i32> = None;

    for schedule in schedules {
        if !schedule.is_active || schedule.day_of_week != day_of_week {
            continue;
        }
        let s = minutes_of(schedule.start_time);
        let e = minutes_of(schedule.end_time);
        start = Some(start.map_or(s, |cur| cur.min(s)));
        end = Some(end.map_or(e, |cur| cur.max(e)));
    }

    match (start, end) {
        (Some(s), Some(e)) if e > s => (s, e),
        _ => (DEFAULT_DAY_START_MINUTES, DEFAULT_DAY_END_MINUTES),
    }
}

/// Maps a time to its vertical offset as a percentage of the window,
/// clamped to `[0, 100]`. A degenerate window (`end <= start`) falls back
/// to the default window so the division is always well defined.
pub fn position_for_time(minutes: i32, window_start: i32, window_end: i32) -> f64 {
    let (start, end) = if window_end > window_start {
        (window_start, window_end)
    } else {
        (DEFAULT_DAY_START_MINUTES, DEFAULT_DAY_END_MINUTES)
    };

    let percent = (minutes - start) as f64 / (end - start) as f64 * 100.0;
    percent.clamp(0.0, 100.0)
}

/// Height of a block as a percentage of the rendered window.
pub fn height_for_duration(duration_minutes: i32, window_minutes: i32) -> f64 {
    if window_minutes <= 0 {
        return 0.0;
    }
    duration_minutes as f64 / window_minutes as f64 * 100.0
}

/// Inverse of the position mapping: converts a pixel offset inside the
/// grid container back to a time, rounded to the nearest `interval_minutes`
/// (15/30/60) and clamped into the window.
pub fn time_from_position(
    pixel_y: f64,
    container_height: f64,
    window_start: i32,
    window_end: i32,
    interval_minutes: i32,
) -> i32 {
    let (start, end) = if window_end > window_start {
        (window_start, window_end)
    } else {
        (DEFAULT_DAY_START_MINUTES, DEFAULT_DAY_END_MINUTES)
    };

    if container_height <= 0.0 {
        return start;
    }

    let ratio = (pixel_y / container_height).clamp(0.0, 1.0);
    let raw = start as f64 + ratio * (end - start) as f64;

    let interval = interval_minutes.max(1) as f64;
    let snapped = (raw / interval).round() as i32 * interval as i32;

    snapped.clamp(start, end)
}

/// Splits working intervals around active breaks. Breaks are sorted by
/// start time first; a resulting segment is only kept if it can hold at
/// least one slot of `slot_interval` minutes. Emitted segments never
/// overlap a break.
pub fn fragment_working_hours_around_breaks(
    working: &[TimeSegment],
    breaks: &[TimeSegment],
    slot_interval: i32,
) -> Vec<TimeSegment> {
    let mut sorted_breaks: Vec<TimeSegment> = breaks
        .iter()
        .copied()
        .filter(|b| b.end > b.start)
        .collect();
    sorted_breaks.sort_by_key(|b| b.start);

    let min_len = slot_interval.max(1);
    let mut segments = Vec::new();

    for interval in working {
        let mut cursor = interval.start;

        for brk in &sorted_breaks {
            if brk.end <= cursor || brk.start >= interval.end {
                continue;
            }
            if brk.start - cursor >= min_len {
                segments.push(TimeSegment::new(cursor, brk.start));
            }
            cursor = cursor.max(brk.end);
        }

        if interval.end - cursor >= min_len {
            segments.push(TimeSegment::new(cursor, interval.end));
        }
    }

    segments
}

/// Whether `time` on `date` can take an appointment for the professional
/// whose schedules and absences are given.
///
/// False on an absence/vacation date, inside an active break, or outside
/// every working interval. A professional with zero configured schedules
/// gets the default window instead of being blocked entirely.
pub fn is_schedulable(
    schedules: &[WorkSchedule],
    absences: &[Absence],
    date: NaiveDate,
    time: NaiveTime,
) -> bool {
    if absences
        .iter()
        .any(|a| a.start_date <= date && date <= a.end_date)
    {
        return false;
    }

    let dow = day_of_week(date);
    let minutes = minutes_of(time);

    if schedules.is_empty() {
        return minutes >= DEFAULT_DAY_START_MINUTES && minutes < DEFAULT_DAY_END_MINUTES;
    }

    let mut any_active_for_day = false;

    for schedule in schedules {
        if !schedule.is_active || schedule.day_of_week != dow {
            continue;
        }
        any_active_for_day = true;

        let window = TimeSegment::new(minutes_of(schedule.start_time), minutes_of(schedule.end_time));
        if !window.contains(minutes) {
            continue;
        }

        let in_break = schedule.breaks.iter().any(|b| {
            b.is_active
                && TimeSegment::new(minutes_of(b.start_time), minutes_of(b.end_time))
                    .contains(minutes)
        });

        if !in_break {
            return true;
        }
    }

    // Schedules exist but none for this weekday: treat as unconfigured day.
    if !any_active_for_day {
        return minutes >= DEFAULT_DAY_START_MINUTES && minutes < DEFAULT_DAY_END_MINUTES;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::BreakInterval;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn schedule(day: i32, start: NaiveTime, end: NaiveTime, breaks: Vec<BreakInterval>) -> WorkSchedule {
        WorkSchedule {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            day_of_week: day,
            start_time: start,
            end_time: end,
            is_active: true,
            breaks,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn parses_times_with_and_without_seconds() {
        assert_eq!(time_to_minutes("08:30"), Some(510));
        assert_eq!(time_to_minutes("08:30:45"), Some(510));
        assert_eq!(time_to_minutes("00:00"), Some(0));
        assert_eq!(time_to_minutes("23:59"), Some(1439));
        assert_eq!(time_to_minutes("24:00"), None);
        assert_eq!(time_to_minutes("12:60"), None);
        assert_eq!(time_to_minutes("nonsense"), None);
        assert_eq!(time_to_minutes("10:15:30:45"), None);
    }

    #[test]
    fn minutes_to_time_round_trips_well_formed_times() {
        for minutes in 0..24 * 60 {
            let text = minutes_to_time(minutes);
            assert_eq!(time_to_minutes(&text), Some(minutes));
        }
    }

    #[test]
    fn minutes_to_time_wraps_onto_24h_clock() {
        assert_eq!(minutes_to_time(24 * 60 + 30), "00:30");
        assert_eq!(minutes_to_time(-30), "23:30");
    }

    #[test]
    fn position_is_monotonic_and_bounded() {
        let start = time_to_minutes("09:00").unwrap();
        let end = time_to_minutes("17:00").unwrap();

        let mut previous = -1.0;
        for minutes in start..=end {
            let percent = position_for_time(minutes, start, end);
            assert!(percent >= 0.0 && percent <= 100.0);
            assert!(percent >= previous);
            previous = percent;
        }

        assert_eq!(position_for_time(start, start, end), 0.0);
        assert_eq!(position_for_time(end, start, end), 100.0);
    }

    #[test]
    fn position_clamps_outside_the_window() {
        let start = time_to_minutes("09:00").unwrap();
        let end = time_to_minutes("17:00").unwrap();
        assert_eq!(position_for_time(start - 120, start, end), 0.0);
        assert_eq!(position_for_time(end + 120, start, end), 100.0);
    }

    #[test]
    fn degenerate_window_falls_back_to_default() {
        // end == start must not divide by zero
        let percent = position_for_time(time_to_minutes("13:00").unwrap(), 600, 600);
        let expected = position_for_time(
            time_to_minutes("13:00").unwrap(),
            DEFAULT_DAY_START_MINUTES,
            DEFAULT_DAY_END_MINUTES,
        );
        assert_eq!(percent, expected);
    }

    #[test]
    fn height_maps_duration_to_percent() {
        assert_eq!(height_for_duration(60, 600), 10.0);
        assert_eq!(height_for_duration(0, 600), 0.0);
        assert_eq!(height_for_duration(30, 0), 0.0);
    }

    #[test]
    fn time_from_position_inverts_and_snaps() {
        let start = time_to_minutes("08:00").unwrap();
        let end = time_to_minutes("18:00").unwrap();

        // Middle of a 600px container on a 10h window = 13:00
        assert_eq!(time_from_position(300.0, 600.0, start, end, 15), time_to_minutes("13:00").unwrap());

        // Slightly off positions snap to the nearest interval
        let snapped = time_from_position(307.0, 600.0, start, end, 30);
        assert_eq!(snapped % 30, 0);

        // Degenerate container height falls back to window start
        assert_eq!(time_from_position(100.0, 0.0, start, end, 15), start);

        // Positions past the container clamp to the window end
        assert_eq!(time_from_position(900.0, 600.0, start, end, 15), end);
    }

    #[test]
    fn fragmentation_never_overlaps_breaks_and_covers_the_rest() {
        let working = [TimeSegment::new(540, 1020)]; // 09:00-17:00
        let breaks = [
            TimeSegment::new(780, 840), // 13:00-14:00
            TimeSegment::new(660, 675), // 11:00-11:15 (out of order on purpose)
        ];

        let segments = fragment_working_hours_around_breaks(&working, &breaks, 15);

        assert_eq!(
            segments,
            vec![
                TimeSegment::new(540, 660),
                TimeSegment::new(675, 780),
                TimeSegment::new(840, 1020),
            ]
        );

        for segment in &segments {
            for brk in &breaks {
                assert!(segment.end <= brk.start || segment.start >= brk.end);
            }
        }

        // Segments plus breaks reconstruct the full working interval
        let covered: i32 = segments.iter().map(|s| s.len()).sum::<i32>()
            + breaks.iter().map(|b| b.len()).sum::<i32>();
        assert_eq!(covered, working[0].len());
    }

    #[test]
    fn fragmentation_drops_sub_interval_remainders() {
        let working = [TimeSegment::new(540, 600)]; // 09:00-10:00
        let breaks = [TimeSegment::new(550, 595)]; // leaves 10 + 5 minutes

        let segments = fragment_working_hours_around_breaks(&working, &breaks, 15);
        assert!(segments.is_empty());
    }

    #[test]
    fn fragmentation_handles_breaks_straddling_the_window() {
        let working = [TimeSegment::new(540, 720)]; // 09:00-12:00
        let breaks = [TimeSegment::new(480, 570)]; // starts before the window

        let segments = fragment_working_hours_around_breaks(&working, &breaks, 15);
        assert_eq!(segments, vec![TimeSegment::new(570, 720)]);
    }

    #[test]
    fn zero_schedules_get_the_default_window() {
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        assert!(is_schedulable(&[], &[], monday, t(8, 0)));
        assert!(is_schedulable(&[], &[], monday, t(12, 30)));
        assert!(is_schedulable(&[], &[], monday, t(17, 59)));
        assert!(!is_schedulable(&[], &[], monday, t(18, 0)));
        assert!(!is_schedulable(&[], &[], monday, t(7, 59)));
    }

    #[test]
    fn breaks_block_scheduling() {
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let schedules = [schedule(
            1,
            t(9, 0),
            t(17, 0),
            vec![BreakInterval {
                name: "Lunch".to_string(),
                start_time: t(13, 0),
                end_time: t(14, 0),
                is_active: true,
            }],
        )];

        assert!(is_schedulable(&schedules, &[], monday, t(10, 0)));
        assert!(!is_schedulable(&schedules, &[], monday, t(13, 30)));
        assert!(is_schedulable(&schedules, &[], monday, t(14, 0)));
        assert!(!is_schedulable(&schedules, &[], monday, t(8, 30)));
        assert!(!is_schedulable(&schedules, &[], monday, t(17, 0)));
    }

    #[test]
    fn inactive_breaks_do_not_block() {
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let schedules = [schedule(
            1,
            t(9, 0),
            t(17, 0),
            vec![BreakInterval {
                name: "Suspended".to_string(),
                start_time: t(13, 0),
                end_time: t(14, 0),
                is_active: false,
            }],
        )];

        assert!(is_schedulable(&schedules, &[], monday, t(13, 30)));
    }

    #[test]
    fn absences_block_the_whole_day() {
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let absences = [Absence {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            reason: Some("Vacation".to_string()),
            created_at: Utc::now(),
        }];

        assert!(!is_schedulable(&[], &absences, monday, t(10, 0)));

        let after = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert!(is_schedulable(&[], &absences, after, t(10, 0)));
    }

    #[test]
    fn day_without_schedule_rows_uses_default_window() {
        // Schedules exist for Monday only; a Wednesday request falls back.
        let schedules = [schedule(1, t(9, 0), t(17, 0), vec![])];
        let wednesday = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();

        assert!(is_schedulable(&schedules, &[], wednesday, t(9, 0)));
        assert!(!is_schedulable(&schedules, &[], wednesday, t(19, 0)));
    }

    #[test]
    fn envelope_unions_active_windows_only() {
        let mut early = schedule(1, t(8, 30), t(14, 0), vec![]);
        let late = schedule(1, t(10, 0), t(19, 0), vec![]);
        let other_day = schedule(3, t(7, 0), t(20, 0), vec![]);
        let mut inactive = schedule(1, t(6, 0), t(22, 0), vec![]);
        inactive.is_active = false;
        early.is_active = true;

        let (start, end) = calendar_time_range(&[early, late, other_day, inactive], 1);
        assert_eq!(minutes_to_time(start), "08:30");
        assert_eq!(minutes_to_time(end), "19:00");

        let (ds, de) = calendar_time_range(&[], 1);
        assert_eq!((ds, de), (DEFAULT_DAY_START_MINUTES, DEFAULT_DAY_END_MINUTES));
    }
}
