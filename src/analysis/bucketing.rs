use crate::models::grid::{ContributionGrid, DAYS, WEEKS};
use crate::models::submission::SubmissionRecord;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc};

/// Calendar offset used for every date computation (UTC+05:30).
pub const ANCHOR_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

fn anchor_offset() -> FixedOffset {
    // 19800 seconds is always within chrono's +-24h bound.
    FixedOffset::east_opt(ANCHOR_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// "Today" in the anchor calendar.
pub fn anchor_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&anchor_offset()).date_naive()
}

/// Anchor-calendar date of a Unix timestamp, `None` if the timestamp is out of chrono's range.
pub fn submission_date(creation_time_seconds: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(creation_time_seconds, 0)
        .map(|utc| utc.with_timezone(&anchor_offset()).date_naive())
}

/// First and last day covered by the grid for a given `today`.
///
/// Weeks start on Sunday: the ISO weekday (Mon=1..Sun=7) modulo 7 gives the offset back to the
/// start of the current week, so Sunday maps to 0.
pub fn window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = i64::from(today.weekday().number_from_monday() % 7);
    let start_of_current_week = today - Duration::days(offset);
    let start_date = start_of_current_week - Duration::weeks((WEEKS - 1) as i64);
    (start_date, today)
}

/// `(day, week)` cell for `date`, or `None` when it falls outside the window.
pub fn cell_for(date: NaiveDate, today: NaiveDate) -> Option<(usize, usize)> {
    let (start_date, end_date) = window(today);
    if date < start_date || date > end_date {
        return None;
    }

    let days_diff = (date - start_date).num_days();
    let week = (days_diff / 7) as usize;
    let day = (days_diff % 7) as usize;

    (week < WEEKS && day < DAYS).then_some((day, week))
}

/// Count accepted submissions per day over the 25-week window ending on `today`.
pub fn bucket(submissions: &[SubmissionRecord], today: NaiveDate) -> ContributionGrid {
    let mut grid = ContributionGrid::empty();

    for submission in submissions {
        if !submission.is_accepted() {
            continue;
        }
        let Some(date) = submission.creation_time_seconds.and_then(submission_date) else {
            continue;
        };
        if let Some((day, week)) = cell_for(date, today) {
            grid.increment(day, week);
        }
    }

    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Epoch seconds for noon on `day` in the anchor calendar.
    fn noon(day: NaiveDate) -> i64 {
        anchor_offset()
            .from_local_datetime(&day.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()))
            .unwrap()
            .timestamp()
    }

    fn accepted(day: NaiveDate) -> SubmissionRecord {
        SubmissionRecord::new(Some("OK"), noon(day))
    }

    #[test]
    fn window_starts_on_sunday_twenty_four_weeks_back() {
        // 2024-06-12 is a Wednesday.
        let today = date(2024, 6, 12);
        let (start, end) = window(today);
        assert_eq!(start.weekday(), Weekday::Sun);
        assert_eq!(start, date(2024, 6, 9) - Duration::weeks(24));
        assert_eq!(end, today);

        // A Sunday is its own week start.
        let sunday = date(2024, 6, 9);
        assert_eq!(window(sunday).0, sunday - Duration::weeks(24));
    }

    #[test]
    fn empty_input_gives_zero_grid() {
        let grid = bucket(&[], date(2024, 6, 12));
        assert!(grid.is_empty());
        assert_eq!(grid.rows().len(), DAYS);
        assert!(grid.rows().iter().all(|row| row.len() == WEEKS));
    }

    #[test]
    fn start_date_and_today_hit_the_corners_of_the_window() {
        let today = date(2024, 6, 12);
        let (start, _) = window(today);

        let grid = bucket(&[accepted(start), accepted(today)], today);
        assert_eq!(grid.get(0, 0), 1);
        // Wednesday is day index 3 in a Sunday-first week.
        assert_eq!(grid.get(3, WEEKS - 1), 1);
        assert_eq!(grid.total(), 2);
    }

    #[test]
    fn dates_outside_the_window_are_dropped() {
        let today = date(2024, 6, 12);
        let (start, _) = window(today);

        let grid = bucket(
            &[
                accepted(start - Duration::days(1)),
                accepted(today + Duration::days(1)),
            ],
            today,
        );
        assert!(grid.is_empty());
    }

    #[test]
    fn only_accepted_verdicts_count() {
        let today = date(2024, 6, 12);
        let submissions = vec![
            SubmissionRecord::new(Some("WRONG_ANSWER"), noon(today)),
            SubmissionRecord::new(None, noon(today)),
            SubmissionRecord {
                verdict: Some("OK".to_string()),
                creation_time_seconds: None,
            },
            accepted(today),
        ];

        let grid = bucket(&submissions, today);
        assert_eq!(grid.total(), 1);
    }

    #[test]
    fn same_day_submissions_accumulate_without_dedup() {
        let today = date(2024, 6, 12);
        let same = accepted(today);
        let grid = bucket(&[same.clone(), same.clone(), same], today);
        assert_eq!(grid.get(3, WEEKS - 1), 3);
    }

    #[test]
    fn bucketing_is_idempotent() {
        let today = date(2024, 6, 12);
        let submissions: Vec<_> = (0..60)
            .map(|i| accepted(today - Duration::days(i * 3)))
            .collect();
        assert_eq!(bucket(&submissions, today), bucket(&submissions, today));
    }

    #[test]
    fn ten_days_back_from_a_saturday() {
        // 2024-06-15 is a Saturday, so today sits at (6, 24).
        let today = date(2024, 6, 15);
        let grid = bucket(&[accepted(today - Duration::days(10))], today);

        assert_eq!(grid.get(10 % 7, 24 - 10 / 7), 1);
        assert_eq!(grid.total(), 1);
    }

    #[test]
    fn ten_days_back_follows_the_window_arithmetic_for_any_weekday() {
        for offset in 0..7 {
            let today = date(2024, 6, 9) + Duration::days(offset);
            let target = today - Duration::days(10);
            let (start, _) = window(today);
            let diff = (target - start).num_days() as usize;

            let grid = bucket(&[accepted(target)], today);
            assert_eq!(grid.get(diff % 7, diff / 7), 1, "today = {today}");
            assert_eq!(grid.total(), 1);
        }
    }

    #[test]
    fn timestamps_are_read_in_the_anchor_calendar() {
        // 2024-06-11T20:00:00Z is already 2024-06-12 01:30 at UTC+05:30.
        let ts = Utc.with_ymd_and_hms(2024, 6, 11, 20, 0, 0).unwrap().timestamp();
        assert_eq!(submission_date(ts), Some(date(2024, 6, 12)));

        let now = Utc.with_ymd_and_hms(2024, 6, 11, 19, 0, 0).unwrap();
        assert_eq!(anchor_date(now), date(2024, 6, 12));
    }
}
