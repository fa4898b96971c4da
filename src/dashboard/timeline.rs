//! Mapping between a reference day and positions on the scrub timeline.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

const MINUTES_PER_DAY: f64 = 1440.0;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// One UTC day, from 00:00:00.000 to 23:59:59.999
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineDay {
    start: DateTime<Utc>,
}

impl TimelineDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            start: Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)),
        }
    }

    /// The day `t` falls on
    pub fn containing(t: DateTime<Utc>) -> Self {
        Self::new(t.date_naive())
    }

    pub fn today() -> Self {
        Self::containing(Utc::now())
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// 23:59:59.999 of the day
    pub fn last_instant(&self) -> DateTime<Utc> {
        self.start + Duration::milliseconds(MILLIS_PER_DAY - 1)
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.last_instant()
    }

    /// Clamp `t` into the day
    pub fn clamp(&self, t: DateTime<Utc>) -> DateTime<Utc> {
        t.clamp(self.start, self.last_instant())
    }

    /// Time under a scrub position. `fraction` is the pointer offset divided
    /// by the timeline width; it is clamped to `[0, 1]` and resolved to whole
    /// minutes.
    pub fn time_at_fraction(&self, fraction: f64) -> DateTime<Utc> {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let minutes = (fraction * MINUTES_PER_DAY).floor() as i64;
        self.clamp(self.start + Duration::minutes(minutes))
    }

    /// Position of `t` on the timeline, in `[0, 1]`
    pub fn fraction_of(&self, t: DateTime<Utc>) -> f64 {
        let offset = (self.clamp(t) - self.start).num_milliseconds();
        offset as f64 / MILLIS_PER_DAY as f64
    }

    /// Hour ticks with their positions: `0:00` through `24:00`
    pub fn hour_marks() -> Vec<(f64, String)> {
        (0..=24)
            .map(|hour| (hour as f64 / 24.0, format!("{}:00", hour)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn day() -> TimelineDay {
        TimelineDay::new(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap())
    }

    #[test]
    fn clamps_into_the_reference_day() {
        let day = day();
        let before = day.start() - Duration::hours(3);
        let after = day.start() + Duration::hours(30);

        assert_eq!(day.clamp(before), day.start());
        assert_eq!(day.clamp(after), day.last_instant());
        assert_eq!(day.last_instant().hour(), 23);
        assert_eq!(day.last_instant().nanosecond(), 999_000_000);
        assert!(day.contains(day.last_instant()));
        assert!(!day.contains(day.last_instant() + Duration::milliseconds(1)));
    }

    #[test]
    fn scrub_positions_resolve_to_minutes() {
        let day = day();
        assert_eq!(day.time_at_fraction(0.0), day.start());
        assert_eq!(day.time_at_fraction(0.5), day.start() + Duration::hours(12));
        assert_eq!(day.time_at_fraction(-0.2), day.start());
        assert_eq!(day.time_at_fraction(1.0), day.last_instant());
        assert_eq!(day.time_at_fraction(7.0), day.last_instant());
        assert_eq!(day.time_at_fraction(f64::NAN), day.start());

        // 1/16 of a day is 90 minutes
        let t = day.time_at_fraction(0.0625);
        assert_eq!((t.hour(), t.minute(), t.second()), (1, 30, 0));
    }

    #[test]
    fn marker_positions() {
        let day = day();
        assert_eq!(day.fraction_of(day.start() + Duration::hours(6)), 0.25);
        assert_eq!(day.fraction_of(day.start() - Duration::hours(1)), 0.0);

        let marks = TimelineDay::hour_marks();
        assert_eq!(marks.len(), 25);
        assert_eq!(marks[0], (0.0, "0:00".to_string()));
        assert_eq!(marks[24], (1.0, "24:00".to_string()));
    }
}
