use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

/// Source of "now". Attendance days are computed in the configured offset,
/// never in the host's local timezone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn offset(&self) -> FixedOffset;

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset()).date_naive()
    }

    fn time_of_day(&self) -> NaiveTime {
        self.now().with_timezone(&self.offset()).time()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
pub use fixed::FixedClock;

#[cfg(test)]
mod fixed {
    use std::sync::Mutex;

    use chrono::{DateTime, Duration, FixedOffset, Utc};

    use super::Clock;

    /// Manually advanced clock for tests.
    pub struct FixedClock {
        now: Mutex<DateTime<Utc>>,
        offset: FixedOffset,
    }

    impl FixedClock {
        pub fn at(rfc3339: &str) -> Self {
            let parsed = DateTime::parse_from_rfc3339(rfc3339).unwrap();
            Self {
                now: Mutex::new(parsed.with_timezone(&Utc)),
                offset: *parsed.offset(),
            }
        }

        pub fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        fn offset(&self) -> FixedOffset {
            self.offset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_follows_the_configured_offset() {
        // 23:30 UTC is already the next day in Dhaka
        let clock = FixedClock::at("2024-05-10T05:30:00+06:00");
        assert_eq!(clock.now().to_rfc3339(), "2024-05-09T23:30:00+00:00");
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        assert_eq!(clock.time_of_day(), NaiveTime::from_hms_opt(5, 30, 0).unwrap());
    }

    #[test]
    fn advancing_moves_the_day() {
        let clock = FixedClock::at("2024-05-10T23:59:00+00:00");
        clock.advance(chrono::Duration::minutes(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());
    }
}
