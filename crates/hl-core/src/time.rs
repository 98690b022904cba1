//! Local calendar-day helpers shared by the view engine and the bucketizer.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};

/// Calendar date of `at` in `tz`.
pub fn local_date<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// First instant of `date` in `tz`.
///
/// Ambiguous midnights resolve to the earlier instant; zones that skip midnight
/// start the day at the first valid local time after it.
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(at) => at.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(midnight + TimeDelta::hours(1)))
            .earliest()
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
    }
}

/// Converts unix milliseconds to a UTC timestamp, clamping unrepresentable values to the epoch.
pub fn from_unix_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, LocalResult, NaiveDateTime, Offset};

    use super::*;

    /// Zone with a single offset change at `switch_utc`.
    #[derive(Debug, Clone)]
    struct SwitchingZone {
        switch_utc: NaiveDateTime,
        before: FixedOffset,
        after: FixedOffset,
    }

    #[derive(Debug, Clone)]
    struct SwitchingOffset {
        zone: SwitchingZone,
        fixed: FixedOffset,
    }

    impl Offset for SwitchingOffset {
        fn fix(&self) -> FixedOffset {
            self.fixed
        }
    }

    impl SwitchingZone {
        fn fixed_at(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < self.switch_utc {
                self.before
            } else {
                self.after
            }
        }

        fn offset(&self, fixed: FixedOffset) -> SwitchingOffset {
            SwitchingOffset {
                zone: self.clone(),
                fixed,
            }
        }
    }

    impl TimeZone for SwitchingZone {
        type Offset = SwitchingOffset;

        fn from_offset(offset: &SwitchingOffset) -> Self {
            offset.zone.clone()
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<SwitchingOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> LocalResult<SwitchingOffset> {
            // earlier instant first
            let mut valid = [self.before, self.after]
                .into_iter()
                .filter(|fixed| {
                    let utc = *local - TimeDelta::seconds(fixed.local_minus_utc().into());
                    self.fixed_at(&utc) == *fixed
                })
                .collect::<Vec<_>>();
            valid.sort_by_key(|fixed| std::cmp::Reverse(fixed.local_minus_utc()));
            match valid.as_slice() {
                [] => LocalResult::None,
                [only] => LocalResult::Single(self.offset(*only)),
                [earlier, later, ..] => {
                    LocalResult::Ambiguous(self.offset(*earlier), self.offset(*later))
                }
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> SwitchingOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> SwitchingOffset {
            self.offset(self.fixed_at(utc))
        }
    }

    fn utc_naive(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
            .unwrap()
            .naive_utc()
    }

    #[test]
    fn skipped_midnight_starts_at_first_valid_hour() {
        // clocks jump from 00:00 -03:00 straight to 01:00 -02:00
        let zone = SwitchingZone {
            switch_utc: utc_naive(2025, 10, 5, 3),
            before: FixedOffset::west_opt(3 * 3600).unwrap(),
            after: FixedOffset::west_opt(2 * 3600).unwrap(),
        };
        let date = NaiveDate::from_ymd_opt(2025, 10, 5).unwrap();

        assert!(matches!(
            zone.from_local_datetime(&date.and_time(NaiveTime::MIN)),
            LocalResult::None
        ));
        assert_eq!(
            start_of_day(date, &zone),
            Utc.with_ymd_and_hms(2025, 10, 5, 3, 0, 0).unwrap()
        );
    }

    #[test]
    fn repeated_midnight_takes_the_earlier_instant() {
        // clocks fall back from 01:00 -02:00 to 00:00 -03:00
        let zone = SwitchingZone {
            switch_utc: utc_naive(2025, 2, 16, 3),
            before: FixedOffset::west_opt(2 * 3600).unwrap(),
            after: FixedOffset::west_opt(3 * 3600).unwrap(),
        };
        let date = NaiveDate::from_ymd_opt(2025, 2, 16).unwrap();

        assert!(matches!(
            zone.from_local_datetime(&date.and_time(NaiveTime::MIN)),
            LocalResult::Ambiguous(_, _)
        ));
        assert_eq!(
            start_of_day(date, &zone),
            Utc.with_ymd_and_hms(2025, 2, 16, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn local_date_follows_offset() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        // 2025-03-09T20:00Z is already the 10th in Tokyo
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 20, 0, 0).unwrap();
        assert_eq!(
            local_date(&at, &tokyo),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert_eq!(
            local_date(&at, &Utc),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        );
    }

    #[test]
    fn start_of_day_is_local_midnight() {
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(
            start_of_day(date, &minus_five),
            Utc.with_ymd_and_hms(2025, 3, 10, 5, 0, 0).unwrap()
        );
    }

    #[test]
    fn from_unix_ms_round_trips_millis() {
        let at = from_unix_ms(1_741_608_000_123);
        assert_eq!(at.timestamp_millis(), 1_741_608_000_123);
    }
}
