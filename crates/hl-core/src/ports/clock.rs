use chrono::{DateTime, Local};

pub trait ClockPort: Send + Sync {
    /// Wall-clock time in unix milliseconds.
    fn now_ms(&self) -> i64;

    /// Wall-clock time in the process's local time zone.
    fn now_local(&self) -> DateTime<Local> {
        crate::time::from_unix_ms(self.now_ms()).with_timezone(&Local)
    }
}

#[cfg(test)]
mockall::mock! {
    pub Clock {}

    impl ClockPort for Clock {
        fn now_ms(&self) -> i64;
    }
}
