use std::time::{SystemTime, UNIX_EPOCH};

/// Source of block timestamps, in whole seconds since the Unix epoch.
pub trait Clock {
    fn now_secs(&self) -> i64;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

/// Always reports the same instant. Used to make block hashes reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_secs(&self) -> i64 {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_secs(&self) -> i64 {
        (**self).now_secs()
    }
}
