use chrono::{Local, NaiveDateTime};

use smo_application::Clock;

/// Clock reading the host's local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
